// Final submission endpoint
//
// Best-effort, non-blocking delivery contract: the application payload is
// POSTed once, and both success and failure lead to the same caller-side
// behavior (reset and advance). Do not add retries or surface failures here;
// the only trace of the outcome is the log.

use crate::models::application::ApplicationData;
use crate::utils::logging::mask_sensitive;
use log::{info, warn};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(12);

/// One-shot POST of the complete application. Never returns an error.
pub async fn submit_best_effort(endpoint: &str, data: &ApplicationData) {
    let correlation_id = Uuid::new_v4().simple().to_string();
    info!(
        "[PHASE: submission] [STEP: post] Submitting application for applicant {} (correlation_id={})",
        mask_sensitive(&data.personal.national_id),
        correlation_id
    );

    let endpoint = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(e) => {
            warn!(
                "[PHASE: submission] [STEP: post] Invalid submission endpoint: {} (correlation_id={})",
                e, correlation_id
            );
            return;
        }
    };

    let client = match reqwest::Client::builder().timeout(SUBMIT_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(
                "[PHASE: submission] [STEP: post] Could not build HTTP client: {} (correlation_id={})",
                e, correlation_id
            );
            return;
        }
    };

    match client.post(endpoint).json(data).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(
                "[PHASE: submission] [STEP: post] Submission delivered, HTTP {} (correlation_id={})",
                resp.status(),
                correlation_id
            );
        }
        Ok(resp) => {
            warn!(
                "[PHASE: submission] [STEP: post] Submission endpoint answered HTTP {} (correlation_id={})",
                resp.status(),
                correlation_id
            );
        }
        Err(e) => {
            warn!(
                "[PHASE: submission] [STEP: post] Submission not delivered: {} (correlation_id={})",
                e, correlation_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::repository::empty_application;

    #[tokio::test]
    async fn failing_endpoint_is_swallowed() {
        // Unroutable endpoint: the call must complete without error.
        submit_best_effort("http://127.0.0.1:9/submit", &empty_application()).await;
    }

    #[tokio::test]
    async fn invalid_url_is_swallowed() {
        submit_best_effort("not a url", &empty_application()).await;
    }
}
