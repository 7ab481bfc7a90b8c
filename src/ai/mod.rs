// AI-assist fallback flow
//
// A suggestion request either comes back usable (Fulfilled) or is replaced by
// a hand-authored template for the target field (FallbackUsed). Provider
// errors, timeouts, empty results, and below-threshold results all take the
// fallback path; the user can always proceed manually.

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::application::Language;

/// Minimum usable suggestion length, measured after trimming.
pub const MIN_SUGGESTION_LEN: usize = 10;

/// Non-blocking notice shown when a template was substituted.
pub const FALLBACK_NOTICE: &str =
    "AI service unavailable. Showing a template suggestion you can edit.";

/// Secondary line shown inside the assist modal when the text is a template.
pub const TEMPLATE_NOTE: &str =
    "Note: This is a template suggestion. Please edit it to reflect your specific situation.";

/// Stable identity of the field a suggestion is for. Fallback templates key
/// on this, never on display labels, so the selection survives localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    CurrentFinancialSituation,
    EmploymentCircumstances,
    ReasonForApplying,
    Generic,
}

impl FieldKey {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKey::CurrentFinancialSituation => "Current financial situation",
            FieldKey::EmploymentCircumstances => "Employment circumstances",
            FieldKey::ReasonForApplying => "Reason for applying",
            FieldKey::Generic => "Answer",
        }
    }
}

/// Hand-authored template paragraph for a field.
pub fn fallback_template(field: FieldKey) -> &'static str {
    match field {
        FieldKey::CurrentFinancialSituation => {
            "I am currently experiencing financial difficulties due to reduced income and \
             increased expenses. My monthly income is insufficient to cover basic necessities \
             such as rent, utilities, and food. I am seeking assistance to help stabilize my \
             financial situation during this challenging period."
        }
        FieldKey::EmploymentCircumstances => {
            "I have recently lost my employment and am actively seeking new job opportunities. \
             The loss of steady income has significantly impacted my ability to meet my \
             financial obligations. I am committed to finding new employment as soon as \
             possible while requesting temporary support during this transition period."
        }
        FieldKey::ReasonForApplying => {
            "I am applying for financial support to help cover essential living expenses during \
             a period of financial hardship. This assistance will enable me to maintain housing \
             stability and meet basic needs while I work toward improving my financial \
             situation. I am committed to using this support responsibly and am grateful for \
             any assistance provided."
        }
        FieldKey::Generic => {
            "I am experiencing financial difficulties and respectfully request assistance to \
             help me through this challenging time. Any support provided would be greatly \
             appreciated and used to cover essential living expenses."
        }
    }
}

/// Seed prompt for a field, parameterized by language and any existing text.
pub fn seed_prompt(field: FieldKey, language: Language, existing: &str) -> String {
    let existing = existing.trim();
    match field {
        FieldKey::CurrentFinancialSituation => format!(
            "Help me describe my current financial situation in the {} language: {}",
            language.label(),
            if existing.is_empty() {
                "I have limited income and high expenses."
            } else {
                existing
            }
        ),
        FieldKey::EmploymentCircumstances => format!(
            "Describe employment circumstances in a respectful tone in the {} language: {}",
            language.label(),
            if existing.is_empty() {
                "I was recently laid off and I am actively looking for a job."
            } else {
                existing
            }
        ),
        FieldKey::ReasonForApplying => format!(
            "Explain the reason for applying for financial support in the {} language: {}",
            language.label(),
            if existing.is_empty() {
                "I need support to cover rent and basic utilities while I look for work."
            } else {
                existing
            }
        ),
        FieldKey::Generic => format!(
            "Help me draft this answer in the {} language: {}",
            language.label(),
            existing
        ),
    }
}

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned an unusable response")]
    MalformedResponse,
}

/// External text-generation collaborator. May fail, time out, or return
/// empty or low-quality text; callers must not assume success.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestionError>;
}

/// Chat-completions style provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, SuggestionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl SuggestionProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestionError> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
        }

        #[derive(Deserialize)]
        struct RespMessage {
            content: String,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: RespMessage,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: Resp = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(SuggestionError::MalformedResponse)?;
        Ok(text)
    }
}

/// Result of one assist invocation: the text to display, and whether it is a
/// substituted template rather than a generated suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistOutcome {
    pub text: String,
    pub used_fallback: bool,
}

/// Run one Requesting -> {Fulfilled, FallbackUsed} resolution.
pub async fn resolve_suggestion(
    provider: &dyn SuggestionProvider,
    prompt: &str,
    field: FieldKey,
) -> AssistOutcome {
    match provider.generate(prompt).await {
        Ok(text) if text.trim().chars().count() >= MIN_SUGGESTION_LEN => {
            info!("[PHASE: ai_assist] [STEP: fulfilled] Suggestion accepted from provider");
            AssistOutcome {
                text,
                used_fallback: false,
            }
        }
        Ok(_) => {
            warn!(
                "[PHASE: ai_assist] [STEP: fallback] Provider response below quality threshold, substituting template for {:?}",
                field
            );
            AssistOutcome {
                text: fallback_template(field).to_string(),
                used_fallback: true,
            }
        }
        Err(e) => {
            warn!(
                "[PHASE: ai_assist] [STEP: fallback] Provider error ({}), substituting template for {:?}",
                e, field
            );
            AssistOutcome {
                text: fallback_template(field).to_string(),
                used_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProvider {
        reply: Result<&'static str, ()>,
    }

    #[async_trait]
    impl SuggestionProvider for StubProvider {
        async fn generate(&self, _prompt: &str) -> Result<String, SuggestionError> {
            match self.reply {
                Ok(s) => Ok(s.to_string()),
                Err(()) => Err(SuggestionError::MalformedResponse),
            }
        }
    }

    #[tokio::test]
    async fn empty_response_substitutes_the_field_template() {
        let provider = StubProvider { reply: Ok("") };
        let outcome = resolve_suggestion(
            &provider,
            "prompt",
            FieldKey::CurrentFinancialSituation,
        )
        .await;
        assert!(outcome.used_fallback);
        assert_eq!(
            outcome.text,
            fallback_template(FieldKey::CurrentFinancialSituation)
        );
    }

    #[tokio::test]
    async fn below_threshold_response_substitutes_template() {
        let provider = StubProvider { reply: Ok("   ok   ") };
        let outcome =
            resolve_suggestion(&provider, "prompt", FieldKey::EmploymentCircumstances).await;
        assert!(outcome.used_fallback);
        assert_eq!(
            outcome.text,
            fallback_template(FieldKey::EmploymentCircumstances)
        );
    }

    #[tokio::test]
    async fn provider_error_substitutes_template() {
        let provider = StubProvider { reply: Err(()) };
        let outcome = resolve_suggestion(&provider, "prompt", FieldKey::ReasonForApplying).await;
        assert!(outcome.used_fallback);
        assert_eq!(outcome.text, fallback_template(FieldKey::ReasonForApplying));
    }

    #[tokio::test]
    async fn usable_response_is_fulfilled_verbatim() {
        let provider = StubProvider {
            reply: Ok("My household income dropped sharply after my contract ended."),
        };
        let outcome =
            resolve_suggestion(&provider, "prompt", FieldKey::CurrentFinancialSituation).await;
        assert!(!outcome.used_fallback);
        assert!(outcome.text.starts_with("My household income"));
    }

    #[test]
    fn templates_are_distinct_per_field_with_generic_catch_all() {
        let keys = [
            FieldKey::CurrentFinancialSituation,
            FieldKey::EmploymentCircumstances,
            FieldKey::ReasonForApplying,
            FieldKey::Generic,
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(fallback_template(*a), fallback_template(*b));
            }
        }
    }

    #[test]
    fn seed_prompt_uses_existing_text_when_present() {
        let prompt = seed_prompt(
            FieldKey::ReasonForApplying,
            Language::English,
            "I need help with school fees.",
        );
        assert!(prompt.contains("English"));
        assert!(prompt.ends_with("I need help with school fees."));
    }

    #[test]
    fn seed_prompt_falls_back_to_default_seed_when_empty() {
        let prompt = seed_prompt(FieldKey::CurrentFinancialSituation, Language::Arabic, "  ");
        assert!(prompt.contains("Arabic"));
        assert!(prompt.contains("I have limited income and high expenses."));
    }
}
