// Runtime configuration
//
// Layered sources: an optional `settings.toml` next to the executable (or in
// the working directory), overridden by SUPPORT_WIZARD_* environment
// variables. Every setting has a default so the wizard runs unconfigured;
// without an AI endpoint the assist flow simply lands on its fallback path.

use crate::models::application::Language;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chat-completions style endpoint for the suggestion provider.
    pub ai_endpoint: String,
    pub ai_api_key: String,
    pub ai_model: String,
    /// One-shot submission endpoint for the final application payload.
    pub submit_endpoint: String,
    /// Language used to parameterize AI seed prompts.
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            ai_api_key: String::new(),
            ai_model: "gpt-4o-mini".to_string(),
            submit_endpoint: "http://localhost:3000/api/mock-submit".to_string(),
            language: Language::English,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("settings").required(false))
            .add_source(config::Environment::with_prefix("SUPPORT_WIZARD"))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_setting() {
        let s = Settings::default();
        assert!(!s.ai_endpoint.is_empty());
        assert!(!s.ai_model.is_empty());
        assert!(!s.submit_endpoint.is_empty());
        assert_eq!(s.language, Language::English);
    }
}
