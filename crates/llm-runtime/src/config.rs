//! Backend Credentials
//!
//! Every adapter needs one credential and a base URL. Both come from the
//! process environment; a missing credential only fails once a request is
//! actually made, so the model catalog can be built at startup without keys.

use std::fmt;

use llm_core::{LlmError, Result};

/// Backends with a configurable endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    OpenAi,
    GoogleAiStudio,
    TogetherAi,
}

impl Backend {
    pub const ALL: [Self; 3] = [Self::OpenAi, Self::GoogleAiStudio, Self::TogetherAi];

    /// Environment variable holding the credential
    pub const fn key_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_TOKEN",
            Self::GoogleAiStudio => "GOOGLE_AI_STUDIO_KEY",
            Self::TogetherAi => "TOGETHER_AI_TOKEN",
        }
    }

    /// Environment variable overriding the base URL
    pub const fn base_url_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::GoogleAiStudio => "GOOGLE_AI_STUDIO_BASE_URL",
            Self::TogetherAi => "TOGETHER_AI_BASE_URL",
        }
    }

    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::GoogleAiStudio => "https://generativelanguage.googleapis.com",
            Self::TogetherAi => "https://api.together.xyz",
        }
    }
}

/// Endpoint configuration for one backend
#[derive(Clone)]
pub struct ApiConfig {
    pub backend: Backend,

    /// Base URL without trailing slash
    pub base_url: String,

    api_key: Option<String>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiConfig {
    /// Explicit credential against the backend's default endpoint
    pub fn new(backend: Backend, api_key: impl Into<String>) -> Self {
        Self {
            backend,
            base_url: backend.default_base_url().to_string(),
            api_key: normalize(api_key.into()),
        }
    }

    /// Load credential and base URL from the environment
    pub fn from_env(backend: Backend) -> Self {
        let base_url = std::env::var(backend.base_url_var())
            .ok()
            .and_then(normalize)
            .unwrap_or_else(|| backend.default_base_url().to_string());

        Self {
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: read_key(backend),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The credential, or a configuration error naming the variable to set
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            LlmError::Config(format!(
                "{} environment variable not set",
                self.backend.key_var()
            ))
        })
    }

    /// Join a request path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn read_key(backend: Backend) -> Option<String> {
    std::env::var(backend.key_var()).ok().and_then(normalize)
}

/// Whether every backend credential is present in the environment
pub fn all_api_keys_set() -> bool {
    Backend::ALL.into_iter().all(|backend| read_key(backend).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = ApiConfig::new(Backend::OpenAi, "   ");
        assert!(!config.has_api_key());

        let err = config.api_key().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENAI_TOKEN"));
    }

    #[test]
    fn test_key_is_trimmed() {
        let config = ApiConfig::new(Backend::TogetherAi, " secret\n");
        assert_eq!(config.api_key().unwrap(), "secret");
    }

    #[test]
    fn test_base_url_override() {
        let config = ApiConfig::new(Backend::GoogleAiStudio, "k").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.url("/v1beta/models"), "http://127.0.0.1:9000/v1beta/models");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ApiConfig::new(Backend::OpenAi, "sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
