//! Default model catalog
//!
//! Providers are stateless apart from their credentials, so one instance per
//! backend is shared by every model routed to it.

use std::sync::Arc;

use llm_core::{Cache, ModelRegistry, Provider, Result};

use crate::gemini::GeminiProvider;
use crate::openai::OpenAiProvider;

pub const GPT_5: &str = "gpt-5";
pub const GPT_5_MINI: &str = "gpt-5-mini";
pub const GPT_5_NANO: &str = "gpt-5-nano";
pub const GEMINI_2_FLASH: &str = "gemini-2.0-flash";

/// Most capable model, use when `MINI` is not good enough
pub const BEST: &str = GPT_5;

/// Middle ground between quality and price
pub const MINI: &str = GPT_5_MINI;

/// Cheapest model, for pattern matching and simple scoring
pub const NANO: &str = GPT_5_NANO;

/// Registry with every built-in model, credentials read from the environment
pub fn default_registry(cache: Arc<dyn Cache>) -> Result<ModelRegistry> {
    let openai: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_env());
    let gemini: Arc<dyn Provider> = Arc::new(GeminiProvider::from_env());

    ModelRegistry::builder()
        .cache(cache)
        .register(GPT_5, Arc::clone(&openai))
        .register(GPT_5_MINI, Arc::clone(&openai))
        .register(GPT_5_NANO, openai)
        .register(GEMINI_2_FLASH, gemini)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_core::NoCache;

    #[test]
    fn test_default_registry() {
        let registry = default_registry(Arc::new(NoCache)).unwrap();
        assert_eq!(
            registry.names(),
            vec![GEMINI_2_FLASH, GPT_5, GPT_5_MINI, GPT_5_NANO]
        );

        for tier in [BEST, MINI, NANO] {
            assert_eq!(registry.get(tier).unwrap().provider().name(), "openai");
        }
        let gemini = registry.get(GEMINI_2_FLASH).unwrap();
        assert!(!gemini.provider().supports_streaming());
    }
}
