//! # llm-runtime
//!
//! Protocol adapters for the `llm-core` provider contract.
//!
//! ## Providers
//!
//! - **OpenAI**: chat completions, tools, structured output, streaming
//! - **Google AI Studio**: Gemini `generateContent`, tools, structured output
//! - **Together AI**: prompt-only chat completions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use llm_runtime::catalog::{self, NANO};
//!
//! let registry = catalog::default_registry(Arc::new(MemoryCache::new()))?;
//! let model = registry.get(NANO).expect("registered");
//! let reply = model.prompt_single("Hello", Options::default()).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod gemini;
mod http;
pub mod openai;
mod stream;
pub mod together;

pub use config::{ApiConfig, Backend, all_api_keys_set};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use together::TogetherProvider;

// Re-export core types for convenience
pub use llm_core::{
    Cache, LlmError, MemoryCache, Message, Model, ModelRegistry, Options, Provider, Result, Role,
    TextStream, Thinking, Tool,
};
