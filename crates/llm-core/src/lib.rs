//! # llm-core
//!
//! Provider-agnostic invocation layer for LLM completion backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Model                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Negotiate  │  │    Cache    │  │      Provider       │  │
//! │  │   Options   │──│  + Retries  │──│     (Strategy)      │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Provider` trait enables swapping between OpenAI, Gemini, Together AI
//! or any other backend without changing calling code. Concrete adapters live
//! in `llm-runtime`.

pub mod cache;
pub mod error;
pub mod message;
pub mod model;
pub mod provider;
pub mod text;
pub mod tool;

#[cfg(test)]
mod mock;

pub use cache::{Cache, MemoryCache, NoCache, cache_key};
pub use error::{LlmError, Result};
pub use message::{Message, Role};
pub use model::{Model, ModelRegistry};
pub use provider::{Mode, Options, Provider, ResponseFormat, TextStream, Thinking};
pub use tool::{Tool, ToolResolver, ToolResult};
