//! LLM Provider Contract
//!
//! Every backend implements [`Provider`]: three capability flags plus a
//! single-shot `prompt` and a streaming `stream` operation. Before a
//! request reaches a provider, [`Options::negotiate`] checks the requested
//! features against those flags and fills in defaults.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use llm_core::provider::{Options, Thinking};
//!
//! let options = Options::default()
//!     .with_thinking(Thinking::Low)
//!     .with_max_tokens(1024);
//! let reply = model.prompt(&messages, options).await?;
//! ```

use std::collections::HashSet;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{LlmError, Result};
use crate::message::Message;
use crate::tool::{FUNCTION_TOOL_TYPE, Tool};

/// Request timeout applied when the caller sets none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Output token limit applied when the caller sets none
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Sequence of text deltas produced by a streaming call
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Structured output discriminator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
}

impl ResponseFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JsonObject => "json_object",
        }
    }
}

/// Abstract reasoning effort, translated per backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Thinking {
    #[default]
    None,
    Minimal,
    Low,
    Medium,
    High,
}

impl std::str::FromStr for Thinking {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "minimal" => Ok(Self::Minimal),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(LlmError::Config(format!("unknown thinking level: {other}"))),
        }
    }
}

/// Which provider operation a request is headed for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Prompt,
    Stream,
}

/// Per-call options
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Cache lifetime; `None` or zero disables caching for the call
    pub cache: Option<Duration>,

    /// Make a single attempt instead of retrying
    pub no_retry: bool,

    /// Request timeout
    pub timeout: Option<Duration>,

    /// Maximum output tokens
    pub max_tokens: Option<u32>,

    /// Structured output request
    pub response_format: Option<ResponseFormat>,

    /// Tools the backend may call, in declaration order
    pub tools: Vec<Tool>,

    /// Abstract reasoning effort
    pub thinking: Thinking,

    /// Cancels retries and in-flight transport calls
    pub cancel: Option<CancellationToken>,
}

impl Options {
    pub const fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(ttl);
        self
    }

    pub const fn without_retry(mut self) -> Self {
        self.no_retry = true;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub const fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub const fn with_thinking(mut self, thinking: Thinking) -> Self {
        self.thinking = thinking;
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Effective cache lifetime, `None` when caching is disabled
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.filter(|ttl| !ttl.is_zero())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Validate the request against the provider's capabilities and fill defaults.
    ///
    /// Purely local: never touches the network and ignores the cancellation token.
    pub fn negotiate(mut self, mode: Mode, provider: &dyn Provider) -> Result<Self> {
        let name = provider.name();
        if mode == Mode::Stream && !provider.supports_streaming() {
            return Err(LlmError::Config(format!(
                "provider {name} does not support streaming"
            )));
        }
        if self.response_format.is_some() && !provider.supports_structured_output() {
            return Err(LlmError::Config(format!(
                "provider {name} does not support structured output"
            )));
        }
        if !self.tools.is_empty() && !provider.supports_tools() {
            return Err(LlmError::Config(format!(
                "provider {name} does not support tools"
            )));
        }

        if self.timeout.is_none_or(|timeout| timeout.is_zero()) {
            self.timeout = Some(DEFAULT_TIMEOUT);
        }
        if self.max_tokens.is_none_or(|max| max == 0) {
            self.max_tokens = Some(DEFAULT_MAX_TOKENS);
        }

        let mut names = HashSet::new();
        for (idx, tool) in self.tools.iter_mut().enumerate() {
            if !names.insert(tool.name.clone()) {
                return Err(LlmError::Config(format!(
                    "tool {} (#{}) is declared more than once",
                    tool.name,
                    idx + 1
                )));
            }
            if tool.resolver.is_none() {
                return Err(LlmError::Config(format!(
                    "tool {} (#{}) is missing a resolver",
                    tool.name,
                    idx + 1
                )));
            }
            if tool.kind.as_deref().is_none_or(str::is_empty) {
                tool.kind = Some(provider.function_tool_type().to_string());
            }
        }

        Ok(self)
    }
}

/// Strategy trait for LLM backends
///
/// Implement this trait to add support for a new backend. Requests only
/// reach `prompt`/`stream` after [`Options::negotiate`] succeeded.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short backend name used in logs and error messages
    fn name(&self) -> &'static str;

    fn supports_structured_output(&self) -> bool;

    fn supports_streaming(&self) -> bool;

    fn supports_tools(&self) -> bool;

    /// Type discriminator assigned to tools declared without one
    fn function_tool_type(&self) -> &'static str {
        FUNCTION_TOOL_TYPE
    }

    /// Run the conversation, resolving tool calls, until a terminal text reply
    async fn prompt(&self, model: &str, messages: &[Message], options: &Options) -> Result<String>;

    /// Stream the reply as text deltas
    async fn stream(
        &self,
        _model: &str,
        _messages: &[Message],
        _options: &Options,
    ) -> Result<TextStream> {
        Err(LlmError::Config(format!(
            "provider {} does not support streaming",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use serde_json::json;

    #[test]
    fn test_defaults_filled() {
        let provider = MockProvider::new();
        let opts = Options {
            max_tokens: Some(0),
            ..Options::default()
        }
        .negotiate(Mode::Prompt, &provider)
        .unwrap();
        assert_eq!(opts.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(opts.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }

    #[test]
    fn test_explicit_values_kept() {
        let provider = MockProvider::new();
        let opts = Options::default()
            .with_timeout(Duration::from_secs(5))
            .with_max_tokens(10)
            .negotiate(Mode::Prompt, &provider)
            .unwrap();
        assert_eq!(opts.timeout(), Duration::from_secs(5));
        assert_eq!(opts.max_tokens(), 10);
    }

    #[test]
    fn test_streaming_rejected_when_unsupported() {
        let provider = MockProvider::new().with_streaming(false);
        let err = Options::default()
            .negotiate(Mode::Stream, &provider)
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("streaming"));
    }

    #[test]
    fn test_structured_output_and_tools_rejected_when_unsupported() {
        let provider = MockProvider::new()
            .with_structured_output(false)
            .with_tools(false);

        let err = Options::default()
            .with_response_format(ResponseFormat::JsonObject)
            .negotiate(Mode::Prompt, &provider)
            .unwrap_err();
        assert!(err.to_string().contains("structured output"));

        let tool = Tool::function("noop", "", json!({}), |_| Ok(json!(null)));
        let err = Options::default()
            .with_tool(tool)
            .negotiate(Mode::Prompt, &provider)
            .unwrap_err();
        assert!(err.to_string().contains("tools"));
    }

    #[test]
    fn test_tool_without_resolver_fails_fast() {
        let provider = MockProvider::new();
        let err = Options::default()
            .with_tool(Tool::function("ok", "", json!({}), |_| Ok(json!(1))))
            .with_tool(Tool::new("broken", "no resolver"))
            .negotiate(Mode::Prompt, &provider)
            .unwrap_err();
        assert!(matches!(&err, LlmError::Config(msg) if msg.contains("broken (#2)")));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_duplicate_tool_names_rejected() {
        let provider = MockProvider::new();
        let err = Options::default()
            .with_tool(Tool::function("lookup", "", json!({}), |_| Ok(json!(1))))
            .with_tool(Tool::function("other", "", json!({}), |_| Ok(json!(2))))
            .with_tool(Tool::function("lookup", "again", json!({}), |_| Ok(json!(3))))
            .negotiate(Mode::Prompt, &provider)
            .unwrap_err();
        assert!(matches!(&err, LlmError::Config(msg) if msg.contains("lookup (#3)")));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_tool_kind_defaulted() {
        let provider = MockProvider::new();
        let mut custom = Tool::function("custom", "", json!({}), |_| Ok(json!(1)));
        custom.kind = Some("custom_kind".into());
        let opts = Options::default()
            .with_tool(Tool::function("plain", "", json!({}), |_| Ok(json!(1))))
            .with_tool(custom)
            .negotiate(Mode::Prompt, &provider)
            .unwrap();
        assert_eq!(opts.tools[0].kind.as_deref(), Some(FUNCTION_TOOL_TYPE));
        assert_eq!(opts.tools[1].kind.as_deref(), Some("custom_kind"));
    }

    #[test]
    fn test_zero_cache_disables_caching() {
        assert_eq!(Options::default().cache_ttl(), None);
        assert_eq!(Options::default().with_cache(Duration::ZERO).cache_ttl(), None);
        let ttl = Duration::from_secs(60);
        assert_eq!(Options::default().with_cache(ttl).cache_ttl(), Some(ttl));
    }

    #[test]
    fn test_thinking_parse() {
        assert_eq!("HIGH".parse::<Thinking>().unwrap(), Thinking::High);
        assert!("extreme".parse::<Thinking>().is_err());
    }
}
