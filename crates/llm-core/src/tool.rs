//! Tool System
//!
//! Caller-supplied functions a backend may ask to invoke mid-conversation.
//! Resolution failures never abort a request: they become tool-result text
//! the backend model can react to.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Discriminator every in-scope backend uses for function tools
pub const FUNCTION_TOOL_TYPE: &str = "function";

/// Requests one `prompt` may make before giving up on a tool-calling backend
pub const MAX_TOOL_ROUNDS: usize = 16;

/// Resolves a tool call from the backend-chosen arguments
#[async_trait]
pub trait ToolResolver: Send + Sync {
    async fn resolve(&self, arguments: Value) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F> ToolResolver for F
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    async fn resolve(&self, arguments: Value) -> anyhow::Result<Value> {
        self(arguments)
    }
}

/// Tool declaration plus the resolver that answers it
#[derive(Clone)]
pub struct Tool {
    /// Unique within one request's tool set
    pub name: String,

    /// Human-readable description (shown to the LLM)
    pub description: String,

    /// JSON-Schema-shaped parameter description, passed through opaquely
    pub parameters: Option<Value>,

    /// Ask the backend for strict schema adherence
    pub strict: bool,

    /// Tool type discriminator; filled in during capability negotiation when unset
    pub kind: Option<String>,

    /// Required; a tool without one is rejected before any network call
    pub resolver: Option<Arc<dyn ToolResolver>>,
}

impl Tool {
    /// Declare a tool without a resolver
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
            strict: false,
            kind: None,
            resolver: None,
        }
    }

    /// Declare a function tool backed by a synchronous closure
    pub fn function<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        resolver: F,
    ) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, description)
            .with_parameters(parameters)
            .with_resolver(resolver)
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_resolver<R: ToolResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Type discriminator, falling back to `"function"`
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(FUNCTION_TOOL_TYPE)
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("strict", &self.strict)
            .field("kind", &self.kind)
            .field("resolver", &self.resolver.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

/// Result from tool execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Serialized return value, or an `error: ...` string
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: format!("error: {error}"),
        }
    }
}

/// First tool in `tools` with the given name
pub fn find_tool<'a>(tools: &'a [Tool], name: &str) -> Option<&'a Tool> {
    tools.iter().find(|tool| tool.name == name)
}

/// Execute one backend-issued tool call against the caller's tool set.
///
/// Never fails: a missing tool, a resolver error or an unserializable
/// return value all come back as a failed [`ToolResult`].
pub async fn execute(tools: &[Tool], name: &str, arguments: Value) -> ToolResult {
    tracing::info!(tool = %name, "llm tool call");

    let Some(tool) = find_tool(tools, name) else {
        return ToolResult::failure(name, format_args!("tool not found: {name}"));
    };
    let Some(resolver) = &tool.resolver else {
        return ToolResult::failure(name, format_args!("tool {name} is missing a resolver"));
    };

    match resolver.resolve(arguments).await {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(output) => ToolResult::success(name, output),
            Err(e) => ToolResult::failure(name, e),
        },
        Err(e) => {
            tracing::debug!(tool = %name, error = %e, "tool resolver failed");
            ToolResult::failure(name, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_tool() -> Tool {
        Tool::function(
            "get_weather",
            "Current weather for a city",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
            |args: Value| {
                let city = args
                    .get("city")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow::anyhow!("missing city"))?;
                Ok(json!({"city": city, "celsius": 21}))
            },
        )
    }

    #[tokio::test]
    async fn test_execute_success_serializes_result() {
        let tools = vec![weather_tool()];
        let result = execute(&tools, "get_weather", json!({"city": "Oslo"})).await;
        assert!(result.success);
        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value, json!({"city": "Oslo", "celsius": 21}));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_names_it() {
        let tools = vec![weather_tool()];
        let result = execute(&tools, "get_stock", json!({})).await;
        assert!(!result.success);
        assert!(result.output.starts_with("error:"));
        assert!(result.output.contains("get_stock"));
    }

    #[tokio::test]
    async fn test_execute_resolver_error_becomes_text() {
        let tools = vec![weather_tool()];
        let result = execute(&tools, "get_weather", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.output, "error: missing city");
    }

    #[test]
    fn test_first_match_wins() {
        let tools = vec![
            Tool::new("dup", "first"),
            Tool::new("dup", "second"),
        ];
        assert_eq!(find_tool(&tools, "dup").unwrap().description, "first");
        assert!(find_tool(&tools, "other").is_none());
    }

    #[test]
    fn test_kind_defaults_to_function() {
        let tool = Tool::new("noop", "does nothing");
        assert_eq!(tool.kind(), FUNCTION_TOOL_TYPE);
        assert!(format!("{tool:?}").contains("noop"));
    }
}
