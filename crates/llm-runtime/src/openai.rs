//! OpenAI Chat Completions Provider
//!
//! Call-identifier backend: every tool call carries an id, and the tool
//! message answering it must echo that id back. The system role is sent as
//! `developer`.

use async_trait::async_trait;
use llm_core::{
    LlmError, Message, Options, Provider, ResponseFormat, Result, Role, TextStream, Thinking, Tool,
    tool::{self, FUNCTION_TOOL_TYPE, MAX_TOOL_ROUNDS},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ApiConfig, Backend};
use crate::{http, stream};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Models without a configurable reasoning effort
const FIXED_REASONING_PREFIXES: [&str; 7] = [
    "gpt-1", "gpt-2", "gpt-3", "gpt-4", "o1-pro", "o3-pro", "gpt-5-pro",
];

/// Translate the abstract thinking level into `reasoning_effort`.
///
/// `None` means the field is left out of the request entirely.
pub fn reasoning_effort(model: &str, thinking: Thinking) -> Option<&'static str> {
    let model = model.to_lowercase();
    if FIXED_REASONING_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
    {
        return None;
    }

    let effort = if model.starts_with('o') || model.contains("codex") {
        match thinking {
            Thinking::None | Thinking::Minimal | Thinking::Low => "low",
            Thinking::Medium => "medium",
            Thinking::High => "high",
        }
    } else if model == "gpt-5" || model.starts_with("gpt-5-mini") || model.starts_with("gpt-5-nano") {
        match thinking {
            Thinking::None | Thinking::Minimal => "minimal",
            Thinking::Low => "low",
            Thinking::Medium => "medium",
            Thinking::High => "high",
        }
    } else {
        match thinking {
            Thinking::None | Thinking::Minimal => "none",
            Thinking::Low => "low",
            Thinking::Medium => "medium",
            Thinking::High => "high",
        }
    };
    Some(effort)
}

// --- wire types ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_completion_tokens: u32,
    response_format: WireResponseFormat,
    stream: bool,
    store: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ContentPart<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Value>,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Kept verbatim so the follow-up request echoes exactly what was emitted
    #[serde(default)]
    tool_calls: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    function: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl FunctionCall {
    /// Arguments arrive as a JSON-encoded string; unparseable text is passed through as a string
    fn parsed_arguments(self) -> Value {
        match self.arguments {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            other => other,
        }
    }
}

const fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "developer",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn wire_message(message: &Message) -> WireMessage<'_> {
    let content = if message.content.is_empty() {
        Vec::new()
    } else {
        vec![ContentPart {
            kind: "text",
            text: &message.content,
        }]
    };

    WireMessage {
        role: wire_role(message.role),
        content,
        tool_calls: message.tool_calls.as_ref(),
        tool_call_id: message.tool_call_id.as_deref(),
    }
}

fn wire_tool(tool: &Tool) -> WireTool<'_> {
    WireTool {
        kind: tool.kind(),
        function: WireFunction {
            name: &tool.name,
            description: (!tool.description.is_empty()).then_some(tool.description.as_str()),
            parameters: tool.parameters.as_ref(),
            strict: tool.strict,
        },
    }
}

fn has_tool_calls(tool_calls: Option<&Value>) -> bool {
    tool_calls
        .and_then(Value::as_array)
        .is_some_and(|calls| !calls.is_empty())
}

/// OpenAI provider
pub struct OpenAiProvider {
    client: Client,
    config: ApiConfig,
}

impl OpenAiProvider {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from `OPENAI_TOKEN` / `OPENAI_BASE_URL`
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env(Backend::OpenAi))
    }

    fn request_body<'a>(
        model: &'a str,
        messages: &'a [Message],
        options: &'a Options,
        stream: bool,
    ) -> ChatRequest<'a> {
        let response_format = match options.response_format {
            Some(ResponseFormat::JsonObject) => ResponseFormat::JsonObject.as_str(),
            None => "text",
        };

        ChatRequest {
            model,
            messages: messages.iter().map(wire_message).collect(),
            max_completion_tokens: options.max_tokens(),
            response_format: WireResponseFormat {
                kind: response_format,
            },
            stream,
            store: false,
            tools: options.tools.iter().map(wire_tool).collect(),
            tool_choice: (!options.tools.is_empty()).then_some("auto"),
            reasoning_effort: reasoning_effort(model, options.thinking),
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
        options: &Options,
    ) -> Result<ResponseMessage> {
        let body = Self::request_body(model, messages, options, false);
        let request = self
            .client
            .post(self.config.url(COMPLETIONS_PATH))
            .bearer_auth(api_key)
            .json(&body);

        let mut response: ChatResponse = http::post_json(request, options).await?;
        response
            .choices
            .pop()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::Protocol("no responses".into()))
    }
}

/// Record the backend's tool calls and answer each one, in order
async fn resolve_tool_calls(
    raw_calls: Value,
    conversation: &mut Vec<Message>,
    tools: &[Tool],
) -> Result<()> {
    let calls: Vec<ToolCall> = serde_json::from_value(raw_calls.clone())
        .map_err(|e| LlmError::Protocol(format!("failed to decode tool calls: {e}")))?;
    conversation.push(Message::assistant_tool_calls(raw_calls));

    for call in calls {
        if call.kind != FUNCTION_TOOL_TYPE {
            return Err(LlmError::Protocol(format!(
                "unsupported tool type {}",
                call.kind
            )));
        }
        let function = call
            .function
            .ok_or_else(|| LlmError::Protocol("missing function".into()))?;

        let name = function.name.clone();
        let result = tool::execute(tools, &name, function.parsed_arguments()).await;
        conversation.push(Message::tool_result(result.output, call.id));
    }

    Ok(())
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn prompt(&self, model: &str, messages: &[Message], options: &Options) -> Result<String> {
        let api_key = self.config.api_key()?;
        let mut conversation = messages.to_vec();

        for _ in 0..MAX_TOOL_ROUNDS {
            let message = self.complete(api_key, model, &conversation, options).await?;

            if has_tool_calls(message.tool_calls.as_ref()) {
                let raw_calls = message.tool_calls.unwrap_or_default();
                resolve_tool_calls(raw_calls, &mut conversation, &options.tools).await?;
                continue;
            }

            return match message.content {
                Some(text) if !text.is_empty() => Ok(text),
                _ => Err(LlmError::Protocol("no text content".into())),
            };
        }

        Err(LlmError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }

    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        options: &Options,
    ) -> Result<TextStream> {
        let api_key = self.config.api_key()?;
        let body = Self::request_body(model, messages, options, true);
        let request = self
            .client
            .post(self.config.url(COMPLETIONS_PATH))
            .bearer_auth(api_key)
            .json(&body);

        let response = http::send(request, options).await?;
        Ok(stream::spawn_delta_stream(response, options.cancel.clone()))
    }
}
