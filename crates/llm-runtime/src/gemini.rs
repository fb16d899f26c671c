//! Google AI Studio (Gemini) Provider
//!
//! Name-matched backend: function responses are correlated to calls by tool
//! name only. System messages move into `system_instruction`, assistant
//! turns become `model` turns, and consecutive function responses share one
//! `user` turn so the conversation keeps alternating.

use async_trait::async_trait;
use llm_core::{
    LlmError, Message, Options, Provider, ResponseFormat, Result, Role, Thinking, Tool,
    tool::{self, MAX_TOOL_ROUNDS},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ApiConfig, Backend};
use crate::http;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Native reasoning knob of one model family, indexed by [`Thinking`]
enum ThinkingKnob {
    Level([&'static str; 5]),
    Budget([i32; 5]),
}

/// Model-name prefix to reasoning knob; first match wins
const THINKING_TABLE: [(&str, ThinkingKnob); 3] = [
    (
        "gemini-3-pro",
        ThinkingKnob::Level(["LOW", "LOW", "LOW", "HIGH", "HIGH"]),
    ),
    (
        "gemini-3-flash",
        ThinkingKnob::Level(["MINIMAL", "MINIMAL", "LOW", "MEDIUM", "HIGH"]),
    ),
    (
        "gemini-2.5",
        ThinkingKnob::Budget([-1, 512, 1_024, 8_192, 32_576]),
    ),
];

const fn thinking_index(thinking: Thinking) -> usize {
    match thinking {
        Thinking::None => 0,
        Thinking::Minimal => 1,
        Thinking::Low => 2,
        Thinking::Medium => 3,
        Thinking::High => 4,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ThinkingConfig {
    #[serde(rename = "thinkingLevel", skip_serializing_if = "Option::is_none")]
    pub level: Option<&'static str>,
    #[serde(rename = "thinkingBudget", skip_serializing_if = "Option::is_none")]
    pub budget: Option<i32>,
}

/// Reasoning knob for `model`, `None` for model families without a table entry
pub fn thinking_config(model: &str, thinking: Thinking) -> Option<ThinkingConfig> {
    let (_, knob) = THINKING_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))?;

    let idx = thinking_index(thinking);
    Some(match knob {
        ThinkingKnob::Level(levels) => ThinkingConfig {
            level: Some(levels[idx]),
            budget: None,
        },
        ThinkingKnob::Budget(budgets) => ThinkingConfig {
            level: None,
            budget: Some(budgets[idx]),
        },
    })
}

// --- wire types ---

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    /// Fields this adapter does not interpret, e.g. thought signatures
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn is_thought(&self) -> bool {
        self.thought == Some(true)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    args: Value,
    /// Call fields this adapter does not interpret, e.g. `id`
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: FunctionOutput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FunctionOutput {
    output: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(rename = "thinkingConfig", skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    /// Kept verbatim so a tool-calling turn can be replayed unchanged
    #[serde(default)]
    parts: Vec<Value>,
}

fn function_response(name: &str, output: &str) -> Part {
    Part {
        function_response: Some(FunctionResponse {
            name: name.to_string(),
            response: FunctionOutput {
                output: output.to_string(),
            },
        }),
        ..Part::default()
    }
}

fn is_function_response_turn(content: &Content) -> bool {
    content.role == "user"
        && content
            .parts
            .last()
            .is_some_and(|part| part.function_response.is_some())
}

/// Split the conversation into system parts and alternating turns
fn convert_messages(messages: &[Message]) -> Result<(Vec<Part>, Vec<Content>)> {
    let mut system_parts = Vec::new();
    let mut contents: Vec<Content> = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system_parts.push(Part::text(&message.content)),
            Role::User => contents.push(Content {
                role: "user",
                parts: vec![Part::text(&message.content)],
            }),
            Role::Assistant => {
                let parts = match &message.tool_calls {
                    Some(payload) => serde_json::from_value(payload.clone()).map_err(|e| {
                        LlmError::Protocol(format!("failed to decode stored tool calls: {e}"))
                    })?,
                    None => vec![Part::text(&message.content)],
                };
                contents.push(Content {
                    role: "model",
                    parts,
                });
            }
            Role::Tool => {
                let name = message.tool_call_id.as_deref().unwrap_or_default();
                let part = function_response(name, &message.content);

                match contents.last_mut() {
                    Some(last) if is_function_response_turn(last) => last.parts.push(part),
                    _ => contents.push(Content {
                        role: "user",
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    Ok((system_parts, contents))
}

fn convert_tools(tools: &[Tool]) -> Vec<GeminiTool<'_>> {
    if tools.is_empty() {
        return Vec::new();
    }

    vec![GeminiTool {
        function_declarations: tools
            .iter()
            .map(|tool| FunctionDeclaration {
                name: &tool.name,
                description: (!tool.description.is_empty()).then_some(tool.description.as_str()),
                parameters: tool.parameters.as_ref(),
            })
            .collect(),
    }]
}

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ApiConfig,
}

impl GeminiProvider {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from `GOOGLE_AI_STUDIO_KEY` / `GOOGLE_AI_STUDIO_BASE_URL`
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env(Backend::GoogleAiStudio))
    }

    fn request_body<'a>(
        model: &str,
        messages: &[Message],
        options: &'a Options,
    ) -> Result<GenerateRequest<'a>> {
        let (system_parts, contents) = convert_messages(messages)?;

        Ok(GenerateRequest {
            system_instruction: (!system_parts.is_empty()).then_some(SystemInstruction {
                parts: system_parts,
            }),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: options.max_tokens(),
                response_mime_type: matches!(options.response_format, Some(ResponseFormat::JsonObject))
                    .then_some("application/json"),
                thinking_config: thinking_config(model, options.thinking),
            },
            tools: convert_tools(&options.tools),
        })
    }

    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        messages: &[Message],
        options: &Options,
    ) -> Result<Vec<Value>> {
        let body = Self::request_body(model, messages, options)?;
        let request = self
            .client
            .post(self.config.url(&format!("/v1beta/models/{model}:generateContent")))
            .header(API_KEY_HEADER, api_key)
            .json(&body);

        let mut response: GenerateResponse = http::post_json(request, options).await?;
        let candidate = response
            .candidates
            .pop()
            .ok_or_else(|| LlmError::Protocol("chat did not return any results".into()))?;

        if candidate.content.parts.is_empty() {
            return Err(LlmError::Protocol(
                "chat did not return any result parts".into(),
            ));
        }
        Ok(candidate.content.parts)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "google-ai-studio"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn prompt(&self, model: &str, messages: &[Message], options: &Options) -> Result<String> {
        let api_key = self.config.api_key()?;
        let mut conversation = messages.to_vec();

        for _ in 0..MAX_TOOL_ROUNDS {
            let raw_parts = self.generate(api_key, model, &conversation, options).await?;
            let parts: Vec<Part> = serde_json::from_value(Value::Array(raw_parts.clone()))
                .map_err(|e| LlmError::Protocol(format!("failed to decode parts: {e}")))?;

            let calls: Vec<&FunctionCall> = parts
                .iter()
                .filter_map(|part| part.function_call.as_ref())
                .collect();

            if !calls.is_empty() {
                conversation.push(Message::assistant_tool_calls(Value::Array(raw_parts)));
                for call in calls {
                    let result = tool::execute(&options.tools, &call.name, call.args.clone()).await;
                    conversation.push(Message::tool_result(result.output, call.name.clone()));
                }
                continue;
            }

            let text: String = parts
                .iter()
                .filter(|part| !part.is_thought())
                .filter_map(|part| part.text.as_deref())
                .collect();

            if text.is_empty() {
                return Err(LlmError::Protocol("no text content".into()));
            }
            return Ok(text);
        }

        Err(LlmError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }
}
