//! Together AI Provider
//!
//! OpenAI-compatible chat completions endpoint, used for prompt-only calls.
//! No tools, no streaming.

use async_trait::async_trait;
use llm_core::{LlmError, Message, Options, Provider, Result, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, Backend};
use crate::http;

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Together AI provider
pub struct TogetherProvider {
    client: Client,
    config: ApiConfig,
}

impl TogetherProvider {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create from `TOGETHER_AI_TOKEN` / `TOGETHER_AI_BASE_URL`
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env(Backend::TogetherAi))
    }

    fn request_body<'a>(model: &'a str, messages: &'a [Message], options: &Options) -> ChatRequest<'a> {
        ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens(),
            response_format: options.response_format.map(|format| ResponseFormat {
                kind: format.as_str(),
            }),
        }
    }
}

#[async_trait]
impl Provider for TogetherProvider {
    fn name(&self) -> &'static str {
        "together-ai"
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn supports_tools(&self) -> bool {
        false
    }

    async fn prompt(&self, model: &str, messages: &[Message], options: &Options) -> Result<String> {
        let api_key = self.config.api_key()?;
        let body = Self::request_body(model, messages, options);
        let request = self
            .client
            .post(self.config.url(COMPLETIONS_PATH))
            .bearer_auth(api_key)
            .json(&body);

        let response: ChatResponse = http::post_json(request, options).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Protocol("no responses".into()))?
            .message
            .content
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::Protocol("no text content".into()));
        }
        Ok(content)
    }
}
