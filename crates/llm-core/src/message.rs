//! Conversation Messages
//!
//! The canonical message format every protocol adapter translates to and from.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmError;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result answering an earlier tool call
    Tool,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(LlmError::UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = LlmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    #[serde(default)]
    pub content: String,

    /// Raw tool-call payload exactly as the backend emitted it.
    /// Only present on assistant turns that requested tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Value>,

    /// Correlates a tool message with the call it answers. Call-identifier
    /// backends store the issued id here, name-matched backends the tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// User message built from several lines
    pub fn user_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::user(joined)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn recording the tool calls a backend asked for
    pub fn assistant_tool_calls(payload: Value) -> Self {
        Self {
            tool_calls: Some(payload),
            ..Self::new(Role::Assistant, "")
        }
    }

    /// Create a tool result message
    pub fn tool_result(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Whether this message records a backend tool-call request
    pub const fn has_tool_calls(&self) -> bool {
        self.tool_calls.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn test_user_lines() {
        let msg = Message::user_lines(["first", "second"]);
        assert_eq!(msg.content, "first\nsecond");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        let err = "moderator".parse::<Role>().unwrap_err();
        assert!(matches!(err, LlmError::UnknownRole(role) if role == "moderator"));

        let err = serde_json::from_str::<Message>(r#"{"role":"moderator","content":"hi"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown message role: moderator"));

        let msg: Message = serde_json::from_str(r#"{"role":"tool","content":"42"}"#).unwrap();
        assert_eq!(msg.role, Role::Tool);
    }

    #[test]
    fn test_tool_fields_serialized_only_when_present() {
        let plain = serde_json::to_value(Message::system("be brief")).unwrap();
        assert_eq!(plain, json!({"role": "system", "content": "be brief"}));

        let result = serde_json::to_value(Message::tool_result("42", "call_1")).unwrap();
        assert_eq!(result["tool_call_id"], "call_1");

        let calls = Message::assistant_tool_calls(json!([{"id": "call_1"}]));
        assert!(calls.has_tool_calls());
        assert_eq!(calls.role, Role::Assistant);
    }
}
