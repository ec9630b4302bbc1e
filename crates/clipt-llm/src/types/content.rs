use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolCallResponse};

/// One piece of a transcript message.
///
/// Model output mixes a single `Text` part with any number of `ToolCall`
/// parts; tool execution produces messages holding one `ToolCallResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text
    Text {
        text: String,
    },

    /// Structured request from the model to invoke a tool
    ToolCall(ToolCall),

    /// Result of a tool invocation, linked to its call by id
    ToolCallResponse(ToolCallResponse),
}

impl Part {
    /// Create a text part
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Get as plain text (if this is a text part)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            Self::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolCallResponse> {
        match self {
            Self::ToolCallResponse(response) => Some(response),
            _ => None,
        }
    }
}

impl From<ToolCall> for Part {
    fn from(call: ToolCall) -> Self {
        Self::ToolCall(call)
    }
}

impl From<ToolCallResponse> for Part {
    fn from(response: ToolCallResponse) -> Self {
        Self::ToolCallResponse(response)
    }
}

impl From<String> for Part {
    fn from(s: String) -> Self {
        Self::Text { text: s }
    }
}

impl From<&str> for Part {
    fn from(s: &str) -> Self {
        Self::Text { text: s.to_string() }
    }
}
