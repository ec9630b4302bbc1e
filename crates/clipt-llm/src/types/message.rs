use serde::{Deserialize, Serialize};

use super::content::Part;
use super::tool::{ToolCall, ToolCallResponse};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt (instructions)
    System,
    /// User input
    Human,
    /// Model output
    AI,
    /// Tool results
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "human",
            Self::AI => "ai",
            Self::Tool => "tool",
        }
    }
}

/// Clipt transcript message (provider-agnostic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Create system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Part::text(text)])
    }

    /// Create human message
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Role::Human, vec![Part::text(text)])
    }

    /// Create AI message with text only
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Role::AI, vec![Part::text(text)])
    }

    /// Create AI message with text followed by tool calls
    pub fn ai_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut parts = Vec::with_capacity(tool_calls.len() + 1);
        parts.push(Part::text(text));
        parts.extend(tool_calls.into_iter().map(Part::ToolCall));
        Self::new(Role::AI, parts)
    }

    /// Create tool result message
    pub fn tool_response(response: ToolCallResponse) -> Self {
        Self::new(Role::Tool, vec![Part::ToolCallResponse(response)])
    }

    /// Text of the first text part, if any
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.parts.iter().filter_map(Part::as_tool_call)
    }

    pub fn tool_responses(&self) -> impl Iterator<Item = &ToolCallResponse> {
        self.parts.iter().filter_map(Part::as_tool_response)
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls().next().is_some()
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        self.role.as_str()
    }
}
