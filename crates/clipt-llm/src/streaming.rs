use std::collections::BTreeMap;
use std::pin::Pin;

use anyhow::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::traits::Completion;
use crate::types::ToolCall;

/// Incremental output of a streaming model call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Raw text fragment
    Text {
        content: String,
    },

    /// Tool call delta, merged by `index`
    ToolCall {
        index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl StreamEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// A complete tool call delivered as a single delta
    pub fn tool_call(
        index: u32,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::ToolCall {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: Some(arguments.into()),
        }
    }

    pub fn done() -> Self {
        Self::Done {
            finish_reason: Some("stop".to_string()),
        }
    }
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

#[derive(Debug, Default)]
struct ToolCallBuffer {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Folds a sequence of [`StreamEvent`]s into a [`Completion`].
#[derive(Debug, Default)]
pub struct CompletionAccumulator {
    text: String,
    tool_calls: BTreeMap<u32, ToolCallBuffer>,
    finish_reason: Option<String>,
}

impl CompletionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Text { content } => {
                self.text.push_str(&content);
            }
            StreamEvent::ToolCall {
                index,
                id,
                name,
                arguments,
            } => {
                let entry = self.tool_calls.entry(index).or_default();

                if let Some(id) = id {
                    entry.id = Some(id);
                }
                if let Some(name) = name {
                    entry.name = Some(name);
                }
                if let Some(args) = arguments {
                    entry.arguments.push_str(&args);
                }
            }
            StreamEvent::Done { finish_reason } => {
                if finish_reason.is_some() {
                    self.finish_reason = finish_reason;
                }
            }
        }
    }

    pub fn finish(self) -> Completion {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .filter_map(|(index, buffer)| match (buffer.id, buffer.name) {
                (Some(id), Some(name)) => Some(ToolCall::new(id, name, buffer.arguments)),
                _ => {
                    tracing::warn!(index, "dropping tool call delta without id or name");
                    None
                }
            })
            .collect();

        Completion {
            text: self.text,
            tool_calls,
            finish_reason: self.finish_reason,
        }
    }
}
