use crate::error::{LlmError, Result};
use crate::types::Message;
use serde::{Deserialize, Serialize};

/// Append-only, ordered message log owned by a single run.
///
/// Messages are never reordered or removed once appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with a system instruction and the user's input
    pub fn seeded(system_prompt: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::human(input)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Last message, or [`LlmError::EmptyTranscript`]
    pub fn last(&self) -> Result<&Message> {
        self.messages.last().ok_or(LlmError::EmptyTranscript)
    }

    /// Owned copy of the messages for handing to a model client
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
