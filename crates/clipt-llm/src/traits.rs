use crate::error::LlmError;
use crate::streaming::{CompletionAccumulator, CompletionStream};
use crate::types::{Message, ToolCall, ToolDefinition};
use crate::StreamEvent;
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Receives raw text fragments while a model call is in flight
#[async_trait]
pub trait ChunkHandler: Send + Sync {
    async fn handle_chunk(&self, chunk: &str) -> Result<()>;
}

/// Trait for language-model clients
///
/// Implementors only provide [`ModelClient::generate_stream`]; the engine
/// drives them through [`ModelClient::generate_content`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Streaming completion
    async fn generate_stream(&self, request: GenerateRequest) -> Result<CompletionStream>;

    /// Run a completion to the end, forwarding text fragments to `on_chunk`
    /// as they arrive.
    ///
    /// Returns [`LlmError::Cancelled`] as soon as `cancel` fires.
    async fn generate_content(
        &self,
        cancel: &CancellationToken,
        request: GenerateRequest,
        on_chunk: Option<&dyn ChunkHandler>,
    ) -> Result<Completion> {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled.into()),
            stream = self.generate_stream(request) => stream?,
        };

        let mut acc = CompletionAccumulator::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LlmError::Cancelled.into()),
                next = stream.next() => next,
            };

            let Some(event) = next else { break };
            let event = event?;

            if let (StreamEvent::Text { content }, Some(handler)) = (&event, on_chunk) {
                handler.handle_chunk(content).await?;
            }

            acc.push(event);
        }

        Ok(acc.finish())
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub tools: Option<Vec<ToolDefinition>>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// Finished model output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl Completion {
    /// AI message with the text part first, then one part per tool call
    pub fn into_message(self) -> Message {
        Message::ai_with_tool_calls(self.text, self.tool_calls)
    }
}
