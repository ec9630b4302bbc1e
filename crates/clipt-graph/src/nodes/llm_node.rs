use crate::error::GraphError;
use crate::node::{Node, StreamEmitter};
use crate::tools::ToolRegistry;
use anyhow::Result;
use async_trait::async_trait;
use clipt_llm::{
    ChunkHandler, GenerateOptions, GenerateRequest, LlmError, Message, ModelClient, ToolDefinition,
    Transcript,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// One model call per execution, appending exactly one AI message.
///
/// The optional instruction is sent as a trailing system message on the
/// request only; it never lands in the transcript.
pub struct ModelNode {
    client: Arc<dyn ModelClient>,
    instruction: Option<String>,
    tools: Vec<ToolDefinition>,
    options: GenerateOptions,
    streaming: bool,
}

impl ModelNode {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            instruction: None,
            tools: Vec::new(),
            options: GenerateOptions::default(),
            streaming: true,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Advertise every tool in `registry` to the model
    pub fn with_tools(mut self, registry: &ToolRegistry) -> Self {
        self.tools = registry.definitions();
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop forwarding text deltas to the graph callback
    pub fn without_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    fn build_request(&self, transcript: &Transcript) -> GenerateRequest {
        let mut messages = transcript.snapshot();
        if let Some(instruction) = &self.instruction {
            messages.push(Message::system(instruction.clone()));
        }

        let mut options = self.options.clone();
        if !self.tools.is_empty() {
            options = options.tools(self.tools.clone());
        }

        GenerateRequest::new(messages).with_options(options)
    }
}

#[async_trait]
impl Node for ModelNode {
    async fn execute(
        &self,
        cancel: &CancellationToken,
        transcript: &mut Transcript,
        stream: &StreamEmitter,
    ) -> Result<()> {
        let request = self.build_request(transcript);
        let start = Instant::now();

        tracing::debug!(
            node = stream.node(),
            messages = request.messages.len(),
            tools = self.tools.len(),
            "calling model"
        );

        let on_chunk = self.streaming.then_some(stream as &dyn ChunkHandler);
        let completion = match self.client.generate_content(cancel, request, on_chunk).await {
            Ok(completion) => completion,
            Err(err) if matches!(err.downcast_ref::<LlmError>(), Some(LlmError::Cancelled)) => {
                return Err(err);
            }
            Err(source) => {
                return Err(GraphError::ModelCall {
                    node: stream.node().to_string(),
                    source,
                }
                .into());
            }
        };

        tracing::debug!(
            node = stream.node(),
            tool_calls = completion.tool_calls.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "model responded"
        );

        transcript.append(completion.into_message());
        Ok(())
    }
}
