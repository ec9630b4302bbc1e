use crate::error::{GraphError, ToolCallError};
use crate::node::{Node, StreamEmitter};
use crate::tools::{ToolRegistry, UnknownToolPolicy};
use anyhow::Result;
use async_trait::async_trait;
use clipt_llm::{Message, ToolCall, ToolCallResponse, Transcript};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs every tool call found in the last message, in order.
///
/// Each resolved call appends one `Tool` message whose response carries the
/// originating call id. A failing tool never aborts the run: its error text
/// becomes the response content.
pub struct ExecuteNode {
    registry: Arc<ToolRegistry>,
    unknown_tools: UnknownToolPolicy,
}

impl ExecuteNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            unknown_tools: UnknownToolPolicy::default(),
        }
    }

    pub fn with_unknown_tool_policy(mut self, policy: UnknownToolPolicy) -> Self {
        self.unknown_tools = policy;
        self
    }

    async fn run_call(&self, cancel: &CancellationToken, call: &ToolCall) -> Result<Option<String>> {
        let Some(tool) = self.registry.get(&call.name) else {
            return match self.unknown_tools {
                UnknownToolPolicy::Ignore => {
                    tracing::warn!(tool = %call.name, call_id = %call.id, "skipping call to unregistered tool");
                    Ok(None)
                }
                UnknownToolPolicy::Fail => Err(GraphError::UnknownTool {
                    name: call.name.clone(),
                }
                .into()),
            };
        };

        let start = Instant::now();
        let content = match tool.call(cancel, &call.arguments).await {
            Ok(output) => output,
            Err(source) => {
                let failure = ToolCallError {
                    tool: call.name.clone(),
                    source,
                };
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %failure, "tool call failed");
                failure.to_string()
            }
        };

        tracing::debug!(
            tool = %call.name,
            call_id = %call.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "tool call finished"
        );

        Ok(Some(content))
    }
}

#[async_trait]
impl Node for ExecuteNode {
    async fn execute(
        &self,
        cancel: &CancellationToken,
        transcript: &mut Transcript,
        _stream: &StreamEmitter,
    ) -> Result<()> {
        let calls: Vec<ToolCall> = transcript.last()?.tool_calls().cloned().collect();

        for call in calls {
            if let Some(content) = self.run_call(cancel, &call).await? {
                transcript.append(Message::tool_response(ToolCallResponse::for_call(
                    &call, content,
                )));
            }
        }

        Ok(())
    }
}
