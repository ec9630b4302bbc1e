use crate::callback::Callback;
use anyhow::Result;
use async_trait::async_trait;
use clipt_llm::{ChunkHandler, Transcript};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Core abstraction for a unit of computation in the graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute the node's logic, appending to the transcript and optionally
    /// streaming raw chunks through `stream`.
    ///
    /// Whatever was appended before an error stays in the transcript.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        transcript: &mut Transcript,
        stream: &StreamEmitter,
    ) -> Result<()>;
}

/// Per-node handle that reports streamed chunks to the graph's callback
#[derive(Clone)]
pub struct StreamEmitter {
    node: String,
    callback: Arc<dyn Callback>,
}

impl StreamEmitter {
    pub fn new(node: impl Into<String>, callback: Arc<dyn Callback>) -> Self {
        Self {
            node: node.into(),
            callback,
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub async fn emit(&self, chunk: &str) {
        self.callback.handle_node_stream(&self.node, chunk).await;
    }
}

#[async_trait]
impl ChunkHandler for StreamEmitter {
    async fn handle_chunk(&self, chunk: &str) -> Result<()> {
        self.emit(chunk).await;
        Ok(())
    }
}
