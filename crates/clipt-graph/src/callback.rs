use async_trait::async_trait;
use clipt_llm::Transcript;
use std::sync::Arc;

/// Observation hooks for the graph run loop.
///
/// Every method defaults to a no-op so observers only implement what they
/// care about. Hooks are awaited inline by the run loop, in order.
#[async_trait]
pub trait Callback: Send + Sync {
    async fn handle_node_start(&self, _node: &str, _transcript: &Transcript) {}

    async fn handle_node_end(&self, _node: &str, _transcript: &Transcript) {}

    /// Raw chunk streamed by a node while it runs
    async fn handle_node_stream(&self, _node: &str, _chunk: &str) {}

    /// Before a conditional edge is evaluated
    async fn handle_edge_entry(&self, _edge: &str, _transcript: &Transcript) {}

    /// After a conditional edge picked `outcome`
    async fn handle_edge_exit(&self, _edge: &str, _transcript: &Transcript, _outcome: &str) {}
}

pub struct NoopCallback;

impl Callback for NoopCallback {}

/// Writes lifecycle events to `tracing`
pub struct LoggingCallback;

#[async_trait]
impl Callback for LoggingCallback {
    async fn handle_node_start(&self, node: &str, transcript: &Transcript) {
        tracing::info!(node, messages = transcript.len(), "node started");
    }

    async fn handle_node_end(&self, node: &str, transcript: &Transcript) {
        tracing::info!(node, messages = transcript.len(), "node finished");
    }

    async fn handle_node_stream(&self, node: &str, chunk: &str) {
        tracing::trace!(node, chunk, "node stream");
    }

    async fn handle_edge_exit(&self, edge: &str, _transcript: &Transcript, outcome: &str) {
        tracing::debug!(edge, outcome, "edge resolved");
    }
}

/// Fans every hook out to several callbacks in registration order
#[derive(Default, Clone)]
pub struct CallbackSet {
    callbacks: Vec<Arc<dyn Callback>>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, callback: Arc<dyn Callback>) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn push(&mut self, callback: Arc<dyn Callback>) {
        self.callbacks.push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[async_trait]
impl Callback for CallbackSet {
    async fn handle_node_start(&self, node: &str, transcript: &Transcript) {
        for callback in &self.callbacks {
            callback.handle_node_start(node, transcript).await;
        }
    }

    async fn handle_node_end(&self, node: &str, transcript: &Transcript) {
        for callback in &self.callbacks {
            callback.handle_node_end(node, transcript).await;
        }
    }

    async fn handle_node_stream(&self, node: &str, chunk: &str) {
        for callback in &self.callbacks {
            callback.handle_node_stream(node, chunk).await;
        }
    }

    async fn handle_edge_entry(&self, edge: &str, transcript: &Transcript) {
        for callback in &self.callbacks {
            callback.handle_edge_entry(edge, transcript).await;
        }
    }

    async fn handle_edge_exit(&self, edge: &str, transcript: &Transcript, outcome: &str) {
        for callback in &self.callbacks {
            callback.handle_edge_exit(edge, transcript, outcome).await;
        }
    }
}
