use clipt_llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Raised by `compile`, never mid-run
    #[error("graph validation failed: {0}")]
    Validation(String),

    #[error("run exceeded the maximum of {max} steps")]
    MaxStepsExceeded { max: usize },

    #[error("model call failed in node '{node}': {source}")]
    ModelCall {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("node '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no tool registered under '{name}'")]
    UnknownTool { name: String },

    #[error("edge '{edge}' routed to undeclared target '{target}'")]
    UndeclaredRoute { edge: String, target: String },

    #[error("routing on edge '{edge}' failed: {source}")]
    Route {
        edge: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error("run timed out")]
    Timeout,
}

impl GraphError {
    /// Classify an error returned by a node body.
    ///
    /// Errors that already are a `GraphError` pass through; cancellation
    /// reported by the model client maps to [`GraphError::Cancelled`].
    pub(crate) fn from_node(node: &str, err: anyhow::Error) -> Self {
        let err = match err.downcast::<GraphError>() {
            Ok(graph_err) => return graph_err,
            Err(err) => err,
        };

        if matches!(err.downcast_ref::<LlmError>(), Some(LlmError::Cancelled)) {
            return Self::Cancelled;
        }

        Self::Node {
            node: node.to_string(),
            source: err,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure of a single tool call.
///
/// Never propagated: its `Display` becomes the tool response content so
/// the model sees the degraded result.
#[derive(Error, Debug)]
#[error("Tool execution failed: {source}")]
pub struct ToolCallError {
    pub tool: String,
    #[source]
    pub source: anyhow::Error,
}

pub type Result<T> = std::result::Result<T, GraphError>;
