pub mod callback;
pub mod error;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod prebuilt;
pub mod router;
pub mod stream_gate;
pub mod tools;
pub mod types;

pub use callback::{Callback, CallbackSet, LoggingCallback, NoopCallback};
pub use error::{GraphError, Result, ToolCallError};
pub use graph::{CompiledGraph, Decide, Edge, GraphDefinition, END};
pub use node::{Node, StreamEmitter};
pub use nodes::{ExecuteNode, ModelNode};
pub use prebuilt::{react_graph, tool_loop_graph, GraphTool, ReactOptions, DEFAULT_FINISH_MARKER};
pub use router::{has_tool_calls, route_on_finish_marker, route_on_tool_calls};
pub use stream_gate::{LoneColonTrim, MarkerTransform, PassThrough, StreamGate, DEFAULT_KEYWORDS};
pub use tools::{Tool, ToolRegistry, UnknownToolPolicy};
pub use types::GraphConfig;

// Re-export the message model so callers need only one import
pub use clipt_llm::{Message, ModelClient, Transcript};
