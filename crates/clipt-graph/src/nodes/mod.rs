pub mod llm_node;
pub mod tool_node;

pub use llm_node::ModelNode;
pub use tool_node::ExecuteNode;
