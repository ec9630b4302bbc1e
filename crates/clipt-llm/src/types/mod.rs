pub mod content;
pub mod message;
pub mod tool;

pub use content::Part;
pub use message::{Message, Role};
pub use tool::{ToolCall, ToolCallResponse, ToolDefinition};
