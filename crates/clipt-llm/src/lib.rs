pub mod error;
pub mod streaming;
pub mod traits;
pub mod transcript;
pub mod types;

pub use error::LlmError;
pub use traits::{ChunkHandler, Completion, GenerateOptions, GenerateRequest, ModelClient};

pub use streaming::{CompletionAccumulator, CompletionStream, StreamEvent};
pub use transcript::Transcript;
pub use types::{Message, Part, Role, ToolCall, ToolCallResponse, ToolDefinition};
