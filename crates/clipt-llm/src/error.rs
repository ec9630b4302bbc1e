use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("transcript is empty")]
    EmptyTranscript,

    #[error("model call cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LlmError>;
