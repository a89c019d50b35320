#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] scribe_types::TextError),

    #[error("transport failed before the document completed: {0}")]
    Transport(String),
    #[error("assembly was aborted before completion")]
    AssemblyAborted,

    #[error("failed to read input: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize consultation: {0}")]
    Serialization(serde_json::Error),
}

impl ScribeError {
    /// Whether the error belongs to the assembly boundary (transport failure or abort) rather
    /// than to the caller's input.
    pub fn is_assembly_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::AssemblyAborted)
    }
}

pub type ScribeResult<T> = std::result::Result<T, ScribeError>;
