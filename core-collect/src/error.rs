use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote probe failed for target {target}: {message}")]
    ProbeFailed { target: String, message: String },

    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("A run is already in progress for target {target}")]
    RunInProgress { target: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Run timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid unique key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        SyncError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
