//! Error types for the Linkding provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkdingError {
    /// Missing or malformed configuration
    #[error("Invalid Linkding configuration: {0}")]
    Config(String),

    /// API request returned a non-success status
    #[error("Linkding API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// A record could not be turned into a bookmark
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Linkding operations
pub type Result<T> = std::result::Result<T, LinkdingError>;

impl From<LinkdingError> for BridgeError {
    fn from(error: LinkdingError) -> Self {
        match error {
            LinkdingError::Config(msg) => {
                BridgeError::OperationFailed(format!("Invalid configuration: {}", msg))
            }
            LinkdingError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            LinkdingError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            LinkdingError::InvalidRecord(msg) => {
                BridgeError::OperationFailed(format!("Invalid record: {}", msg))
            }
            LinkdingError::BridgeError(e) => e,
        }
    }
}
