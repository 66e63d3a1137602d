use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No file selected")]
    NoFileSelected,

    #[error("A compression request is already in flight")]
    RequestInFlight,

    #[error("Invalid K value: {0}. Must be a positive integer")]
    InvalidK(u32),

    #[error("Could not reach the compression service: {0}")]
    Transport(String),

    #[error("Compression failed on server (HTTP {status})")]
    Service { status: u16 },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Not an image: {0} ({1})")]
    NotAnImage(PathBuf, String),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Resource handle {0} has been revoked")]
    ResourceRevoked(String),

    #[error("No compressed result available")]
    NoResult,

    #[error("Invalid service URL '{0}': {1}")]
    InvalidBaseUrl(String, String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl CompressionError {
    /// Whether this error comes from the remote request itself, as opposed to
    /// a precondition or a local failure.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            CompressionError::Transport(_) | CompressionError::Service { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
