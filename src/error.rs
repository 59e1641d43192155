//! Error types for termchan.

use thiserror::Error;

/// Common error type for termchan.
#[derive(Error, Debug)]
pub enum TermchanError {
    /// Board or thread does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A board with the requested name is already registered.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Caller supplied an empty or malformed value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored document failed structural validation.
    ///
    /// Operations never retry or repair on their own; the data directory
    /// needs manual attention.
    #[error("storage corrupt: {0}")]
    StorageCorrupt(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TermchanError {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TermchanError::NotFound(_))
    }
}

/// Result type alias for termchan operations.
pub type Result<T> = std::result::Result<T, TermchanError>;
