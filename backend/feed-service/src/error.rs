/// Error types for feed-service
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Post not found: {0}")]
    NotFound(Uuid),

    #[error("Storage I/O error: {0}")]
    StoreIo(#[from] std::io::Error),

    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedError {
    /// True when the failure came from the durable medium rather than the caller
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, FeedError::StoreIo(_) | FeedError::Corrupt { .. })
    }
}

/// Input rejected locally before touching the store.
///
/// Not a failure: callers get it back as a value and nothing is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Comment text is empty")]
    EmptyComment,

    #[error("Username is empty")]
    EmptyUsername,
}

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;
