use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// None of these reach a client. The cached repository absorbs every one of
/// them: a failed lookup becomes a miss, a failed write-back or invalidation
/// is logged and left for the TTL to repair.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
