use thiserror::Error;

/// Errors raised when a post payload fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Title is too long: {len} characters (max {max})")]
    TitleTooLong { len: usize, max: usize },
    #[error("Content is too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },
}
