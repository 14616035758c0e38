use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content identifier: {0}")]
    InvalidCid(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("invalid byte string: {0}")]
    InvalidBytes(String),

    #[error("invalid multihash: {0}")]
    InvalidMultihash(String),

    #[error("container lock poisoned: {0}")]
    Poisoned(&'static str),
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
