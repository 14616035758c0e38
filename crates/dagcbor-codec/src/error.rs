use dagcbor_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("the object passed has circular references")]
    CircularReference,

    #[error("value is not a content identifier: {0}")]
    InvalidLink(String),

    #[error("link parse error: {0}")]
    LinkParse(#[from] TypeError),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("traversal fault: {0}")]
    Traversal(String),

    #[error("nesting depth exceeds limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CodecError {
    /// A container could not be read while walking the tree.
    pub(crate) fn traversal(e: TypeError) -> Self {
        CodecError::Traversal(e.to_string())
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
