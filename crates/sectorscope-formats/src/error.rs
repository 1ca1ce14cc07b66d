/// Errors that can occur while decoding archive contents.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid format in {context}: {detail}")]
    InvalidFormat {
        context: &'static str,
        detail: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("read of {needed} bytes at position {position} exceeds window of {len} bytes")]
    OutOfRange {
        position: usize,
        needed: usize,
        len: usize,
    },

    #[error("{what} index {index} out of range (have {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("failed to fetch archive bytes: {0}")]
    Fetch(#[from] std::io::Error),
}

impl DecodeError {
    pub(crate) fn invalid(context: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidFormat {
            context,
            detail: detail.into(),
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
