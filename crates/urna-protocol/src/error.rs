use thiserror::Error;

/// Errors raised while framing lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("line terminator must not be empty")]
    EmptyTerminator,

    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
