//! Error types for codec operations.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding wire formats.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An I/O error occurred on the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded into its wire form.
    #[error("encode error: {0}")]
    Encode(String),

    /// A record could not be decoded from its wire form.
    #[error("decode error: {0}")]
    Decode(String),

    /// The wire data itself is structurally invalid.
    #[error("malformed data: {0}")]
    Malformed(String),
}

impl CodecError {
    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates a malformed-data error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
