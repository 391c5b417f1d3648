//! Error types for backend operations.

use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while driving a storage backend.
///
/// Adapters never swallow lower-level failures: every driver, transport,
/// or parse error is wrapped into one of these kinds and propagated.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or refused the credentials.
    #[error("connection error: {0}")]
    Connection(String),

    /// An I/O or protocol failure while reading from an open backend.
    #[error("read error: {0}")]
    Read(String),

    /// An I/O or protocol failure while writing to an open backend.
    #[error("write error: {0}")]
    Write(String),

    /// The payload or stored data violates the wire format.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// The descriptor is malformed or names an unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend does not support the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Creates a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// Creates a corrupted-data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}
