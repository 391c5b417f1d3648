//! Error types for core operations and the cancellation sentinel.

use rosterdb_backend::BackendError;
use rosterdb_model::{EntityKey, InvariantViolation};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the orchestration layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A backend adapter failed; the inner kind distinguishes connection,
    /// read, write, corruption, configuration, and unsupported failures.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A record violated a structural or referential invariant.
    #[error("data corrupted: {0}")]
    DataCorrupted(#[from] InvariantViolation),

    /// A key search found nothing.
    #[error("record {key} was not found")]
    NotFound {
        /// The key that was searched for.
        key: EntityKey,
    },

    /// A configuration document or source selection is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller abandoned an interactive step.
    #[error("operation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Outcome of an interactive step driven by a collaborator.
///
/// Collaborators (dialogs, choosers) report abandonment as an explicit
/// value rather than unwinding; [`Selection::into_result`] converts it to
/// [`CoreError::Cancelled`] at the orchestration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    /// The collaborator produced a value.
    Chosen(T),
    /// The caller abandoned the step.
    Cancelled,
}

impl<T> Selection<T> {
    /// Converts the sentinel into an error at the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cancelled`] for [`Selection::Cancelled`].
    pub fn into_result(self) -> CoreResult<T> {
        match self {
            Self::Chosen(value) => Ok(value),
            Self::Cancelled => Err(CoreError::Cancelled),
        }
    }

    /// Returns true when the step was abandoned.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
