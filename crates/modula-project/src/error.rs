//! Error types for project scenarios.

use thiserror::Error;

/// Errors raised by project controllers and scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The user dismissed a dialog or declined to continue.
    #[error("cancelled by user")]
    Cancelled,

    /// A save location was requested without a concrete location type.
    #[error("save location type is undefined")]
    UndefinedLocation,

    /// A capability this code depends on could not be resolved.
    #[error(transparent)]
    Capability(#[from] modula_core::Error),
}

/// Result type alias for project operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<Error> for modula_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Capability(inner) => inner,
            other => modula_core::Error::module("project", other.to_string()),
        }
    }
}
