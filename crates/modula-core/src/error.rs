//! Error types for registry operations.
//!
//! This module provides the `Error` type and `Result<T>` alias used across
//! all Modula crates. Uses `thiserror` for derive macros.
//!
//! Registry defects (double registration, identifier collisions, missing
//! required capabilities) are wiring bugs rather than runtime conditions.
//! [`Error::is_fatal`] separates them from recoverable errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while wiring or resolving capabilities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A capability was registered while another provider is still registered.
    #[error(
        "{module}: double register: {identifier}, first register in {first_module}"
    )]
    DoubleRegistration {
        identifier: String,
        module: String,
        first_module: String,
    },

    /// Two distinct types produced the same capability identifier.
    #[error(
        "{module}: identifier collision: {identifier} is held by `{existing_type}`, rejected `{new_type}`"
    )]
    IdentifierCollision {
        identifier: String,
        module: String,
        existing_type: String,
        new_type: String,
    },

    /// A capability declared as required has no provider.
    #[error("{module}: not found implementation for capability: {identifier}")]
    MissingCapability { identifier: String, module: String },

    /// An internal capability was resolved from outside its owning module.
    #[error(
        "capability '{identifier}' is internal, usage module: '{requesting_module}', capability module: '{owning_module}', called from: {called_from}"
    )]
    VisibilityViolation {
        identifier: String,
        requesting_module: String,
        owning_module: String,
        called_from: String,
    },

    /// Capability or module identity could not be extracted from type text.
    #[error("malformed signature `{signature}`: {reason}")]
    MalformedSignature {
        signature: String,
        reason: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("I/O error at {}: {message}", path.display())]
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },

    /// A module failed during bootstrap.
    #[error("module {module}: {message}")]
    Module { module: String, message: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a module error.
    pub fn module(module: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Module {
            module: module.into(),
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Create a malformed signature error.
    pub fn malformed(signature: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedSignature {
            signature: signature.into(),
            reason,
        }
    }

    /// Whether this error is a wiring defect that should stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DoubleRegistration { .. }
                | Self::IdentifierCollision { .. }
                | Self::MissingCapability { .. }
                | Self::MalformedSignature { .. }
        )
    }

    /// The capability identifier involved, if any.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::DoubleRegistration { identifier, .. }
            | Self::IdentifierCollision { identifier, .. }
            | Self::MissingCapability { identifier, .. }
            | Self::VisibilityViolation { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// Result type alias using Modula's Error type.
pub type Result<T> = std::result::Result<T, Error>;
