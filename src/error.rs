//! Error types for the paged result store
//!
//! Provides unified error handling using thiserror. The expiring cache has no
//! error type: its operations cannot fail.

use thiserror::Error;

/// Boxed error carried by [`StoreError::Unknown`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Storage Error Enum ==
/// Fault raised by a backing storage engine.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem or device I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

// == Store Error Enum ==
/// Unified error type for the paged result store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing storage raised an I/O-level fault
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// Anything unclassified, including misuse surfaced at runtime
    #[error("Unknown error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Builds an `Unknown` error with no underlying cause.
    pub fn unknown(message: impl Into<String>) -> Self {
        StoreError::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an `Unknown` error wrapping `source`.
    pub fn unknown_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::Unknown {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
