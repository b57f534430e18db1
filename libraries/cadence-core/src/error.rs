//! Core error types for the catalog records

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while reading catalog records
#[derive(Error, Debug)]
pub enum CoreError {
    /// An identifier could not be parsed
    #[error("Invalid {entity} id: {value:?}")]
    InvalidId {
        /// Kind of record the id belongs to
        entity: &'static str,
        /// The rejected input
        value: String,
    },

    /// A record could not be decoded from the backend payload
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create an invalid id error
    pub fn invalid_id(entity: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            entity,
            value: value.into(),
        }
    }
}
