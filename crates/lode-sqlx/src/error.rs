//! Adapter error types.

use thiserror::Error;

/// Errors raised while fetching rows for a relation.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The database rejected or failed the query.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A table or column name is not a plain SQL identifier.
    #[error("invalid SQL identifier: {identifier:?}")]
    InvalidIdentifier { identifier: String },
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
