/// Storage-specific errors
use covau_core::{CovauError, TxnId};
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The transaction was never opened or already finished
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(TxnId),

    /// A stored row cannot be decoded
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Migration error
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<StorageError> for CovauError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => CovauError::not_found(entity, id),
            StorageError::Serialization(e) => CovauError::Serialization(e),
            other => CovauError::database(other.to_string()),
        }
    }
}
