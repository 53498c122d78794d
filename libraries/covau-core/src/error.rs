/// Core error types for Covau
use thiserror::Error;

use crate::types::DbId;

/// Result type alias using `CovauError`
pub type Result<T> = std::result::Result<T, CovauError>;

/// Core error type for Covau
#[derive(Error, Debug)]
pub enum CovauError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Item with the same key is already present
    #[error("item \"{0}\" already in list")]
    Duplicate(String),

    /// Item expected in a list was not there (logic fault)
    #[error("item \"{0}\" not in list")]
    NotInList(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Search backend failure (catalog, recommendation service)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Database errors (for database implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// Optimistic metadata update lost the race
    #[error("Update conflict on item {0}")]
    Conflict(DbId),

    /// The source factory cannot serve this query
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Player command failed
    #[error("Player error: {0}")]
    Player(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CovauError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a player error
    pub fn player(msg: impl Into<String>) -> Self {
        Self::Player(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
