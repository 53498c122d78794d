//! Error types for queue operations

use covau_core::CovauError;
use thiserror::Error;

/// Queue errors
///
/// User-recoverable problems (duplicates, bad indices, stream failures) are
/// reported as warnings on the event channel and never surface here.
#[derive(Debug, Error)]
pub enum QueueError {
    /// An item the caller expected in the queue is missing
    #[error("item \"{0}\" not in queue")]
    NotInQueue(String),

    /// Backend, database or player fault
    #[error(transparent)]
    Core(#[from] CovauError),
}

impl From<QueueError> for CovauError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotInQueue(title) => CovauError::NotInList(title),
            QueueError::Core(e) => e,
        }
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
