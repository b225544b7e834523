use std::error::Error;
use thiserror::Error;

/// Result alias shared by every [`super::room_store::RoomStore`] method.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-agnostic storage failure.
///
/// Precondition failures (wrong round, unknown room, lost races) are encoded
/// as outcome values by the store methods; a `StorageError` always means the
/// backend itself misbehaved.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable context for the failing operation.
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The operation kept losing write races and gave up; safe to retry.
    #[error("storage contended: {message}")]
    Contended {
        /// Human-readable context for the contended operation.
        message: String,
    },
}

impl StorageError {
    /// Wrap a backend failure with operation context.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
