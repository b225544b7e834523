//! MongoDB [`super::RoomStore`] backend.
//!
//! Unique indexes carry the insert-if-absent contracts the room lifecycle
//! relies on: one commit per (room, round), one artifact per room, one award
//! per (participant, kind, scope), one membership per (room, participant) and
//! at most one open room per quest.

mod connection;
mod error;
mod models;
pub mod store;

pub use error::MongoDaoError;
pub use store::MongoRoomStore;

/// Connection settings.
pub mod config;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::MatchmakingRetries { .. } => StorageError::Contended {
                message: err.to_string(),
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
