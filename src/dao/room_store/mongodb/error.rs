//! Error types for the MongoDB storage implementation.

use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the client failed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial ping never succeeded.
    #[error("MongoDB unreachable after {attempts} ping attempts")]
    InitialPing {
        attempts: u32,
        #[source]
        source: mongodb::error::Error,
    },
    /// A health-check ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        #[source]
        source: mongodb::error::Error,
    },
    /// Creating an index failed.
    #[error("failed to ensure index `{index}` on `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    /// A query against a collection failed.
    #[error("failed to query `{collection}`")]
    Query {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    /// A write against a collection failed.
    #[error("failed to write to `{collection}` for room `{room_id}`")]
    Write {
        collection: &'static str,
        room_id: Uuid,
        #[source]
        source: mongodb::error::Error,
    },
    /// Matchmaking kept losing creation/join races.
    #[error("matchmaking for quest `{quest_id}` exhausted {attempts} attempts")]
    MatchmakingRetries { quest_id: String, attempts: u32 },
}
