/// Database model definitions.
pub mod models;
/// Room state storage and retrieval operations.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
