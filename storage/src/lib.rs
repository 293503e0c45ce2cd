//! Storage crate: durable, deduplicated message log.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – MessageRecord, NewMessage, SenderKind
//! - [`message_store`] – MessageStore (SQLite): upsert, per-conversation listing, retention trimming
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod message_store;
mod models;
mod sqlite_pool;

pub use error::StorageError;
pub use message_store::{MessageStore, PutOutcome, DEFAULT_LIST_LIMIT};
pub use models::{MessageRecord, NewMessage, SenderKind};
pub use sqlite_pool::SqlitePoolManager;
