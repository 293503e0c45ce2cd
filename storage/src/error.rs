//! Storage error types.
//!
//! Returned by [`crate::MessageStore`] and [`crate::SqlitePoolManager`]; each variant names the key or step that failed.

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection error ({url}): {source}")]
    Connection {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Schema provisioning failed: {0}")]
    Schema(#[source] sqlx::Error),
    #[error("Query failed ({context}): {source}")]
    Query {
        context: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("IO error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn query(context: impl Into<String>) -> impl FnOnce(sqlx::Error) -> Self {
        let context = context.into();
        move |source| StorageError::Query { context, source }
    }
}
