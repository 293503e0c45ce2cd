//! Message store: deduplicated persistence and per-conversation queries for messages.
//!
//! Uses SqlitePoolManager and the models (MessageRecord, NewMessage).
//! Rows are keyed by a surrogate `id`; `platform_message_id` is unique and drives the upsert.

use crate::error::StorageError;
use crate::models::{MessageRecord, NewMessage};
use crate::sqlite_pool::SqlitePoolManager;
use tracing::{debug, error, info, instrument, warn};

/// Rows returned by `list_by_conversation` when the caller passes a non-positive limit.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// An update can lose its row to a concurrent trim; the insert is retried this many times in total.
const MAX_PUT_ATTEMPTS: usize = 3;

/// What `put` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new row was inserted with this sequence id.
    Inserted(i64),
    /// A row with the same platform message id already existed; its body and timestamp were overwritten.
    Updated,
}

#[derive(Clone)]
pub struct MessageStore {
    pool_manager: SqlitePoolManager,
}

impl MessageStore {
    /// Opens (creating directories and file as needed) and provisions the schema.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let store = Self { pool_manager };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                platform_message_id TEXT NOT NULL UNIQUE,
                sender_id TEXT NOT NULL DEFAULT '',
                sender_kind TEXT NOT NULL,
                body TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(StorageError::Schema)?;

        for index_sql in [
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at)",
        ] {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(StorageError::Schema)?;
        }

        info!("Database tables created successfully");
        Ok(())
    }

    /// Idempotent upsert keyed by `platform_message_id`: insert, and on a unique-key conflict update `body` and `created_at`.
    #[instrument(skip(self, message), fields(conversation_id = %message.conversation_id, platform_message_id = %message.platform_message_id))]
    pub async fn put(&self, message: &NewMessage) -> Result<PutOutcome, StorageError> {
        for attempt in 1..=MAX_PUT_ATTEMPTS {
            match self.insert(message).await {
                Ok(id) => {
                    info!(id, body_len = message.body.len(), "Saved message");
                    return Ok(PutOutcome::Inserted(id));
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    debug!(attempt, "Message already stored, updating in place");
                }
                Err(e) => {
                    error!(error = %e, "Failed to insert message");
                    return Err(StorageError::Query {
                        context: format!("insert message {}", message.platform_message_id),
                        source: e,
                    });
                }
            }

            let updated = self
                .update_existing(message)
                .await
                .map_err(StorageError::query(format!(
                    "update message {}",
                    message.platform_message_id
                )))?;
            if updated > 0 {
                info!(body_len = message.body.len(), "Updated message");
                return Ok(PutOutcome::Updated);
            }
            // The conflicting row vanished between insert and update (trimmed); insert again.
            warn!(attempt, "Conflicting row disappeared before update, retrying insert");
        }

        Err(StorageError::Query {
            context: format!(
                "upsert message {} did not settle after {} attempts",
                message.platform_message_id, MAX_PUT_ATTEMPTS
            ),
            source: sqlx::Error::RowNotFound,
        })
    }

    async fn insert(&self, message: &NewMessage) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, platform_message_id, sender_id, sender_kind, body, kind, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.conversation_id)
        .bind(&message.platform_message_id)
        .bind(&message.sender_id)
        .bind(message.sender_kind.as_str())
        .bind(&message.body)
        .bind(&message.kind)
        .bind(message.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_existing(&self, message: &NewMessage) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET body = ?, created_at = ? WHERE platform_message_id = ?",
        )
        .bind(&message.body)
        .bind(message.created_at)
        .bind(&message.platform_message_id)
        .execute(self.pool_manager.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Up to `limit` most recent messages of a conversation, returned oldest-first. `limit <= 0` means [`DEFAULT_LIST_LIMIT`].
    pub async fn list_by_conversation(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let limit = if limit <= 0 { DEFAULT_LIST_LIMIT } else { limit };

        let mut messages: Vec<MessageRecord> = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, conversation_id, platform_message_id, sender_id, sender_kind, body, kind, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await
        .map_err(StorageError::query(format!("list messages of {}", conversation_id)))?;

        messages.reverse();

        info!(
            conversation_id = %conversation_id,
            count = messages.len(),
            "Retrieved recent messages for conversation"
        );
        Ok(messages)
    }

    /// Keeps only the `keep_count` most recent messages of a conversation (timestamp, then sequence) and deletes the rest.
    ///
    /// Rows inserted after the id ceiling is read are never deleted. Returns the number of rows removed.
    #[instrument(skip(self))]
    pub async fn trim_to_recent(
        &self,
        conversation_id: &str,
        keep_count: u32,
    ) -> Result<u64, StorageError> {
        let ceiling: Option<i64> =
            sqlx::query_scalar("SELECT MAX(id) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(self.pool_manager.pool())
                .await
                .map_err(StorageError::query(format!("trim messages of {}", conversation_id)))?;

        match ceiling {
            Some(ceiling) => self.trim_up_to(conversation_id, ceiling, keep_count).await,
            None => {
                debug!("No messages to trim");
                Ok(0)
            }
        }
    }

    /// Trims only among rows with `id <= ceiling`: of those, the `keep_count` most recent survive.
    /// Rows above the ceiling are untouched.
    #[instrument(skip(self))]
    pub async fn trim_up_to(
        &self,
        conversation_id: &str,
        ceiling: i64,
        keep_count: u32,
    ) -> Result<u64, StorageError> {
        // Survivors come from a subquery so the keep count is not bounded by the bind-variable limit.
        let deleted = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE conversation_id = ? AND id <= ?
              AND id NOT IN (
                SELECT id FROM messages
                WHERE conversation_id = ? AND id <= ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
              )
            "#,
        )
        .bind(conversation_id)
        .bind(ceiling)
        .bind(conversation_id)
        .bind(ceiling)
        .bind(i64::from(keep_count))
        .execute(self.pool_manager.pool())
        .await
        .map_err(StorageError::query(format!("trim messages of {}", conversation_id)))?
        .rows_affected();

        info!(
            ceiling,
            keep_count,
            deleted,
            "Trimmed conversation to most recent messages"
        );
        Ok(deleted)
    }

    pub async fn get_by_platform_id(
        &self,
        platform_message_id: &str,
    ) -> Result<Option<MessageRecord>, StorageError> {
        sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, conversation_id, platform_message_id, sender_id, sender_kind, body, kind, created_at
            FROM messages
            WHERE platform_message_id = ?
            "#,
        )
        .bind(platform_message_id)
        .fetch_optional(self.pool_manager.pool())
        .await
        .map_err(StorageError::query(format!("get message {}", platform_message_id)))
    }

    pub async fn count_by_conversation(&self, conversation_id: &str) -> Result<i64, StorageError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_one(self.pool_manager.pool())
            .await
            .map_err(StorageError::query(format!("count messages of {}", conversation_id)))
    }
}
