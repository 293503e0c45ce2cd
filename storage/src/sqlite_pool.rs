//! SQLite connection pool wrapper for the storage crate.

use crate::error::StorageError;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a database URL points.
#[derive(Debug, PartialEq, Eq)]
enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

fn parse_target(database_url: &str) -> DatabaseTarget {
    let trimmed = database_url.trim();
    if trimmed == ":memory:" || trimmed.starts_with("sqlite::memory:") {
        return DatabaseTarget::Memory;
    }
    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .or_else(|| trimmed.strip_prefix("file:"))
        .unwrap_or(trimmed);
    DatabaseTarget::File(PathBuf::from(path))
}

/// Manages a single SQLite pool; creates the parent directory and DB file if missing.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Creates a pool for the given database URL (file path, `file:`/`sqlite:` URL, or `sqlite::memory:`).
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        info!("Initializing SQLite pool: {}", database_url);

        let connect_err = |source| StorageError::Connection {
            url: database_url.to_string(),
            source,
        };

        let pool = match parse_target(database_url) {
            DatabaseTarget::Memory => {
                // Every in-memory connection is its own database, so the pool is pinned to one connection that never expires.
                let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(connect_err)?;
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
                    .map_err(connect_err)?
            }
            DatabaseTarget::File(path) => {
                ensure_parent_dir(&path)?;
                let options = SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(BUSY_TIMEOUT);
                SqlitePoolOptions::new()
                    .connect_with(options)
                    .await
                    .map_err(connect_err)?
            }
        };

        Ok(Self { pool })
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_memory() {
        assert_eq!(parse_target("sqlite::memory:"), DatabaseTarget::Memory);
        assert_eq!(parse_target(":memory:"), DatabaseTarget::Memory);
    }

    #[test]
    fn test_parse_target_strips_url_prefixes() {
        assert_eq!(
            parse_target("file:./data/bot.db"),
            DatabaseTarget::File(PathBuf::from("./data/bot.db"))
        );
        assert_eq!(
            parse_target("sqlite://data/bot.db"),
            DatabaseTarget::File(PathBuf::from("data/bot.db"))
        );
        assert_eq!(
            parse_target("sqlite:bot.db"),
            DatabaseTarget::File(PathBuf::from("bot.db"))
        );
        assert_eq!(
            parse_target("data/bot.db"),
            DatabaseTarget::File(PathBuf::from("data/bot.db"))
        );
    }

    #[tokio::test]
    async fn test_new_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("a/b/c/messages.db");

        let manager = SqlitePoolManager::new(db_path.to_str().unwrap())
            .await
            .expect("pool should open");
        sqlx::query("SELECT 1").execute(manager.pool()).await.unwrap();

        assert!(db_path.exists());
    }
}
