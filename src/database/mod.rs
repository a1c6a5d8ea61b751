// ABOUTME: SQLite connection management and schema migrations for the conversation store
// ABOUTME: Opens the shared pool, creates tables idempotently, and exposes store managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! # Database Management
//!
//! The relational store is the system of record for chats, messages and the
//! profile summaries shown in listings. A single [`Database`] owns the shared
//! `SQLite` pool; managers such as [`ConversationStore`] and
//! [`SqliteProfileDirectory`] borrow clones of it.

/// Chat and message persistence
pub mod conversations;
/// Profile summaries backing the profile directory
pub mod profiles;
/// Transaction guard and retry helpers
pub mod transactions;

pub use conversations::ConversationStore;
pub use profiles::SqliteProfileDirectory;
pub use transactions::{retry_transaction, SqliteTransactionGuard, TransactionGuard};

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, AppResult};

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS chats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        participant_a INTEGER NOT NULL,
        participant_b INTEGER NOT NULL,
        last_message_preview TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK (participant_a < participant_b),
        UNIQUE (participant_a, participant_b)
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_chats_participant_b ON chats(participant_b)",
    r"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
        sender_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'unread' CHECK (status IN ('unread', 'read')),
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_status ON messages(chat_id, status, sender_id)",
];

/// Database manager owning the shared connection pool
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect using `config` and run migrations
    ///
    /// File databases are created if missing (including their parent
    /// directory) and opened in WAL mode. `sqlite::memory:` yields a pool
    /// whose connections share one in-memory database for the pool's lifetime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unparsable URL and `Unavailable` if the
    /// database cannot be opened or migrated
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        config.validate()?;

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL '{}': {e}", config.url)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout());

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout());

        if config.is_memory() {
            // The shared in-memory database disappears with its last connection
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            if let Some(parent) = options.get_filename().parent() {
                ensure_directory(parent).await?;
            }
        }

        let pool = pool_options.connect_with(options).await?;
        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Database pool opened"
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables and indices if they do not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        SqliteProfileDirectory::new(self.pool.clone())
            .migrate()
            .await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn ensure_directory(dir: &Path) -> AppResult<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        AppError::database(format!(
            "Failed to create database directory {}: {e}",
            dir.display()
        ))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        db.migrate().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('chats', 'messages', 'profiles') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, vec!["chats", "messages", "profiles"]);
    }

    #[tokio::test]
    async fn test_canonical_order_is_enforced_by_schema() {
        let db = Database::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let result = sqlx::query(
            "INSERT INTO chats (participant_a, participant_b, created_at, updated_at) VALUES (2, 1, '', '')",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
