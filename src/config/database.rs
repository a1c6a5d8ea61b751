// ABOUTME: Database configuration for the SQLite system of record
// ABOUTME: Handles connection URL, pool sizing, busy timeout, and write retry budget
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::env_parse_or;
use crate::constants::database;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Database connection and management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `SQLite` URL (`sqlite:path/to.db` or `sqlite::memory:`)
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Milliseconds `SQLite` waits on a locked database
    pub busy_timeout_ms: u64,
    /// Attempts made for a write transaction under lock contention
    pub transaction_retries: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: database::DEFAULT_DATABASE_URL.to_owned(),
            max_connections: database::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: database::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            busy_timeout_ms: database::DEFAULT_BUSY_TIMEOUT_MS,
            transaction_retries: database::DEFAULT_TRANSACTION_RETRIES,
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| database::DEFAULT_DATABASE_URL.to_owned()),
            max_connections: env_parse_or(
                "DATABASE_MAX_CONNECTIONS",
                database::DEFAULT_MAX_CONNECTIONS,
            ),
            acquire_timeout_secs: env_parse_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                database::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
            busy_timeout_ms: env_parse_or(
                "DATABASE_BUSY_TIMEOUT_MS",
                database::DEFAULT_BUSY_TIMEOUT_MS,
            ),
            transaction_retries: env_parse_or(
                "DATABASE_TRANSACTION_RETRIES",
                database::DEFAULT_TRANSACTION_RETRIES,
            ),
        }
    }

    /// In-memory database, mainly for tests and demos
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_owned(),
            ..Self::default()
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Pool acquire timeout
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// `SQLite` busy timeout
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Reject values that can never work
    ///
    /// # Errors
    ///
    /// Returns a config error if the URL is not a `SQLite` URL or the pool is empty
    pub fn validate(&self) -> AppResult<()> {
        if !self.url.starts_with("sqlite:") {
            return Err(AppError::config(format!(
                "DATABASE_URL must be a sqlite: URL, got '{}'",
                self.url
            )));
        }
        if self.max_connections == 0 {
            return Err(AppError::config(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }
        if self.transaction_retries == 0 {
            return Err(AppError::config(
                "DATABASE_TRANSACTION_RETRIES must be at least 1",
            ));
        }
        Ok(())
    }
}
