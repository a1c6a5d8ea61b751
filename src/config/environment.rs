// ABOUTME: Aggregated server configuration loaded from environment variables
// ABOUTME: Combines database, cache, service deadline, and logging settings with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{env_parse_or, CacheConfig, DatabaseConfig};
use crate::constants::service;
use crate::errors::{AppError, AppResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Conversation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deadline applied to a service call when the caller does not supply one
    pub operation_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: service::DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl ServiceConfig {
    /// Load service configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            operation_timeout_ms: env_parse_or(
                "CHAT_OPERATION_TIMEOUT_MS",
                service::DEFAULT_OPERATION_TIMEOUT_MS,
            ),
        }
    }

    /// Default per-operation timeout
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Full configuration of a Matchbox Chat process
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Relational store
    pub database: DatabaseConfig,
    /// Message cache
    pub cache: CacheConfig,
    /// Service deadlines
    pub service: ServiceConfig,
    /// Structured logging
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load and validate the whole configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns a config error if any section fails validation
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            service: ServiceConfig::from_env(),
            logging: LoggingConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first section error found
    pub fn validate(&self) -> AppResult<()> {
        self.database.validate()?;
        self.cache.validate()?;
        if self.service.operation_timeout_ms == 0 {
            return Err(AppError::config(
                "CHAT_OPERATION_TIMEOUT_MS must be at least 1",
            ));
        }
        Ok(())
    }

    /// Log a one-line summary of the effective configuration
    pub fn log_summary(&self) {
        info!(
            database.url = %self.database.url,
            database.max_connections = self.database.max_connections,
            cache.backend = if self.cache.redis_url.is_some() { "redis" } else { "memory" },
            cache.history_limit = self.cache.history_limit,
            service.operation_timeout_ms = self.service.operation_timeout_ms,
            "Configuration loaded"
        );
    }
}
