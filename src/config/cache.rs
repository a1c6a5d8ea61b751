// ABOUTME: Message cache configuration types for the in-memory and Redis backends
// ABOUTME: Handles backend selection, history bound, TTLs, and Redis connection retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::env_parse_or;
use crate::constants::{cache, redis};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Message cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; when set the Redis backend is used instead of the in-memory one
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Maximum number of chats kept by the in-memory backend
    pub max_chats: usize,
    /// Most recent messages kept per chat
    pub history_limit: usize,
    /// Cached history TTL in seconds
    pub history_ttl_secs: u64,
    /// Cleanup interval for expired in-memory entries, in seconds
    pub cleanup_interval_secs: u64,
    /// Enable background cleanup task (should be false in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
    /// Redis connection configuration
    #[serde(default)]
    pub redis_connection: RedisConnectionConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_chats: cache::DEFAULT_CACHE_MAX_CHATS,
            history_limit: cache::MESSAGE_HISTORY_LIMIT,
            history_ttl_secs: cache::TTL_HISTORY_SECS,
            cleanup_interval_secs: cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            // Default to enabled - production code should use background cleanup
            // Tests can explicitly disable by setting to false
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Load cache configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            max_chats: env_parse_or("CACHE_MAX_CHATS", cache::DEFAULT_CACHE_MAX_CHATS),
            history_limit: env_parse_or("CACHE_HISTORY_LIMIT", cache::MESSAGE_HISTORY_LIMIT),
            history_ttl_secs: env_parse_or("CACHE_HISTORY_TTL_SECS", cache::TTL_HISTORY_SECS),
            cleanup_interval_secs: env_parse_or(
                "CACHE_CLEANUP_INTERVAL_SECS",
                cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            ),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::from_env(),
        }
    }

    /// Cached history TTL
    #[must_use]
    pub const fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_ttl_secs)
    }

    /// Cleanup interval for expired in-memory entries
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Reject values that can never work
    ///
    /// # Errors
    ///
    /// Returns a config error if the history bound or TTL is zero
    pub fn validate(&self) -> AppResult<()> {
        if self.history_limit == 0 {
            return Err(AppError::config("CACHE_HISTORY_LIMIT must be at least 1"));
        }
        if self.history_ttl_secs == 0 {
            return Err(AppError::config("CACHE_HISTORY_TTL_SECS must be at least 1"));
        }
        if self.redis_url.is_none() && self.max_chats == 0 {
            return Err(AppError::config("CACHE_MAX_CHATS must be at least 1"));
        }
        Ok(())
    }
}

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis::RECONNECTION_RETRIES,
            retry_exponent_base: redis::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis::INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            connection_timeout_secs: env_parse_or(
                "REDIS_CONNECTION_TIMEOUT_SECS",
                redis::CONNECTION_TIMEOUT_SECS,
            ),
            response_timeout_secs: env_parse_or(
                "REDIS_RESPONSE_TIMEOUT_SECS",
                redis::RESPONSE_TIMEOUT_SECS,
            ),
            reconnection_retries: env_parse_or(
                "REDIS_RECONNECTION_RETRIES",
                redis::RECONNECTION_RETRIES,
            ),
            retry_exponent_base: env_parse_or(
                "REDIS_RETRY_EXPONENT_BASE",
                redis::RETRY_EXPONENT_BASE,
            ),
            max_retry_delay_ms: env_parse_or("REDIS_MAX_RETRY_DELAY_MS", redis::MAX_RETRY_DELAY_MS),
            initial_connection_retries: env_parse_or(
                "REDIS_INITIAL_CONNECTION_RETRIES",
                redis::INITIAL_CONNECTION_RETRIES,
            ),
            initial_retry_delay_ms: env_parse_or(
                "REDIS_INITIAL_RETRY_DELAY_MS",
                redis::INITIAL_RETRY_DELAY_MS,
            ),
        }
    }
}
