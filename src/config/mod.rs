// ABOUTME: Configuration management module for the conversation store and its backends
// ABOUTME: Environment-only configuration for database, cache, service deadlines, and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat
//! Configuration module for Matchbox Chat
//!
//! Configuration is read exclusively from environment variables. Each section
//! exposes `from_env()` and falls back to the defaults in
//! [`crate::constants`] when a variable is unset or unparsable; `validate()`
//! rejects values that can never work.
//!
//! - **Database**: `SQLite` location, pool sizing, transaction retries
//! - **Cache**: backend selection, history bound, TTLs, Redis connection
//! - **Environment**: aggregated [`ServerConfig`] and service deadlines

use std::env;
use std::str::FromStr;

/// Message cache and Redis connection configuration
pub mod cache;
/// Relational store configuration
pub mod database;
/// Aggregated server configuration loaded from the environment
pub mod environment;

pub use cache::{CacheConfig, RedisConnectionConfig};
pub use database::DatabaseConfig;
pub use environment::{ServerConfig, ServiceConfig};

/// Read `key` and parse it, falling back to `default` when unset or invalid
pub(crate) fn env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
