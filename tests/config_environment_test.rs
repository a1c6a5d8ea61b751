// ABOUTME: Unit tests for environment-driven configuration loading
// ABOUTME: Validates defaults, environment overrides, backend selection, and validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use matchbox_chat::config::{CacheConfig, DatabaseConfig, ServerConfig, ServiceConfig};
use matchbox_chat::errors::ErrorCode;
use serial_test::serial;
use std::env;
use std::time::Duration;

const MANAGED_VARS: &[&str] = &[
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "DATABASE_TRANSACTION_RETRIES",
    "REDIS_URL",
    "CACHE_HISTORY_LIMIT",
    "CACHE_HISTORY_TTL_SECS",
    "CACHE_MAX_CHATS",
    "CHAT_OPERATION_TIMEOUT_MS",
];

fn clear_env() {
    for key in MANAGED_VARS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.database.url, "sqlite:./data/matchbox.db");
    assert_eq!(config.database.transaction_retries, 5);
    assert!(config.cache.redis_url.is_none());
    assert_eq!(config.cache.history_limit, 50);
    assert_eq!(config.cache.history_ttl(), Duration::from_secs(3_600));
    assert_eq!(
        config.service.operation_timeout(),
        Duration::from_millis(5_000)
    );
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("CACHE_HISTORY_LIMIT", "20");
    env::set_var("CACHE_HISTORY_TTL_SECS", "90");
    env::set_var("CHAT_OPERATION_TIMEOUT_MS", "250");
    env::set_var("REDIS_URL", "redis://127.0.0.1:6379");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert!(config.database.is_memory());
    assert_eq!(config.cache.history_limit, 20);
    assert_eq!(config.cache.history_ttl_secs, 90);
    assert_eq!(config.service.operation_timeout_ms, 250);
    assert_eq!(
        config.cache.redis_url.as_deref(),
        Some("redis://127.0.0.1:6379")
    );
}

#[test]
#[serial]
fn test_unparsable_values_fall_back_to_defaults() {
    clear_env();
    env::set_var("CACHE_HISTORY_LIMIT", "lots");
    env::set_var("REDIS_URL", "");

    let cache = CacheConfig::from_env();
    clear_env();

    assert_eq!(cache.history_limit, 50);
    assert!(cache.redis_url.is_none());
}

#[test]
#[serial]
fn test_invalid_environment_is_rejected() {
    clear_env();
    env::set_var("CACHE_HISTORY_LIMIT", "0");
    let err = ServerConfig::from_env().unwrap_err();
    clear_env();

    assert_eq!(err.code, ErrorCode::ConfigError);
}

#[test]
fn test_database_validation() {
    assert!(DatabaseConfig::in_memory().validate().is_ok());

    let postgres = DatabaseConfig {
        url: "postgres://localhost/chat".to_owned(),
        ..DatabaseConfig::default()
    };
    assert_eq!(
        postgres.validate().unwrap_err().code,
        ErrorCode::ConfigError
    );

    let no_retries = DatabaseConfig {
        transaction_retries: 0,
        ..DatabaseConfig::in_memory()
    };
    assert!(no_retries.validate().is_err());
}

#[test]
fn test_cache_validation() {
    assert!(CacheConfig::default().validate().is_ok());

    let zero_ttl = CacheConfig {
        history_ttl_secs: 0,
        ..CacheConfig::default()
    };
    assert!(zero_ttl.validate().is_err());

    // Capacity only matters for the in-memory backend
    let redis_backed = CacheConfig {
        redis_url: Some("redis://127.0.0.1:6379".to_owned()),
        max_chats: 0,
        ..CacheConfig::default()
    };
    assert!(redis_backed.validate().is_ok());
}

#[test]
fn test_zero_operation_timeout_is_rejected() {
    let config = ServerConfig {
        database: DatabaseConfig::in_memory(),
        service: ServiceConfig {
            operation_timeout_ms: 0,
        },
        ..ServerConfig::default()
    };
    assert_eq!(config.validate().unwrap_err().code, ErrorCode::ConfigError);
}
