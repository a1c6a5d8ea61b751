// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, profile seeding, and service construction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `matchbox_chat`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::Result;
use matchbox_chat::{
    cache::{memory::InMemoryMessageCache, MessageCacheProvider},
    config::{CacheConfig, DatabaseConfig, ServiceConfig},
    database::{ConversationStore, Database, SqliteProfileDirectory},
    deadline::Deadline,
    models::{ParticipantId, ProfileSummary},
    services::ConversationService,
};
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        // Another test binary helper may already have installed a subscriber
        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Generous deadline for operations that are not testing timeouts
pub fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(10))
}

/// In-memory cache configuration without the background sweeper
pub fn test_cache_config() -> CacheConfig {
    CacheConfig {
        enable_background_cleanup: false, // Disable in tests to avoid tokio runtime conflicts
        ..CacheConfig::default()
    }
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::connect(&DatabaseConfig::in_memory()).await?)
}

/// File-backed database in `dir`, for tests that need real concurrent writers
pub async fn create_file_database(dir: &std::path::Path) -> Result<Database> {
    init_test_logging();
    let config = DatabaseConfig {
        url: format!("sqlite:{}", dir.join("matchbox.db").display()),
        max_connections: 8,
        ..DatabaseConfig::default()
    };
    Ok(Database::connect(&config).await?)
}

/// Store over `database` with a `SQLite` profile directory
pub fn create_store(database: &Database) -> ConversationStore {
    let profiles = SqliteProfileDirectory::new(database.pool().clone());
    ConversationStore::new(database.pool().clone(), Arc::new(profiles), 5)
}

/// Service over `database` with the given cache
pub fn create_service<C: MessageCacheProvider>(database: &Database, cache: C) -> ConversationService<C> {
    ConversationService::new(create_store(database), cache, &ServiceConfig::default())
}

/// Service over a fresh in-memory database and in-memory cache
pub async fn create_test_service() -> Result<(Database, ConversationService<InMemoryMessageCache>)> {
    let database = create_test_database().await?;
    let cache = InMemoryMessageCache::new_with_config(&test_cache_config());
    let service = create_service(&database, cache);
    Ok((database, service))
}

/// Seed a profile summary for `participant`
pub async fn seed_profile(database: &Database, participant: i64, first_name: &str) -> Result<()> {
    let profiles = SqliteProfileDirectory::new(database.pool().clone());
    profiles
        .upsert_summary(
            ParticipantId(participant),
            &ProfileSummary {
                first_name: first_name.to_owned(),
                last_name: "Tester".to_owned(),
                description: format!("{first_name}'s profile"),
                avatar_path: format!("avatars/{participant}.png"),
            },
        )
        .await?;
    Ok(())
}
