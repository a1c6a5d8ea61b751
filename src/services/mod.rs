// ABOUTME: Domain service layer composing the store, cache, and profile directory
// ABOUTME: Provides the conversation facade and its bootstrap from server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Domain service layer
//!
//! [`ConversationService`] is the entry point for callers. [`ServiceHandle`]
//! wires it up from a [`ServerConfig`]: database pool and migrations, profile
//! directory, and the configured cache backend.

/// Conversation facade over the store and the message cache
pub mod conversations;

pub use conversations::{CacheSync, ConversationService, ConversationSummary, WriteOutcome};

use std::sync::Arc;

use tracing::info;

use crate::cache::{MessageCache, MessageCacheProvider};
use crate::config::ServerConfig;
use crate::database::{ConversationStore, Database, SqliteProfileDirectory};
use crate::errors::AppResult;

/// Fully wired service and the resources it owns
#[derive(Clone)]
pub struct ServiceHandle {
    /// Shared database
    pub database: Database,
    /// Profile directory over the same database
    pub profiles: SqliteProfileDirectory,
    /// Conversation facade
    pub conversations: ConversationService<MessageCache>,
}

impl ServiceHandle {
    /// Connect every backend named in `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a backend cannot
    /// be reached
    pub async fn bootstrap(config: &ServerConfig) -> AppResult<Self> {
        config.validate()?;
        config.log_summary();

        let database = Database::connect(&config.database).await?;
        let profiles = SqliteProfileDirectory::new(database.pool().clone());
        let store = ConversationStore::new(
            database.pool().clone(),
            Arc::new(profiles.clone()),
            config.database.transaction_retries,
        );
        let cache = MessageCache::new(config.cache.clone()).await?;

        info!(
            cache_backend = cache.backend_name(),
            history_limit = cache.history_limit(),
            "Conversation service ready"
        );

        Ok(Self {
            database,
            profiles,
            conversations: ConversationService::new(store, cache, &config.service),
        })
    }

    /// Bootstrap from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is invalid or a backend cannot be
    /// reached
    pub async fn from_env() -> AppResult<Self> {
        let config = ServerConfig::from_env()?;
        Self::bootstrap(&config).await
    }
}
