// ABOUTME: Message cache factory for configuration-based backend selection
// ABOUTME: Picks Redis when REDIS_URL is configured, otherwise the in-memory LRU backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::memory::InMemoryMessageCache;
use super::redis::RedisMessageCache;
use super::{AppendOutcome, CacheLookup, MessageCacheProvider, RemoveOutcome};
use crate::config::CacheConfig;
use crate::errors::AppResult;
use crate::models::{ChatId, Message, MessageId};

/// Unified message cache over the configured backend
#[derive(Clone)]
pub enum MessageCache {
    /// Process-local LRU backend
    Memory(InMemoryMessageCache),
    /// Shared Redis backend
    Redis(RedisMessageCache),
}

impl MessageCache {
    /// Create cache from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    pub async fn from_env() -> AppResult<Self> {
        let config = CacheConfig::from_env();
        config.validate()?;
        <Self as MessageCacheProvider>::new(config).await
    }

    /// Name of the active backend, for logs and diagnostics
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }
}

#[async_trait::async_trait]
impl MessageCacheProvider for MessageCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        if config.redis_url.is_some() {
            tracing::info!(
                history_limit = config.history_limit,
                "Initializing Redis message cache"
            );
            Ok(Self::Redis(RedisMessageCache::new(config).await?))
        } else {
            tracing::info!(
                max_chats = config.max_chats,
                history_limit = config.history_limit,
                "Initializing in-memory message cache"
            );
            Ok(Self::Memory(InMemoryMessageCache::new(config).await?))
        }
    }

    fn history_limit(&self) -> usize {
        match self {
            Self::Memory(cache) => cache.history_limit(),
            Self::Redis(cache) => cache.history_limit(),
        }
    }

    async fn get(&self, chat_id: ChatId) -> AppResult<CacheLookup> {
        match self {
            Self::Memory(cache) => cache.get(chat_id).await,
            Self::Redis(cache) => cache.get(chat_id).await,
        }
    }

    async fn replace(&self, chat_id: ChatId, messages: &[Message]) -> AppResult<()> {
        match self {
            Self::Memory(cache) => cache.replace(chat_id, messages).await,
            Self::Redis(cache) => cache.replace(chat_id, messages).await,
        }
    }

    async fn generation(&self, chat_id: ChatId) -> AppResult<u64> {
        match self {
            Self::Memory(cache) => cache.generation(chat_id).await,
            Self::Redis(cache) => cache.generation(chat_id).await,
        }
    }

    async fn replace_if_current(
        &self,
        chat_id: ChatId,
        messages: &[Message],
        generation: u64,
    ) -> AppResult<bool> {
        match self {
            Self::Memory(cache) => {
                cache
                    .replace_if_current(chat_id, messages, generation)
                    .await
            }
            Self::Redis(cache) => {
                cache
                    .replace_if_current(chat_id, messages, generation)
                    .await
            }
        }
    }

    async fn append(&self, chat_id: ChatId, message: &Message) -> AppResult<AppendOutcome> {
        match self {
            Self::Memory(cache) => cache.append(chat_id, message).await,
            Self::Redis(cache) => cache.append(chat_id, message).await,
        }
    }

    async fn remove_one(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> AppResult<RemoveOutcome> {
        match self {
            Self::Memory(cache) => cache.remove_one(chat_id, message_id).await,
            Self::Redis(cache) => cache.remove_one(chat_id, message_id).await,
        }
    }

    async fn invalidate(&self, chat_id: ChatId) -> AppResult<()> {
        match self {
            Self::Memory(cache) => cache.invalidate(chat_id).await,
            Self::Redis(cache) => cache.invalidate(chat_id).await,
        }
    }

    async fn health_check(&self) -> AppResult<()> {
        match self {
            Self::Memory(cache) => cache.health_check().await,
            Self::Redis(cache) => cache.health_check().await,
        }
    }

    async fn clear_all(&self) -> AppResult<()> {
        match self {
            Self::Memory(cache) => cache.clear_all().await,
            Self::Redis(cache) => cache.clear_all().await,
        }
    }
}
