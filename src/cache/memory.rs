// ABOUTME: In-memory message history cache with LRU eviction over chats and TTL support
// ABOUTME: Tracks per-chat write generations and runs a background cleanup task for expired histories
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{newest, AppendOutcome, CacheLookup, MessageCacheProvider, RemoveOutcome};
use crate::config::CacheConfig;
use crate::errors::AppResult;
use crate::models::{ChatId, Message, MessageId};
use lru::LruCache;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

type HistoryStore = Arc<RwLock<CacheState>>;

/// Warm history of one chat with expiration
#[derive(Debug, Clone)]
struct CachedHistory {
    messages: VecDeque<Message>,
    expires_at: Instant,
}

impl CachedHistory {
    fn new(messages: VecDeque<Message>, ttl: Duration) -> Self {
        Self {
            messages,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn touch(&mut self, ttl: Duration) {
        self.expires_at = Instant::now() + ttl;
    }
}

/// Per-chat write generations, bounded like the histories
///
/// Values come from one process-wide counter. A chat whose entry was evicted
/// reports `floor`, the largest generation evicted so far, which is never
/// below any generation the chat held.
#[derive(Debug)]
struct Generations {
    entries: LruCache<ChatId, u64>,
    counter: u64,
    floor: u64,
}

impl Generations {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            counter: 0,
            floor: 0,
        }
    }

    fn current(&self, chat_id: ChatId) -> u64 {
        self.entries.peek(&chat_id).copied().unwrap_or(self.floor)
    }

    fn bump(&mut self, chat_id: ChatId) {
        self.counter += 1;
        if let Some((evicted, generation)) = self.entries.push(chat_id, self.counter) {
            if evicted != chat_id {
                self.floor = self.floor.max(generation);
            }
        }
    }
}

/// Histories and generations behind one lock, so a conditional replace
/// compares and installs atomically
#[derive(Debug)]
struct CacheState {
    histories: LruCache<ChatId, CachedHistory>,
    generations: Generations,
}

/// In-memory message cache with LRU eviction and background cleanup
///
/// The store is shared with the cleanup task spawned in `new_with_config`.
/// The lock is only held for in-memory mutation, never across other I/O.
#[derive(Clone)]
pub struct InMemoryMessageCache {
    store: HistoryStore,
    history_limit: usize,
    ttl: Duration,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl InMemoryMessageCache {
    /// Default capacity when config specifies zero chats
    const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create new in-memory cache with optional background cleanup task
    #[must_use]
    pub fn new_with_config(config: &CacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_chats).unwrap_or(Self::DEFAULT_CACHE_CAPACITY);

        let store: HistoryStore = Arc::new(RwLock::new(CacheState {
            histories: LruCache::new(capacity),
            generations: Generations::new(capacity),
        }));

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
            let store_clone = store.clone();
            let cleanup_interval = config.cleanup_interval();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(cleanup_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::cleanup_expired(&store_clone).await;
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::debug!("Cache cleanup task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            store,
            history_limit: config.history_limit.max(1),
            ttl: config.history_ttl(),
            shutdown_tx,
        }
    }

    /// Number of chats currently held, expired ones included
    pub async fn len(&self) -> usize {
        self.store.read().await.histories.len()
    }

    /// Whether no chat is held
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.histories.is_empty()
    }

    fn history_for(&self, messages: &[Message]) -> CachedHistory {
        let kept: VecDeque<Message> = newest(messages, self.history_limit).iter().cloned().collect();
        CachedHistory::new(kept, self.ttl)
    }

    /// Remove all expired histories from cache
    async fn cleanup_expired(store: &HistoryStore) {
        let mut store_guard = store.write().await;

        let expired: Vec<ChatId> = store_guard
            .histories
            .iter()
            .filter(|(_, history)| history.is_expired())
            .map(|(chat_id, _)| *chat_id)
            .collect();

        for chat_id in &expired {
            store_guard.histories.pop(chat_id);
        }
        drop(store_guard);

        if !expired.is_empty() {
            tracing::debug!("Cleaned up {} expired chat histories", expired.len());
        }
    }
}

#[async_trait::async_trait]
impl MessageCacheProvider for InMemoryMessageCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        Ok(Self::new_with_config(&config))
    }

    fn history_limit(&self) -> usize {
        self.history_limit
    }

    async fn get(&self, chat_id: ChatId) -> AppResult<CacheLookup> {
        // LruCache::get updates recency, so even reads take the write lock
        let mut store = self.store.write().await;
        let lookup = match store.histories.get(&chat_id) {
            Some(history) if history.is_expired() => {
                store.histories.pop(&chat_id);
                CacheLookup::Miss
            }
            Some(history) => CacheLookup::Hit(history.messages.iter().cloned().collect()),
            None => CacheLookup::Miss,
        };
        drop(store);
        Ok(lookup)
    }

    async fn replace(&self, chat_id: ChatId, messages: &[Message]) -> AppResult<()> {
        let history = self.history_for(messages);

        // LruCache handles eviction automatically on push
        self.store.write().await.histories.push(chat_id, history);
        Ok(())
    }

    async fn generation(&self, chat_id: ChatId) -> AppResult<u64> {
        Ok(self.store.read().await.generations.current(chat_id))
    }

    async fn replace_if_current(
        &self,
        chat_id: ChatId,
        messages: &[Message],
        generation: u64,
    ) -> AppResult<bool> {
        let history = self.history_for(messages);

        let mut store = self.store.write().await;
        if store.generations.current(chat_id) != generation {
            return Ok(false);
        }
        store.histories.push(chat_id, history);
        drop(store);
        Ok(true)
    }

    async fn append(&self, chat_id: ChatId, message: &Message) -> AppResult<AppendOutcome> {
        let mut store = self.store.write().await;
        store.generations.bump(chat_id);

        let Some(history) = store.histories.get_mut(&chat_id) else {
            return Ok(AppendOutcome::Skipped);
        };
        if history.is_expired() {
            store.histories.pop(&chat_id);
            return Ok(AppendOutcome::Skipped);
        }
        if history
            .messages
            .back()
            .is_some_and(|tail| tail.id >= message.id)
        {
            store.histories.pop(&chat_id);
            return Ok(AppendOutcome::Invalidated);
        }

        history.messages.push_back(message.clone());
        while history.messages.len() > self.history_limit {
            history.messages.pop_front();
        }
        history.touch(self.ttl);
        drop(store);
        Ok(AppendOutcome::Appended)
    }

    async fn remove_one(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> AppResult<RemoveOutcome> {
        let mut store = self.store.write().await;
        store.generations.bump(chat_id);

        let Some(history) = store.histories.get_mut(&chat_id) else {
            return Ok(RemoveOutcome::Absent);
        };
        let Some(index) = history.messages.iter().position(|m| m.id == message_id) else {
            return Ok(RemoveOutcome::Absent);
        };
        if history.messages.len() >= self.history_limit {
            store.histories.pop(&chat_id);
            return Ok(RemoveOutcome::Invalidated);
        }
        history.messages.remove(index);
        drop(store);
        Ok(RemoveOutcome::Removed)
    }

    async fn invalidate(&self, chat_id: ChatId) -> AppResult<()> {
        let mut store = self.store.write().await;
        store.generations.bump(chat_id);
        store.histories.pop(&chat_id);
        drop(store);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        // In-memory cache is always healthy
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        // Generations are kept so in-flight rebuilds still compare correctly
        self.store.write().await.histories.clear();
        Ok(())
    }
}

impl Drop for InMemoryMessageCache {
    fn drop(&mut self) {
        // Only the last clone holding the sender actually stops the task
        if let Some(tx) = &self.shutdown_tx {
            if Arc::strong_count(tx) == 1 {
                if let Err(e) = tx.try_send(()) {
                    tracing::debug!(error = ?e, "Cache shutdown signal send failed (channel likely closed)");
                }
            }
        }
    }
}
