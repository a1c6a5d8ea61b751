// ABOUTME: Bounded per-chat message history cache with pluggable backends
// ABOUTME: Defines the provider trait, lookup outcomes, and the hash-tagged key layout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Message history cache
//!
//! Each chat maps to an ordered list holding at most `history_limit` of its
//! most recent messages (oldest first) plus a presence marker. The marker is
//! what distinguishes a warm chat with no messages from a cold chat, so an
//! empty hit never has to be recomputed from the store.
//!
//! The cache is never authoritative. Appends to a cold chat are skipped,
//! since a partial list must not pass for a complete one, and an append that
//! is not newer than the cached tail evicts the chat instead of reordering.
//!
//! Every write (`append`, `remove_one`, `invalidate`) advances a per-chat
//! generation, warm or cold. A reader rebuilding a cold chat records the
//! generation before reading the store and installs its snapshot with
//! [`MessageCacheProvider::replace_if_current`], which refuses the snapshot
//! if any write reached the chat in between.

/// Backend selection from configuration
pub mod factory;
/// In-memory backend with LRU eviction over chats
pub mod memory;
/// Redis backend using one native list per chat
pub mod redis;

pub use factory::MessageCache;

use std::fmt;

use crate::config::CacheConfig;
use crate::constants::cache::CACHE_KEY_PREFIX;
use crate::errors::AppResult;
use crate::models::{ChatId, Message, MessageId};

/// Message cache provider trait for pluggable backend implementations
#[async_trait::async_trait]
pub trait MessageCacheProvider: Send + Sync {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Maximum number of messages kept per chat
    fn history_limit(&self) -> usize;

    /// Cached history of `chat_id`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or an entry cannot be decoded
    async fn get(&self, chat_id: ChatId) -> AppResult<CacheLookup>;

    /// Overwrite the history of `chat_id` with the newest `history_limit`
    /// entries of `messages` and mark the chat warm
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    async fn replace(&self, chat_id: ChatId, messages: &[Message]) -> AppResult<()>;

    /// Current write generation of `chat_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails
    async fn generation(&self, chat_id: ChatId) -> AppResult<u64>;

    /// Like [`Self::replace`], but only if the generation of `chat_id` still
    /// equals `generation`; returns whether the history was installed
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    async fn replace_if_current(
        &self,
        chat_id: ChatId,
        messages: &[Message],
        generation: u64,
    ) -> AppResult<bool>;

    /// Push `message` onto a warm history, trimming from the head
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    async fn append(&self, chat_id: ChatId, message: &Message) -> AppResult<AppendOutcome>;

    /// Remove the entry for `message_id`
    ///
    /// A full window cannot be backfilled with the next older message, so
    /// removing from one evicts the chat instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    async fn remove_one(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> AppResult<RemoveOutcome>;

    /// Evict the history of `chat_id` and its presence marker
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails
    async fn invalidate(&self, chat_id: ChatId) -> AppResult<()>;

    /// Verify cache backend is healthy
    ///
    /// # Errors
    ///
    /// Returns an error if health check fails
    async fn health_check(&self) -> AppResult<()>;

    /// Clear all cache entries (for testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if clear operation fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Result of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Chat is warm; the history may be empty
    Hit(Vec<Message>),
    /// Chat is cold and must be loaded from the store
    Miss,
}

impl CacheLookup {
    /// Whether the chat was warm
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Result of appending to a chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Message pushed onto the warm history
    Appended,
    /// Chat was cold; nothing written
    Skipped,
    /// Message was not newer than the cached tail; the chat was evicted
    Invalidated,
}

/// Result of removing one message from a chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Entry removed from a partially filled history
    Removed,
    /// Chat cold or entry not cached; nothing written
    Absent,
    /// Entry sat in a full window; the chat was evicted
    Invalidated,
}

/// Cache key for one chat's history
///
/// Renders as `{chat:<id>}` so that the list and its marker share a Redis
/// cluster hash slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    /// Chat the history belongs to
    pub chat_id: ChatId,
}

impl HistoryKey {
    /// Key for `chat_id`
    #[must_use]
    pub const fn new(chat_id: ChatId) -> Self {
        Self { chat_id }
    }

    /// Namespaced key of the message list
    #[must_use]
    pub fn messages_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{self}:messages")
    }

    /// Namespaced key of the presence marker
    #[must_use]
    pub fn marker_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{self}:warm")
    }

    /// Namespaced key of the write generation counter
    #[must_use]
    pub fn generation_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{self}:gen")
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{chat:{}}}", self.chat_id)
    }
}

/// The newest `limit` entries of `messages`, keeping their order
pub(crate) fn newest(messages: &[Message], limit: usize) -> &[Message] {
    &messages[messages.len().saturating_sub(limit)..]
}
