// ABOUTME: Conversation service composing the relational store with the message history cache
// ABOUTME: Writes go to the store first; cache upkeep is best effort and reported per call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Conversation service
//!
//! Business rules:
//! - The store is authoritative. A committed write is never undone because
//!   the cache failed; the failure is logged, an invalidation is attempted,
//!   and the resulting [`CacheSync`] is returned next to the value.
//! - Reads prefer the cache and rebuild it from the store on a miss or on
//!   any cache error. A rebuild is only installed if no write reached the
//!   chat while the store was being read.
//! - Unread state always comes from the store.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::cache::{
    AppendOutcome, CacheLookup, MessageCache, MessageCacheProvider, RemoveOutcome,
};
use crate::config::ServiceConfig;
use crate::database::ConversationStore;
use crate::deadline::Deadline;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{Chat, ChatId, ChatListing, Message, MessageId, ParticipantId, ProfileSummary};

/// State of the cache after a write went through the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSync {
    /// Cache updated in place
    Synced,
    /// Chat was not cached; nothing to update
    Skipped,
    /// Precise update was not possible; the chat was evicted
    Invalidated,
    /// Cache update and eviction both failed; reads may be stale until the entry expires
    Stale,
}

/// Value of a committed write plus what happened to the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome<T> {
    /// Result of the store write
    pub value: T,
    /// Cache state after the write
    pub cache: CacheSync,
}

/// One entry of a participant's conversation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// The chat, including its last message preview
    pub chat: Chat,
    /// The other participant
    pub peer_id: ParticipantId,
    /// The other participant's profile summary
    pub peer: ProfileSummary,
    /// Messages the listing participant has not read yet
    pub unread_count: u64,
    /// Whether `unread_count` is non-zero
    pub has_unread: bool,
}

impl From<ChatListing> for ConversationSummary {
    fn from(listing: ChatListing) -> Self {
        Self {
            has_unread: listing.unread_count > 0,
            chat: listing.chat,
            peer_id: listing.peer_id,
            peer: listing.peer,
            unread_count: listing.unread_count,
        }
    }
}

/// Facade over the conversation store and the message cache
#[derive(Clone)]
pub struct ConversationService<C = MessageCache> {
    store: ConversationStore,
    cache: C,
    operation_timeout: Duration,
}

impl<C: MessageCacheProvider> ConversationService<C> {
    /// Compose `store` and `cache`
    #[must_use]
    pub fn new(store: ConversationStore, cache: C, config: &ServiceConfig) -> Self {
        Self {
            store,
            cache,
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Deadline using the configured default operation timeout
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.operation_timeout)
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// The underlying cache
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Get the chat between `a` and `b`, creating it if needed
    ///
    /// Concurrent callers for the same pair all receive the same id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `a == b`, or a store error
    #[instrument(skip_all, fields(a = %a, b = %b))]
    pub async fn create_conversation(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<ChatId> {
        if let Some(chat) = self.store.find_chat(a, b, deadline).await? {
            return Ok(chat.id);
        }
        match self.store.create_chat(a, b, deadline).await {
            Ok(chat_id) => Ok(chat_id),
            Err(e) if e.code == ErrorCode::ResourceAlreadyExists => {
                debug!("Lost creation race, reading the winning chat");
                self.store
                    .find_chat(a, b, deadline)
                    .await?
                    .map(|chat| chat.id)
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Post a message and append it to the cached history
    ///
    /// # Errors
    ///
    /// Returns store errors only; cache failures are reported in the outcome
    #[instrument(skip_all, fields(chat_id = %chat_id, sender_id = %sender_id))]
    pub async fn send(
        &self,
        chat_id: ChatId,
        sender_id: ParticipantId,
        content: &str,
        deadline: Deadline,
    ) -> AppResult<WriteOutcome<Message>> {
        let message = self
            .store
            .post_message(chat_id, sender_id, content, deadline)
            .await?;

        let cache = match deadline
            .run("cache_append", self.cache.append(chat_id, &message))
            .await
        {
            Ok(AppendOutcome::Appended) => CacheSync::Synced,
            Ok(AppendOutcome::Skipped) => CacheSync::Skipped,
            Ok(AppendOutcome::Invalidated) => {
                debug!(message_id = %message.id, "Out-of-order append evicted cached history");
                CacheSync::Invalidated
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Cache append failed after send");
                self.invalidate_after_failure(chat_id, deadline).await
            }
        };

        Ok(WriteOutcome {
            value: message,
            cache,
        })
    }

    /// Delete a message and drop it from the cached history
    ///
    /// Returns the chat's new preview.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the message is not part of the chat
    #[instrument(skip_all, fields(chat_id = %chat_id, message_id = %message_id))]
    pub async fn delete(
        &self,
        message_id: MessageId,
        chat_id: ChatId,
        deadline: Deadline,
    ) -> AppResult<WriteOutcome<String>> {
        let preview = self
            .store
            .delete_message(chat_id, message_id, deadline)
            .await?;

        let cache = match deadline
            .run("cache_remove_one", self.cache.remove_one(chat_id, message_id))
            .await
        {
            Ok(RemoveOutcome::Removed) => CacheSync::Synced,
            Ok(RemoveOutcome::Absent) => CacheSync::Skipped,
            Ok(RemoveOutcome::Invalidated) => {
                debug!("Removal from a full window evicted cached history");
                CacheSync::Invalidated
            }
            Err(e) => {
                warn!(error = %e, "Cache removal failed after delete");
                self.invalidate_after_failure(chat_id, deadline).await
            }
        };

        Ok(WriteOutcome {
            value: preview,
            cache,
        })
    }

    /// Delete the chat between `a` and `b` and evict its history
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the pair has no chat
    #[instrument(skip_all, fields(a = %a, b = %b))]
    pub async fn delete_conversation(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<WriteOutcome<ChatId>> {
        let chat_id = self.store.delete_chat(a, b, deadline).await?;
        let cache = self.invalidate(chat_id, deadline).await;
        Ok(WriteOutcome {
            value: chat_id,
            cache,
        })
    }

    /// Conversations of `participant`, most recently active first
    ///
    /// # Errors
    ///
    /// Returns store or profile directory errors
    #[instrument(skip_all, fields(participant = %participant))]
    pub async fn conversations(
        &self,
        participant: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<Vec<ConversationSummary>> {
        let listings = self.store.list_chats_for(participant, deadline).await?;
        Ok(listings.into_iter().map(ConversationSummary::from).collect())
    }

    /// Most recent messages of a chat, oldest first, at most the history limit
    ///
    /// # Errors
    ///
    /// Returns store errors; cache failures fall back to the store
    #[instrument(skip_all, fields(chat_id = %chat_id))]
    pub async fn history(&self, chat_id: ChatId, deadline: Deadline) -> AppResult<Vec<Message>> {
        let limit = self.cache.history_limit();

        match deadline.run("cache_get", self.cache.get(chat_id)).await {
            Ok(CacheLookup::Hit(mut messages)) => {
                if messages.len() > limit {
                    messages = messages.split_off(messages.len() - limit);
                }
                return Ok(messages);
            }
            Ok(CacheLookup::Miss) => debug!("History cache miss"),
            Err(e) => warn!(error = %e, "History cache read failed, using store"),
        }

        // Read before the store so any write landing during the rebuild is detected
        let generation = match deadline
            .run("cache_generation", self.cache.generation(chat_id))
            .await
        {
            Ok(generation) => Some(generation),
            Err(e) => {
                warn!(error = %e, "Cache generation read failed, not warming");
                None
            }
        };

        let messages = self.store.recent_messages(chat_id, limit, deadline).await?;
        if let Some(generation) = generation {
            match deadline
                .run(
                    "cache_replace",
                    self.cache.replace_if_current(chat_id, &messages, generation),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => debug!("Chat written during rebuild, leaving cache cold"),
                Err(e) => warn!(error = %e, "Failed to warm history cache"),
            }
        }
        Ok(messages)
    }

    /// Every message of a chat in creation order, read from the store
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the chat does not exist
    #[instrument(skip_all, fields(chat_id = %chat_id))]
    pub async fn full_history(
        &self,
        chat_id: ChatId,
        deadline: Deadline,
    ) -> AppResult<Vec<Message>> {
        self.store.list_messages(chat_id, deadline).await
    }

    /// Mark everything addressed to `reader_id` as read
    ///
    /// Returns how many messages changed state. Cached statuses are evicted
    /// rather than rewritten.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if `reader_id` is not a participant
    #[instrument(skip_all, fields(chat_id = %chat_id, reader_id = %reader_id))]
    pub async fn mark_read(
        &self,
        chat_id: ChatId,
        reader_id: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<WriteOutcome<u64>> {
        let updated = self
            .store
            .mark_all_read(chat_id, reader_id, deadline)
            .await?;
        let cache = self.invalidate(chat_id, deadline).await;
        Ok(WriteOutcome {
            value: updated,
            cache,
        })
    }

    /// Number of messages in a chat still unread by `reader_id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if `reader_id` is not a participant
    #[instrument(skip_all, fields(chat_id = %chat_id, reader_id = %reader_id))]
    pub async fn unread_count(
        &self,
        chat_id: ChatId,
        reader_id: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<u64> {
        self.store.unread_count(chat_id, reader_id, deadline).await
    }

    async fn invalidate(&self, chat_id: ChatId, deadline: Deadline) -> CacheSync {
        match deadline
            .run("cache_invalidate", self.cache.invalidate(chat_id))
            .await
        {
            Ok(()) => CacheSync::Synced,
            Err(e) => {
                log_stale(chat_id, &e);
                CacheSync::Stale
            }
        }
    }

    async fn invalidate_after_failure(&self, chat_id: ChatId, deadline: Deadline) -> CacheSync {
        match deadline
            .run("cache_invalidate", self.cache.invalidate(chat_id))
            .await
        {
            Ok(()) => CacheSync::Invalidated,
            Err(e) => {
                log_stale(chat_id, &e);
                CacheSync::Stale
            }
        }
    }
}

fn log_stale(chat_id: ChatId, e: &AppError) {
    error!(chat_id = %chat_id, error = %e, "Cache invalidation failed, history may be stale");
}
