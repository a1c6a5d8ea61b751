// ABOUTME: Authoritative chat and message persistence with transactional preview maintenance
// ABOUTME: Canonical pair uniqueness, per-message read state, and deadline-bounded operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Conversation store
//!
//! Every operation takes a [`Deadline`]. Multi-statement writes run inside a
//! [`SqliteTransactionGuard`] whose first statement is always a write, so the
//! connection holds the `SQLite` write lock from the start and never has to
//! upgrade a read lock. Lock contention is retried with backoff; expiry of the
//! deadline drops the in-flight transaction, which rolls it back.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::transactions::{retry_transaction, SqliteTransactionGuard};
use crate::deadline::Deadline;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{
    CanonicalPair, Chat, ChatId, ChatListing, Message, MessageId, MessageStatus, ParticipantId,
};
use crate::profiles::ProfileDirectory;

const CHAT_COLUMNS: &str =
    "id, participant_a, participant_b, last_message_preview, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, content, status, created_at";

/// System of record for chats and messages
#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
    profiles: Arc<dyn ProfileDirectory>,
    transaction_retries: u32,
}

impl ConversationStore {
    /// Create a new store over `pool`, enriching listings from `profiles`
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        profiles: Arc<dyn ProfileDirectory>,
        transaction_retries: u32,
    ) -> Self {
        Self {
            pool,
            profiles,
            transaction_retries: transaction_retries.max(1),
        }
    }

    /// Get a reference to the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run<F, Fut, T>(&self, deadline: Deadline, operation: &'static str, f: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        deadline
            .run(operation, retry_transaction(f, self.transaction_retries))
            .await
    }

    // ========================================================================
    // Chat Operations
    // ========================================================================

    /// Create the chat between `a` and `b`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `a == b` and `ResourceAlreadyExists` if the
    /// pair already has a chat
    pub async fn create_chat(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<ChatId> {
        let pair = CanonicalPair::new(a, b)?;
        self.run(deadline, "create_chat", || self.try_create_chat(pair))
            .await
    }

    async fn try_create_chat(&self, pair: CanonicalPair) -> AppResult<ChatId> {
        let now = timestamp_now();
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO chats (participant_a, participant_b, last_message_preview, created_at, updated_at)
            VALUES ($1, $2, '', $3, $3)
            RETURNING id
            ",
        )
        .bind(pair.low().get())
        .bind(pair.high().get())
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let error = AppError::from(e);
            if error.code == ErrorCode::ResourceAlreadyExists {
                AppError::already_exists(format!("Chat between {} and {}", pair.low(), pair.high()))
            } else {
                error
            }
        })?;

        debug!(chat_id = id, low = %pair.low(), high = %pair.high(), "Chat created");
        Ok(ChatId(id))
    }

    /// Find the chat between `a` and `b`, in either argument order
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `a == b`, or a backend error
    pub async fn find_chat(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<Option<Chat>> {
        let pair = CanonicalPair::new(a, b)?;
        self.run(deadline, "find_chat", || async move {
            let query = format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE participant_a = $1 AND participant_b = $2"
            );
            let row = sqlx::query(&query)
                .bind(pair.low().get())
                .bind(pair.high().get())
                .fetch_optional(&self.pool)
                .await?;
            row.as_ref().map(row_to_chat).transpose()
        })
        .await
    }

    /// Get a chat by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the chat does not exist
    pub async fn get_chat(&self, chat_id: ChatId, deadline: Deadline) -> AppResult<Chat> {
        self.run(deadline, "get_chat", || self.fetch_chat(chat_id))
            .await
    }

    async fn fetch_chat(&self, chat_id: ChatId) -> AppResult<Chat> {
        let query = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(chat_id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| chat_not_found(chat_id))?;
        row_to_chat(&row)
    }

    /// Participants of a chat
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the chat does not exist
    pub async fn get_participants(
        &self,
        chat_id: ChatId,
        deadline: Deadline,
    ) -> AppResult<CanonicalPair> {
        self.run(deadline, "get_participants", || self.fetch_participants(chat_id))
            .await
    }

    async fn fetch_participants(&self, chat_id: ChatId) -> AppResult<CanonicalPair> {
        let row = sqlx::query("SELECT participant_a, participant_b FROM chats WHERE id = $1")
            .bind(chat_id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| chat_not_found(chat_id))?;
        row_to_pair(&row)
    }

    /// Chats `participant` takes part in, most recently active first
    ///
    /// Each listing carries the peer's profile summary and the number of
    /// messages still unread by `participant`. Any profile directory failure
    /// aborts the whole listing.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if a peer has no profile, `Unavailable` if
    /// the directory or the database fails
    pub async fn list_chats_for(
        &self,
        participant: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<Vec<ChatListing>> {
        deadline
            .run("list_chats_for", async {
                let rows = retry_transaction(
                    || self.fetch_chats_with_unread(participant),
                    self.transaction_retries,
                )
                .await?;

                let mut listings = Vec::with_capacity(rows.len());
                for (chat, unread_count) in rows {
                    let peer_id = chat.participants.other(participant).ok_or_else(|| {
                        AppError::internal(format!(
                            "Chat {} listed for non-participant {participant}",
                            chat.id
                        ))
                    })?;
                    let peer = self
                        .profiles
                        .get_summary(peer_id)
                        .await
                        .map_err(directory_error)?;
                    listings.push(ChatListing {
                        chat,
                        peer_id,
                        peer,
                        unread_count,
                    });
                }
                Ok(listings)
            })
            .await
    }

    async fn fetch_chats_with_unread(
        &self,
        participant: ParticipantId,
    ) -> AppResult<Vec<(Chat, u64)>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.participant_a, c.participant_b, c.last_message_preview,
                   c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM messages m
                    WHERE m.chat_id = c.id AND m.status = 'unread' AND m.sender_id != $1) AS unread_count
            FROM chats c
            WHERE c.participant_a = $1 OR c.participant_b = $1
            ORDER BY c.updated_at DESC, c.id DESC
            ",
        )
        .bind(participant.get())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> AppResult<(Chat, u64)> {
                let unread: i64 = row.try_get("unread_count")?;
                Ok((row_to_chat(row)?, unread.max(0) as u64))
            })
            .collect()
    }

    /// Delete the chat between `a` and `b` together with its messages
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the pair has no chat
    pub async fn delete_chat(
        &self,
        a: ParticipantId,
        b: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<ChatId> {
        let pair = CanonicalPair::new(a, b)?;
        self.run(deadline, "delete_chat", || self.try_delete_chat(pair))
            .await
    }

    async fn try_delete_chat(&self, pair: CanonicalPair) -> AppResult<ChatId> {
        let mut guard = SqliteTransactionGuard::begin(&self.pool).await?;

        let removed = sqlx::query(
            r"
            DELETE FROM messages
            WHERE chat_id IN (SELECT id FROM chats WHERE participant_a = $1 AND participant_b = $2)
            ",
        )
        .bind(pair.low().get())
        .bind(pair.high().get())
        .execute(guard.executor()?)
        .await?
        .rows_affected();

        let id: Option<i64> = sqlx::query_scalar(
            "DELETE FROM chats WHERE participant_a = $1 AND participant_b = $2 RETURNING id",
        )
        .bind(pair.low().get())
        .bind(pair.high().get())
        .fetch_optional(guard.executor()?)
        .await?;

        let Some(id) = id else {
            return Err(AppError::not_found(format!(
                "Chat between {} and {}",
                pair.low(),
                pair.high()
            )));
        };

        guard.commit().await?;
        debug!(chat_id = id, messages_removed = removed, "Chat deleted");
        Ok(ChatId(id))
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Post a message and make it the chat preview
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank content, `ResourceNotFound` for a
    /// missing chat and `InvalidReference` if `sender_id` is not a participant
    pub async fn post_message(
        &self,
        chat_id: ChatId,
        sender_id: ParticipantId,
        content: &str,
        deadline: Deadline,
    ) -> AppResult<Message> {
        if content.trim().is_empty() {
            return Err(AppError::invalid_input("Message content must not be empty"));
        }
        self.run(deadline, "post_message", || {
            self.try_post_message(chat_id, sender_id, content)
        })
        .await
    }

    async fn try_post_message(
        &self,
        chat_id: ChatId,
        sender_id: ParticipantId,
        content: &str,
    ) -> AppResult<Message> {
        let created_at = Utc::now().trunc_subsecs(6);
        let now = format_timestamp(created_at);
        let mut guard = SqliteTransactionGuard::begin(&self.pool).await?;

        let row = sqlx::query(
            r"
            UPDATE chats SET last_message_preview = $1, updated_at = $2
            WHERE id = $3
            RETURNING participant_a, participant_b
            ",
        )
        .bind(content)
        .bind(&now)
        .bind(chat_id.get())
        .fetch_optional(guard.executor()?)
        .await?
        .ok_or_else(|| chat_not_found(chat_id))?;

        if !row_to_pair(&row)?.contains(sender_id) {
            return Err(AppError::invalid_reference(format!(
                "Participant {sender_id} is not part of chat {chat_id}"
            )));
        }

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO messages (chat_id, sender_id, content, status, created_at)
            VALUES ($1, $2, $3, 'unread', $4)
            RETURNING id
            ",
        )
        .bind(chat_id.get())
        .bind(sender_id.get())
        .bind(content)
        .bind(&now)
        .fetch_one(guard.executor()?)
        .await?;

        guard.commit().await?;

        Ok(Message {
            id: MessageId(id),
            chat_id,
            sender_id,
            content: content.to_owned(),
            status: MessageStatus::Unread,
            created_at,
        })
    }

    /// Delete a message and recompute the chat preview
    ///
    /// Returns the new preview: the content of the most recent remaining
    /// message, or an empty string if none is left.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if `message_id` is not a message of `chat_id`
    pub async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        deadline: Deadline,
    ) -> AppResult<String> {
        self.run(deadline, "delete_message", || {
            self.try_delete_message(chat_id, message_id)
        })
        .await
    }

    async fn try_delete_message(&self, chat_id: ChatId, message_id: MessageId) -> AppResult<String> {
        let mut guard = SqliteTransactionGuard::begin(&self.pool).await?;

        let deleted = sqlx::query("DELETE FROM messages WHERE id = $1 AND chat_id = $2")
            .bind(message_id.get())
            .bind(chat_id.get())
            .execute(guard.executor()?)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::not_found(format!(
                "Message {message_id} in chat {chat_id}"
            )));
        }

        let preview: String = sqlx::query_scalar(
            r"
            UPDATE chats SET last_message_preview = COALESCE(
                (SELECT content FROM messages WHERE chat_id = $1 ORDER BY id DESC LIMIT 1), ''
            )
            WHERE id = $1
            RETURNING last_message_preview
            ",
        )
        .bind(chat_id.get())
        .fetch_one(guard.executor()?)
        .await?;

        guard.commit().await?;
        Ok(preview)
    }

    /// All messages of a chat in creation order
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the chat does not exist
    pub async fn list_messages(
        &self,
        chat_id: ChatId,
        deadline: Deadline,
    ) -> AppResult<Vec<Message>> {
        self.run(deadline, "list_messages", || async move {
            self.ensure_chat_exists(chat_id).await?;
            let query =
                format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = $1 ORDER BY id ASC");
            let rows = sqlx::query(&query)
                .bind(chat_id.get())
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_message).collect()
        })
        .await
    }

    /// The `limit` most recent messages of a chat, oldest first
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the chat does not exist
    pub async fn recent_messages(
        &self,
        chat_id: ChatId,
        limit: usize,
        deadline: Deadline,
    ) -> AppResult<Vec<Message>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(deadline, "recent_messages", || async move {
            self.ensure_chat_exists(chat_id).await?;
            let query = format!(
                r"
                SELECT {MESSAGE_COLUMNS} FROM (
                    SELECT {MESSAGE_COLUMNS} FROM messages
                    WHERE chat_id = $1
                    ORDER BY id DESC
                    LIMIT $2
                ) ORDER BY id ASC
                "
            );
            let rows = sqlx::query(&query)
                .bind(chat_id.get())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(row_to_message).collect()
        })
        .await
    }

    // ========================================================================
    // Read State
    // ========================================================================

    /// Mark every message addressed to `reader_id` as read
    ///
    /// Returns the number of messages that changed state; a second call
    /// returns zero.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for a missing chat and `InvalidReference` if
    /// `reader_id` is not a participant
    pub async fn mark_all_read(
        &self,
        chat_id: ChatId,
        reader_id: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<u64> {
        self.run(deadline, "mark_all_read", || async move {
            self.ensure_participant(chat_id, reader_id).await?;
            let updated = sqlx::query(
                r"
                UPDATE messages SET status = 'read'
                WHERE chat_id = $1 AND sender_id != $2 AND status = 'unread'
                ",
            )
            .bind(chat_id.get())
            .bind(reader_id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();
            Ok(updated)
        })
        .await
    }

    /// Number of messages in a chat still unread by `reader_id`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for a missing chat and `InvalidReference` if
    /// `reader_id` is not a participant
    pub async fn unread_count(
        &self,
        chat_id: ChatId,
        reader_id: ParticipantId,
        deadline: Deadline,
    ) -> AppResult<u64> {
        self.run(deadline, "unread_count", || async move {
            self.ensure_participant(chat_id, reader_id).await?;
            let count: i64 = sqlx::query_scalar(
                r"
                SELECT COUNT(*) FROM messages
                WHERE chat_id = $1 AND sender_id != $2 AND status = 'unread'
                ",
            )
            .bind(chat_id.get())
            .bind(reader_id.get())
            .fetch_one(&self.pool)
            .await?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn ensure_chat_exists(&self, chat_id: ChatId) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chats WHERE id = $1)")
            .bind(chat_id.get())
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(chat_not_found(chat_id))
        }
    }

    async fn ensure_participant(&self, chat_id: ChatId, participant: ParticipantId) -> AppResult<()> {
        if self.fetch_participants(chat_id).await?.contains(participant) {
            Ok(())
        } else {
            Err(AppError::invalid_reference(format!(
                "Participant {participant} is not part of chat {chat_id}"
            )))
        }
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn chat_not_found(chat_id: ChatId) -> AppError {
    AppError::not_found(format!("Chat {chat_id}"))
}

/// Directory failures surface as `NotFound` or `Unavailable` only
fn directory_error(error: AppError) -> AppError {
    match error.code {
        ErrorCode::ResourceNotFound | ErrorCode::Unavailable | ErrorCode::Timeout => error,
        _ => AppError::new(
            ErrorCode::Unavailable,
            format!("profile directory: {}", error.message),
        )
        .with_source(error),
    }
}

fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::serialization(format!("Invalid timestamp '{value}': {e}")))
}

fn row_to_pair(row: &SqliteRow) -> AppResult<CanonicalPair> {
    let a: i64 = row.try_get("participant_a")?;
    let b: i64 = row.try_get("participant_b")?;
    CanonicalPair::new(ParticipantId(a), ParticipantId(b))
}

fn row_to_chat(row: &SqliteRow) -> AppResult<Chat> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Chat {
        id: ChatId(row.try_get("id")?),
        participants: row_to_pair(row)?,
        last_message_preview: row.try_get("last_message_preview")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Message {
        id: MessageId(row.try_get("id")?),
        chat_id: ChatId(row.try_get("chat_id")?),
        sender_id: ParticipantId(row.try_get("sender_id")?),
        content: row.try_get("content")?,
        status: status.parse()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_lexicographically() {
        let earlier = parse_timestamp("2025-01-01T00:00:00Z").unwrap();
        let later = parse_timestamp("2025-01-01T00:00:00.5Z").unwrap();
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(earlier).len(), format_timestamp(later).len());
    }

    #[test]
    fn test_directory_errors_are_narrowed() {
        let narrowed = directory_error(AppError::internal("boom"));
        assert_eq!(narrowed.code, ErrorCode::Unavailable);

        let missing = directory_error(AppError::not_found("Profile 7"));
        assert_eq!(missing.code, ErrorCode::ResourceNotFound);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let error = parse_timestamp("yesterday").unwrap_err();
        assert_eq!(error.code, ErrorCode::SerializationError);
    }
}
