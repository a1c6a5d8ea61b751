// ABOUTME: Message record and read-state enum for chat entries
// ABOUTME: Read state only ever moves from Unread to Read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{ChatId, MessageId, ParticipantId};
use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-message read state as seen by the non-sending participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Not yet read by the recipient
    Unread,
    /// Read by the recipient
    Read,
}

impl MessageStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(AppError::invalid_input(format!(
                "Unknown message status: {other}"
            ))),
        }
    }
}

/// A single chat entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID
    pub id: MessageId,
    /// Owning chat
    pub chat_id: ChatId,
    /// Participant who sent the message
    pub sender_id: ParticipantId,
    /// Message text
    pub content: String,
    /// Read state
    pub status: MessageStatus,
    /// Commit time
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_storage_strings() {
        for status in [MessageStatus::Unread, MessageStatus::Read] {
            assert_eq!(status.as_str().parse::<MessageStatus>().unwrap(), status);
        }
        assert!("archived".parse::<MessageStatus>().is_err());
    }
}
