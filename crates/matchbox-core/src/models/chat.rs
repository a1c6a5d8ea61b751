// ABOUTME: Chat record, canonical participant pair, and enriched chat listing
// ABOUTME: The canonical pair stores the lower participant id first so each pair maps to one chat
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{ChatId, ParticipantId, ProfileSummary};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unordered participant pair normalized so that `low < high`
///
/// Every store operation addressed by a pair goes through this type, which
/// makes `(a, b)` and `(b, a)` indistinguishable below the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[ParticipantId; 2]", into = "[ParticipantId; 2]")]
pub struct CanonicalPair {
    low: ParticipantId,
    high: ParticipantId,
}

impl CanonicalPair {
    /// Normalize a participant pair
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if both ids are the same participant
    pub fn new(a: ParticipantId, b: ParticipantId) -> AppResult<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Ok(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Ok(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => Err(AppError::invalid_input(format!(
                "A conversation needs two distinct participants, got {a} twice"
            ))),
        }
    }

    /// Lower participant id (stored as `participant_a`)
    #[must_use]
    pub const fn low(&self) -> ParticipantId {
        self.low
    }

    /// Higher participant id (stored as `participant_b`)
    #[must_use]
    pub const fn high(&self) -> ParticipantId {
        self.high
    }

    /// Whether `participant` is one of the pair
    #[must_use]
    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.low == participant || self.high == participant
    }

    /// The member of the pair that is not `participant`
    #[must_use]
    pub fn other(&self, participant: ParticipantId) -> Option<ParticipantId> {
        if participant == self.low {
            Some(self.high)
        } else if participant == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl TryFrom<[ParticipantId; 2]> for CanonicalPair {
    type Error = AppError;

    fn try_from([a, b]: [ParticipantId; 2]) -> Result<Self, Self::Error> {
        Self::new(a, b)
    }
}

impl From<CanonicalPair> for [ParticipantId; 2] {
    fn from(pair: CanonicalPair) -> Self {
        [pair.low, pair.high]
    }
}

/// A conversation between exactly two participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat ID
    pub id: ChatId,
    /// Canonical participant pair
    pub participants: CanonicalPair,
    /// Content of the most recent message, empty when there is none
    pub last_message_preview: String,
    /// When the chat was created
    pub created_at: DateTime<Utc>,
    /// When a message was last posted or deleted
    pub updated_at: DateTime<Utc>,
}

/// A chat as seen by one of its participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatListing {
    /// The chat itself
    pub chat: Chat,
    /// The participant on the other side
    pub peer_id: ParticipantId,
    /// Profile summary of the peer
    pub peer: ProfileSummary,
    /// Messages from the peer the viewer has not read yet
    pub unread_count: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_order_independent() {
        let forward = CanonicalPair::new(ParticipantId(9), ParticipantId(3)).unwrap();
        let backward = CanonicalPair::new(ParticipantId(3), ParticipantId(9)).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.low(), ParticipantId(3));
        assert_eq!(forward.high(), ParticipantId(9));
    }

    #[test]
    fn test_pair_rejects_self_conversation() {
        let error = CanonicalPair::new(ParticipantId(4), ParticipantId(4)).unwrap_err();
        assert_eq!(error.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_other_participant() {
        let pair = CanonicalPair::new(ParticipantId(1), ParticipantId(2)).unwrap();
        assert_eq!(pair.other(ParticipantId(1)), Some(ParticipantId(2)));
        assert_eq!(pair.other(ParticipantId(2)), Some(ParticipantId(1)));
        assert_eq!(pair.other(ParticipantId(5)), None);
        assert!(pair.contains(ParticipantId(2)));
        assert!(!pair.contains(ParticipantId(5)));
    }
}
