// ABOUTME: Type-safe integer identifiers for participants, chats, and messages
// ABOUTME: Newtypes keep ids of different entities from being mixed up at call sites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner integer value
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

integer_id!(
    /// Opaque identifier of a profile taking part in conversations
    ParticipantId
);

integer_id!(
    /// Identifier of a two-participant chat, generated by the relational store
    ChatId
);

integer_id!(
    /// Identifier of a message; strictly increasing in commit order
    MessageId
);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_and_display() {
        let id: ChatId = " 42 ".parse().unwrap();
        assert_eq!(id, ChatId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<MessageId>().is_err());
    }

    #[test]
    fn test_message_ids_order_numerically() {
        assert!(MessageId(9) < MessageId(10));
    }
}
