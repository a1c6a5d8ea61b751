// ABOUTME: Domain models for participants, chats, messages, and profile summaries
// ABOUTME: Shared by the relational store, the message cache, and the service facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

mod chat;
mod ids;
mod message;
mod profile;

pub use chat::{CanonicalPair, Chat, ChatListing};
pub use ids::{ChatId, MessageId, ParticipantId};
pub use message::{Message, MessageStatus};
pub use profile::ProfileSummary;
