// ABOUTME: Profile directory interface consulted when listing a participant's conversations
// ABOUTME: Keeps the store independent of where profile summaries actually live
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{ParticipantId, ProfileSummary};

/// Read-only lookup of profile summaries
///
/// Implementations report a missing profile as `ResourceNotFound` and backend
/// failures as `Unavailable`. Listings abort on the first failure instead of
/// returning partially enriched results.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Summary of `participant`
    async fn get_summary(&self, participant: ParticipantId) -> AppResult<ProfileSummary>;
}
