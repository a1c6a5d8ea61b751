// ABOUTME: Profile seeding command for matchbox-cli
// ABOUTME: Writes the summary shown next to conversations in listings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use matchbox_chat::errors::AppResult;
use matchbox_chat::models::{ParticipantId, ProfileSummary};
use tracing::info;

use super::CommandContext;
use crate::helpers::display::print_value;

/// Create or overwrite a profile summary
pub async fn upsert(
    ctx: &CommandContext<'_>,
    participant: ParticipantId,
    first_name: String,
    last_name: String,
    description: String,
    avatar_path: String,
) -> AppResult<()> {
    let summary = ProfileSummary {
        first_name,
        last_name,
        description,
        avatar_path,
    };
    ctx.handle
        .profiles
        .upsert_summary(participant, &summary)
        .await?;
    info!(participant = %participant, "Profile summary stored");

    print_value(ctx.output, &summary, |s| {
        format!("Profile {participant}: {} {}", s.first_name, s.last_name)
    })
}
