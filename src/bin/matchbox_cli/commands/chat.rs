// ABOUTME: Chat-level commands for matchbox-cli
// ABOUTME: Create-or-get, listing, read state, and chat deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use matchbox_chat::errors::AppResult;
use matchbox_chat::models::{ChatId, ParticipantId};

use super::CommandContext;
use crate::helpers::display::{print_conversations, print_value, print_write};

/// Create the chat between `a` and `b`, or print the existing one
pub async fn create(ctx: &CommandContext<'_>, a: ParticipantId, b: ParticipantId) -> AppResult<()> {
    let chat_id = ctx
        .handle
        .conversations
        .create_conversation(a, b, ctx.deadline())
        .await?;
    print_value(ctx.output, &chat_id, |id| format!("Chat {id} between {a} and {b}"))
}

/// List the conversations of `participant`
pub async fn conversations(ctx: &CommandContext<'_>, participant: ParticipantId) -> AppResult<()> {
    let summaries = ctx
        .handle
        .conversations
        .conversations(participant, ctx.deadline())
        .await?;
    print_conversations(ctx.output, &summaries)
}

/// Mark everything addressed to `reader` as read
pub async fn mark_read(ctx: &CommandContext<'_>, chat_id: ChatId, reader: ParticipantId) -> AppResult<()> {
    let outcome = ctx
        .handle
        .conversations
        .mark_read(chat_id, reader, ctx.deadline())
        .await?;
    print_write(ctx.output, &outcome, |n| format!("{n} message(s) marked read"))
}

/// Print how many messages `reader` has not read yet
pub async fn unread(ctx: &CommandContext<'_>, chat_id: ChatId, reader: ParticipantId) -> AppResult<()> {
    let count = ctx
        .handle
        .conversations
        .unread_count(chat_id, reader, ctx.deadline())
        .await?;
    print_value(ctx.output, &count, |n| format!("{n} unread"))
}

/// Delete the chat between `a` and `b`
pub async fn delete(ctx: &CommandContext<'_>, a: ParticipantId, b: ParticipantId) -> AppResult<()> {
    let outcome = ctx
        .handle
        .conversations
        .delete_conversation(a, b, ctx.deadline())
        .await?;
    print_write(ctx.output, &outcome, |id| format!("Chat {id} deleted"))
}
