// ABOUTME: Message-level commands for matchbox-cli
// ABOUTME: Send, cached and full history, and single message deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use matchbox_chat::errors::AppResult;
use matchbox_chat::models::{ChatId, MessageId, ParticipantId};

use super::CommandContext;
use crate::helpers::display::{format_message, print_messages, print_write};

/// Send `content` as `sender`
pub async fn send(
    ctx: &CommandContext<'_>,
    chat_id: ChatId,
    sender: ParticipantId,
    content: &str,
) -> AppResult<()> {
    let outcome = ctx
        .handle
        .conversations
        .send(chat_id, sender, content, ctx.deadline())
        .await?;
    print_write(ctx.output, &outcome, format_message)
}

/// Print the cached history of a chat
pub async fn history(ctx: &CommandContext<'_>, chat_id: ChatId) -> AppResult<()> {
    let messages = ctx
        .handle
        .conversations
        .history(chat_id, ctx.deadline())
        .await?;
    print_messages(ctx.output, &messages)
}

/// Print every message of a chat
pub async fn full_history(ctx: &CommandContext<'_>, chat_id: ChatId) -> AppResult<()> {
    let messages = ctx
        .handle
        .conversations
        .full_history(chat_id, ctx.deadline())
        .await?;
    print_messages(ctx.output, &messages)
}

/// Delete one message
pub async fn delete(ctx: &CommandContext<'_>, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
    let outcome = ctx
        .handle
        .conversations
        .delete(message_id, chat_id, ctx.deadline())
        .await?;
    print_write(ctx.output, &outcome, |preview| {
        if preview.is_empty() {
            "Message deleted, chat is now empty".to_owned()
        } else {
            format!("Message deleted, preview is now: {preview}")
        }
    })
}
