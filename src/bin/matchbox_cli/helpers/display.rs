// ABOUTME: Output formatting helpers for matchbox-cli
// ABOUTME: Renders values as plain text lines or pretty-printed JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use matchbox_chat::errors::AppResult;
use matchbox_chat::models::{Message, MessageStatus};
use matchbox_chat::services::{CacheSync, ConversationSummary, WriteOutcome};
use serde::Serialize;

use crate::commands::OutputFormat;

/// Print `value` as JSON or through `text`
pub fn print_value<T: Serialize>(
    output: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> AppResult<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text(value)),
    }
    Ok(())
}

/// Print a write result and, in text mode, a note when the cache lagged
pub fn print_write<T: Serialize>(
    output: OutputFormat,
    outcome: &WriteOutcome<T>,
    text: impl FnOnce(&T) -> String,
) -> AppResult<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => {
            println!("{}", text(&outcome.value));
            match outcome.cache {
                CacheSync::Synced | CacheSync::Skipped => {}
                CacheSync::Invalidated => println!("   (cached history evicted)"),
                CacheSync::Stale => println!("   WARNING cache update failed, history may be stale"),
            }
        }
    }
    Ok(())
}

/// One message as a single line
pub fn format_message(message: &Message) -> String {
    let marker = match message.status {
        MessageStatus::Unread => "*",
        MessageStatus::Read => " ",
    };
    format!(
        "{marker} #{:<6} {} from {}: {}",
        message.id,
        message.created_at.format("%Y-%m-%d %H:%M:%S"),
        message.sender_id,
        message.content
    )
}

/// Print a list of messages, oldest first
pub fn print_messages(output: OutputFormat, messages: &[Message]) -> AppResult<()> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }
    if messages.is_empty() {
        println!("No messages");
    }
    for message in messages {
        println!("{}", format_message(message));
    }
    Ok(())
}

/// Print a participant's conversation list
pub fn print_conversations(output: OutputFormat, summaries: &[ConversationSummary]) -> AppResult<()> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No conversations");
    }
    for summary in summaries {
        println!(
            "{} chat {:<6} {} {} ({}): {}",
            if summary.has_unread { "*" } else { " " },
            summary.chat.id,
            summary.peer.first_name,
            summary.peer.last_name,
            summary.unread_count,
            summary.chat.last_message_preview
        );
    }
    Ok(())
}
