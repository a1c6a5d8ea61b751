// ABOUTME: Matchbox CLI - operator tool exposing every conversation service operation
// ABOUTME: Connects to the configured database and cache, then runs a single command
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat
//!
//! Usage:
//! ```bash
//! # Seed the profile shown to conversation peers
//! matchbox-cli profile 1 --first-name Ada --last-name Lovelace
//!
//! # Create (or get) the chat between two participants
//! matchbox-cli create 1 2
//!
//! # Send a message and read the cached history
//! matchbox-cli send --chat 1 --sender 1 "hi"
//! matchbox-cli history 1
//!
//! # Conversation list with unread flags, as JSON
//! matchbox-cli --json conversations 2
//!
//! # Mark everything addressed to participant 2 as read
//! matchbox-cli mark-read --chat 1 --reader 2
//! ```

mod commands;
mod helpers;

use std::time::Duration;

use clap::{Parser, Subcommand};
use matchbox_chat::{
    config::ServerConfig, errors::AppResult, models::ParticipantId, services::ServiceHandle,
};
use tracing::info;

use commands::{CommandContext, OutputFormat};

#[derive(Parser)]
#[command(
    name = "matchbox-cli",
    about = "Matchbox conversation store CLI",
    long_about = "Operator tool for inspecting and driving the Matchbox conversation store and its message cache."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Redis URL override (selects the Redis cache backend)
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Per-operation timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Create or overwrite a participant's profile summary
    Profile {
        /// Participant id
        participant: i64,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Profile description
        #[arg(long, default_value = "")]
        description: String,

        /// Avatar image path
        #[arg(long, default_value = "")]
        avatar_path: String,
    },

    /// Create the chat between two participants, or return the existing one
    Create {
        /// First participant
        a: i64,
        /// Second participant
        b: i64,
    },

    /// Send a message
    Send {
        /// Chat id
        #[arg(long)]
        chat: i64,

        /// Sending participant
        #[arg(long)]
        sender: i64,

        /// Message text
        content: String,
    },

    /// Show the most recent messages of a chat (cached)
    History {
        /// Chat id
        chat: i64,
    },

    /// Show every message of a chat, read from the database
    FullHistory {
        /// Chat id
        chat: i64,
    },

    /// List a participant's conversations
    Conversations {
        /// Participant id
        participant: i64,
    },

    /// Mark all messages addressed to a participant as read
    MarkRead {
        /// Chat id
        #[arg(long)]
        chat: i64,

        /// Reading participant
        #[arg(long)]
        reader: i64,
    },

    /// Count messages a participant has not read yet
    Unread {
        /// Chat id
        #[arg(long)]
        chat: i64,

        /// Reading participant
        #[arg(long)]
        reader: i64,
    },

    /// Delete one message
    DeleteMessage {
        /// Chat id
        #[arg(long)]
        chat: i64,

        /// Message id
        #[arg(long)]
        message: i64,
    },

    /// Delete the chat between two participants and all its messages
    DeleteChat {
        /// First participant
        a: i64,
        /// Second participant
        b: i64,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if cli.verbose {
        "debug".clone_into(&mut config.logging.level);
    }
    config.logging.init()?;

    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(url) = cli.redis_url {
        config.cache.redis_url = Some(url);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.service.operation_timeout_ms = timeout_ms;
    }
    // One-shot process: the expiry sweeper would never get to run
    config.cache.enable_background_cleanup = false;

    info!(database = %config.database.url, "Matchbox CLI");
    let handle = ServiceHandle::bootstrap(&config).await?;

    let ctx = CommandContext {
        handle: &handle,
        timeout: Duration::from_millis(config.service.operation_timeout_ms),
        output: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
    };

    match cli.command {
        Command::Profile {
            participant,
            first_name,
            last_name,
            description,
            avatar_path,
        } => {
            commands::profile::upsert(
                &ctx,
                ParticipantId(participant),
                first_name,
                last_name,
                description,
                avatar_path,
            )
            .await?;
        }
        Command::Create { a, b } => {
            commands::chat::create(&ctx, ParticipantId(a), ParticipantId(b)).await?;
        }
        Command::Conversations { participant } => {
            commands::chat::conversations(&ctx, ParticipantId(participant)).await?;
        }
        Command::MarkRead { chat, reader } => {
            commands::chat::mark_read(&ctx, chat.into(), ParticipantId(reader)).await?;
        }
        Command::Unread { chat, reader } => {
            commands::chat::unread(&ctx, chat.into(), ParticipantId(reader)).await?;
        }
        Command::DeleteChat { a, b } => {
            commands::chat::delete(&ctx, ParticipantId(a), ParticipantId(b)).await?;
        }
        Command::Send {
            chat,
            sender,
            content,
        } => {
            commands::message::send(&ctx, chat.into(), ParticipantId(sender), &content).await?;
        }
        Command::History { chat } => {
            commands::message::history(&ctx, chat.into()).await?;
        }
        Command::FullHistory { chat } => {
            commands::message::full_history(&ctx, chat.into()).await?;
        }
        Command::DeleteMessage { chat, message } => {
            commands::message::delete(&ctx, chat.into(), message.into()).await?;
        }
    }

    handle.database.close().await;
    Ok(())
}
