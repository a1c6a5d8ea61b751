// ABOUTME: Main library entry point for the Matchbox conversation store
// ABOUTME: Relational chats and messages with a bounded write-through history cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

#![deny(unsafe_code)]

//! # Matchbox Chat
//!
//! Conversation and message storage for a social application: two-person
//! chats, per-message read state, and a bounded cache of each chat's most
//! recent messages.
//!
//! ## Architecture
//!
//! - **Database**: `SQLite` system of record for chats, messages and profile
//!   summaries ([`database::ConversationStore`])
//! - **Cache**: per-chat history lists, in memory or in Redis
//!   ([`cache::MessageCache`])
//! - **Services**: the facade composing both ([`services::ConversationService`])
//! - **Config**: environment-driven settings for every layer
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use matchbox_chat::config::ServerConfig;
//! use matchbox_chat::errors::AppResult;
//! use matchbox_chat::models::ParticipantId;
//! use matchbox_chat::services::ServiceHandle;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let handle = ServiceHandle::bootstrap(&config).await?;
//!     let service = &handle.conversations;
//!
//!     let chat_id = service
//!         .create_conversation(ParticipantId(1), ParticipantId(2), service.deadline())
//!         .await?;
//!     service
//!         .send(chat_id, ParticipantId(1), "hi", service.deadline())
//!         .await?;
//!     let history = service.history(chat_id, service.deadline()).await?;
//!     println!("{} messages", history.len());
//!     Ok(())
//! }
//! ```

/// Per-chat message history cache and its backends
pub mod cache;

/// Environment-driven configuration
pub mod config;

/// Default values shared across layers
pub mod constants;

/// Relational store, schema and transaction helpers
pub mod database;

/// Caller-supplied operation deadlines
pub mod deadline;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// Profile directory interface
pub mod profiles;

/// Conversation service and bootstrap
pub mod services;
