// ABOUTME: Core types and constants for the Matchbox conversation store
// ABOUTME: Foundation crate with error handling, identifiers, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

#![deny(unsafe_code)]

//! # Matchbox Core
//!
//! Foundation crate providing shared types and constants for the Matchbox
//! conversation store. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Participant/chat/message identifiers and records

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants and configuration defaults organized by domain
pub mod constants;

/// Core data models (chats, messages, profile summaries)
pub mod models;
