// ABOUTME: Domain models for participants, chats, messages, and profile summaries
// ABOUTME: Re-exports the model types defined in the matchbox-core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

pub use matchbox_core::models::*;
