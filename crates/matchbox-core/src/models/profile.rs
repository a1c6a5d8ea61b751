// ABOUTME: Minimal profile summary shown next to a conversation in listings
// ABOUTME: Owned by the external profile directory, consumed read-only here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use serde::{Deserialize, Serialize};

/// Profile summary of a conversation peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Free-form profile description
    pub description: String,
    /// Path of the avatar image in the image store
    pub avatar_path: String,
}
