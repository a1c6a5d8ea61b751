// ABOUTME: Re-exports command modules for matchbox-cli
// ABOUTME: Shared command context carrying the wired service and output settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

pub mod chat;
pub mod message;
pub mod profile;

use std::time::Duration;

use matchbox_chat::deadline::Deadline;
use matchbox_chat::services::ServiceHandle;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything a command needs
pub struct CommandContext<'a> {
    pub handle: &'a ServiceHandle,
    pub timeout: Duration,
    pub output: OutputFormat,
}

impl CommandContext<'_> {
    /// Fresh deadline for one operation
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.timeout)
    }
}
