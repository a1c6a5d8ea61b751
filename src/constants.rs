// ABOUTME: System-wide defaults for the store, cache, Redis connection, and service deadlines
// ABOUTME: Re-exports the constants defined in the matchbox-core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

pub use matchbox_core::constants::*;
