// ABOUTME: Unified error handling for the conversation store, cache, and service
// ABOUTME: Re-exports the error taxonomy defined in the matchbox-core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

pub use matchbox_core::errors::*;
