// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for the cache, database, Redis client, and service layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large file. Configuration loaders fall back to these values when the
//! corresponding environment variable is absent or unparsable.

/// Message cache constants (history bound, TTL, capacity)
pub mod cache;
/// Relational store constants (pool, retries, default URL)
pub mod database;
/// Redis client connection and retry constants
pub mod redis;

/// Service-level defaults
pub mod service {
    /// Default per-operation deadline applied when a caller does not supply one
    pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

    /// Service name reported in structured logs
    pub const SERVICE_NAME: &str = "matchbox-chat";
}
