// ABOUTME: Message cache constants for the history bound, TTL, capacity, and key layout
// ABOUTME: Shared by the in-memory and Redis cache backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

/// Number of most recent messages kept per chat
pub const MESSAGE_HISTORY_LIMIT: usize = 50;

/// Maximum number of chats held by the in-memory backend before LRU eviction
pub const DEFAULT_CACHE_MAX_CHATS: usize = 10_000;

/// Cached history TTL (1 hour) - the store can always rebuild it
pub const TTL_HISTORY_SECS: u64 = 3_600;

/// Default cleanup interval in seconds for expired entries
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Cache key prefix for namespacing
pub const CACHE_KEY_PREFIX: &str = "matchbox:cache:";
