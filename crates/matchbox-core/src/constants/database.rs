// ABOUTME: Relational store constants for connection pooling and transaction retries
// ABOUTME: Defaults used when DATABASE_* environment variables are not set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

/// Default database location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/matchbox.db";

/// Maximum pooled connections
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Seconds to wait for a pooled connection before failing with `Timeout`
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Milliseconds `SQLite` waits on a locked database before reporting busy
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Attempts made for a write transaction that hits lock contention
pub const DEFAULT_TRANSACTION_RETRIES: u32 = 5;
