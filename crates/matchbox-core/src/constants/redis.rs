// ABOUTME: Redis client connection, response timeout, and reconnection constants
// ABOUTME: Feed the ConnectionManager configuration for the Redis cache backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Response/command timeout in seconds
pub const RESPONSE_TIMEOUT_SECS: u64 = 3;

/// Reconnection attempts after a dropped connection
pub const RECONNECTION_RETRIES: usize = 6;

/// Exponential backoff base for reconnection delays
pub const RETRY_EXPONENT_BASE: u64 = 2;

/// Upper bound on a single retry delay in milliseconds
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Connection attempts at startup before giving up
pub const INITIAL_CONNECTION_RETRIES: u32 = 3;

/// First startup retry delay in milliseconds (doubles each attempt)
pub const INITIAL_RETRY_DELAY_MS: u64 = 500;
