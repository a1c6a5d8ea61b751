// ABOUTME: Conversion from Redis client errors into the unified AppError taxonomy
// ABOUTME: Timeouts stay distinguishable from other cache backend failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{AppError, ErrorCode};

impl From<redis::RedisError> for AppError {
    fn from(error: redis::RedisError) -> Self {
        let code = if error.is_timeout() {
            ErrorCode::Timeout
        } else {
            ErrorCode::Unavailable
        };
        Self::new(code, format!("cache: {error}")).with_source(error)
    }
}
