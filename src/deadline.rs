// ABOUTME: Caller-supplied deadlines for store and cache operations
// ABOUTME: Expiry cancels the in-flight future and surfaces a typed Timeout error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use crate::errors::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

/// Point in time by which an operation must complete
///
/// Running a future under a deadline drops it on expiry. For store
/// operations that drop releases the open transaction, which rolls it back,
/// so a timed-out write leaves no partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// Deadline at a fixed instant
    #[must_use]
    pub const fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Time left before expiry, zero once expired
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Run `operation` under this deadline
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the deadline passes first, otherwise the
    /// operation's own result
    pub async fn run<F, T>(self, operation: &'static str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if let Ok(result) = timeout_at(self.at, future).await {
            result
        } else {
            warn!(operation, "Operation cancelled at deadline");
            Err(AppError::timeout(operation))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result = Deadline::after(Duration::from_secs(1))
            .run("quick", async { Ok::<_, AppError>(7) })
            .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_expired_deadline_reports_timeout() {
        let result = Deadline::after(Duration::from_millis(10))
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AppError>(())
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::Timeout);
    }

    #[test]
    fn test_remaining_saturates() {
        let deadline = Deadline::at(Instant::now());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }
}
