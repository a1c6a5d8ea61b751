// ABOUTME: Transaction management with RAII guards and retry patterns for store writes
// ABOUTME: Provides automatic rollback on drop and exponential backoff under SQLite lock contention
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

//! Transaction management with RAII guards and retry patterns
//!
//! - `TransactionGuard`: RAII wrapper ensuring automatic rollback if not committed
//! - `retry_transaction`: exponential backoff for lock contention
//!
//! Every multi-statement write in the conversation store follows the same
//! shape:
//!
//! ```text
//! let mut guard = TransactionGuard::begin(&pool).await?;
//! sqlx::query("UPDATE chats ...").execute(guard.executor()?).await?;
//! sqlx::query("INSERT INTO messages ...").execute(guard.executor()?).await?;
//! guard.commit().await?;
//! ```
//!
//! Any early return, including one caused by a deadline dropping the future,
//! drops the guard before `commit()` and the transaction is rolled back.

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Pool, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult, ErrorCode};

/// Retry a transaction operation if it fails due to lock contention
///
/// Retryable failures are `SQLite` "database is locked"/"busy" errors and
/// shared-cache table locks. Everything else (constraint violations, missing
/// rows, non-participant senders) is returned immediately.
///
/// # Errors
///
/// Returns the last error once `max_retries` attempts are exhausted, or the
/// first non-retryable error
///
/// # Exponential Backoff
/// - Attempt 1: 20ms
/// - Attempt 2: 40ms
/// - Attempt 3: 80ms
/// - Attempt 4: 160ms
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if !is_retryable_error(&e) {
                    return Err(e);
                }
                if attempts >= max_retries {
                    error!(
                        attempts = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }

                let backoff_ms = 10 * (1u64 << attempts.min(10));
                warn!(
                    attempt = attempts,
                    max_retries = max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Transaction failed with retryable error, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// Check if a store error is transient lock contention
fn is_retryable_error(error: &AppError) -> bool {
    if error.code != ErrorCode::Unavailable {
        return false;
    }
    let message = error.message.to_lowercase();
    message.contains("database is locked")
        || message.contains("table is locked")
        || message.contains("busy")
        || message.contains("deadlock")
}

/// RAII guard for database transactions ensuring automatic rollback on drop
///
/// # Type Parameters
///
/// * `DB` - The database type (e.g., `Sqlite`)
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<DB: Database> TransactionGuard<'static, DB> {
    /// Begin a transaction on `pool` and guard it
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired or `BEGIN` fails
    pub async fn begin(pool: &Pool<DB>) -> AppResult<Self> {
        let transaction = pool.begin().await?;
        Ok(Self::new(transaction))
    }
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Create a new transaction guard from an existing `SQLx` transaction
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction was already consumed or the
    /// database commit fails
    pub async fn commit(mut self) -> AppResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.commit().await?;
                self.committed = true;
                Ok(())
            }
            None => Err(AppError::internal(
                "Transaction already consumed - cannot commit",
            )),
        }
    }

    /// Get a mutable reference to the underlying connection for executing queries
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction has already been committed.
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            // SQLx rolls back when the Transaction is dropped; logged for observability
            debug!("TransactionGuard dropped without commit - transaction rolled back");
        }
    }
}

/// Type alias for `SQLite` transaction guard
pub type SqliteTransactionGuard = TransactionGuard<'static, sqlx::Sqlite>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_lock_errors_are_retryable() {
        assert!(is_retryable_error(&AppError::database(
            "error returned from database: (code: 5) database is locked"
        )));
        assert!(is_retryable_error(&AppError::database(
            "error returned from database: (code: 262) database table is locked"
        )));
    }

    #[test]
    fn test_domain_errors_are_not_retryable() {
        assert!(!is_retryable_error(&AppError::not_found("Chat 1")));
        assert!(!is_retryable_error(&AppError::already_exists("Chat")));
        assert!(!is_retryable_error(&AppError::database(
            "UNIQUE constraint failed: chats.participant_a"
        )));
    }

    #[tokio::test]
    async fn test_retry_stops_on_success() {
        let calls = AtomicU32::new(0);
        let result = retry_transaction(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::database("database is locked"))
                } else {
                    Ok(42)
                }
            },
            3,
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_transaction(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::database("database is locked"))
            },
            3,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
