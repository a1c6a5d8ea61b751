// ABOUTME: Conversion from sqlx errors into the unified AppError taxonomy
// ABOUTME: Constraint violations become typed domain errors, I/O becomes Unavailable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use super::{AppError, ErrorCode};

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        let code = classify(&error);
        let message = match code {
            ErrorCode::ResourceAlreadyExists => format!("unique constraint violated: {error}"),
            ErrorCode::InvalidReference => format!("referential constraint violated: {error}"),
            ErrorCode::ResourceNotFound => "row not found".to_owned(),
            ErrorCode::Timeout => "timed out acquiring a database connection".to_owned(),
            _ => format!("database: {error}"),
        };
        Self::new(code, message).with_source(error)
    }
}

fn classify(error: &sqlx::Error) -> ErrorCode {
    match error {
        sqlx::Error::RowNotFound => ErrorCode::ResourceNotFound,
        sqlx::Error::PoolTimedOut => ErrorCode::Timeout,
        sqlx::Error::Database(db) if db.is_unique_violation() => ErrorCode::ResourceAlreadyExists,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => ErrorCode::InvalidReference,
        sqlx::Error::Database(db) if db.is_check_violation() => ErrorCode::InvalidInput,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => ErrorCode::SerializationError,
        _ => ErrorCode::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
    }

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        let error: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(error.code, ErrorCode::Timeout);
    }

    #[test]
    fn test_closed_pool_is_unavailable() {
        let error: AppError = sqlx::Error::PoolClosed.into();
        assert_eq!(error.code, ErrorCode::Unavailable);
        assert!(error.code.is_transient());
    }
}
