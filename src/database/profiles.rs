// ABOUTME: SQLite-backed profile directory with summary upserts for seeding
// ABOUTME: Stores the name, description, and avatar path shown next to conversations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Matchbox Chat

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};
use crate::models::{ParticipantId, ProfileSummary};
use crate::profiles::ProfileDirectory;

/// Profile summaries stored in the `profiles` table
#[derive(Clone)]
pub struct SqliteProfileDirectory {
    pool: SqlitePool,
}

impl SqliteProfileDirectory {
    /// Create a new directory over `pool`
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `profiles` table if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                avatar_path TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert or overwrite the summary of `participant`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn upsert_summary(
        &self,
        participant: ParticipantId,
        summary: &ProfileSummary,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, first_name, last_name, description, avatar_path)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                description = excluded.description,
                avatar_path = excluded.avatar_path
            ",
        )
        .bind(participant.get())
        .bind(&summary.first_name)
        .bind(&summary.last_name)
        .bind(&summary.description)
        .bind(&summary.avatar_path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for SqliteProfileDirectory {
    async fn get_summary(&self, participant: ParticipantId) -> AppResult<ProfileSummary> {
        let row = sqlx::query(
            "SELECT first_name, last_name, description, avatar_path FROM profiles WHERE id = $1",
        )
        .bind(participant.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {participant}")))?;

        Ok(ProfileSummary {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            description: row.try_get("description")?,
            avatar_path: row.try_get("avatar_path")?,
        })
    }
}
