//! Repository for the `task_identities` table.

use chrono::Utc;
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;

use crate::models::TaskIdentity;
use crate::DbPool;

/// Column list for `task_identities` queries.
const COLUMNS: &str = "storage_key, channel, task_id, updated_at";

/// Provides query operations for persisted task identities.
pub struct TaskIdentityRepo;

impl TaskIdentityRepo {
    /// Find the entry for a channel.
    pub async fn find(
        pool: &DbPool,
        channel: &Channel,
    ) -> Result<Option<TaskIdentity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_identities WHERE storage_key = ?1");
        sqlx::query_as::<_, TaskIdentity>(&query)
            .bind(channel.storage_key())
            .fetch_optional(pool)
            .await
    }

    /// List every entry ordered by channel name.
    pub async fn list(pool: &DbPool) -> Result<Vec<TaskIdentity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_identities ORDER BY channel");
        sqlx::query_as::<_, TaskIdentity>(&query)
            .fetch_all(pool)
            .await
    }

    /// Insert or overwrite the entry for a channel.
    pub async fn upsert(
        pool: &DbPool,
        channel: &Channel,
        task_id: &TaskId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO task_identities (storage_key, channel, task_id, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (storage_key) DO UPDATE \
             SET task_id = excluded.task_id, updated_at = excluded.updated_at",
        )
        .bind(channel.storage_key())
        .bind(channel.as_str())
        .bind(task_id.as_str())
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete the entry for a channel. Returns whether a row was removed.
    pub async fn delete(pool: &DbPool, channel: &Channel) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_identities WHERE storage_key = ?1")
            .bind(channel.storage_key())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a row by its raw storage key, whether or not it still
    /// parses as a channel.
    pub async fn delete_by_key(pool: &DbPool, storage_key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_identities WHERE storage_key = ?1")
            .bind(storage_key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the entry for a channel only if it holds `task_id`.
    pub async fn delete_if_matches(
        pool: &DbPool,
        channel: &Channel,
        task_id: &TaskId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM task_identities WHERE storage_key = ?1 AND task_id = ?2")
                .bind(channel.storage_key())
                .bind(task_id.as_str())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
