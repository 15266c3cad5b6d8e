//! Durable [`IdentityStore`] backed by a SQLite file.

use async_trait::async_trait;
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;

use crate::repo::TaskIdentityRepo;
use crate::{create_pool, health_check, run_migrations, DbPool, IdentityStore, StoreError};

/// Identity store persisted in the `task_identities` table.
///
/// Entries survive process restarts, which is what makes a task
/// resumable by a later run. Rows that no longer parse (hand-edited or
/// written by an incompatible version) are logged and deleted on read,
/// so they never block the other channels.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Connect to `database_url`, apply migrations and check the pool.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        health_check(&pool).await?;
        tracing::debug!(database_url, "Task identity store opened");
        Ok(Self { pool })
    }

    /// Wrap an already-migrated pool.
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close the underlying pool, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Delete a row that no longer converts back into domain types.
    async fn discard(&self, storage_key: &str, error: &StoreError) -> Result<(), StoreError> {
        tracing::warn!(
            storage_key,
            error = %error,
            "Discarding unreadable task identity",
        );
        TaskIdentityRepo::delete_by_key(&self.pool, storage_key).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn get(&self, channel: &Channel) -> Result<Option<TaskId>, StoreError> {
        let Some(row) = TaskIdentityRepo::find(&self.pool, channel).await? else {
            return Ok(None);
        };
        let storage_key = row.storage_key.clone();
        match row.into_entry() {
            Ok((_, task_id)) => Ok(Some(task_id)),
            Err(e) => {
                self.discard(&storage_key, &e).await?;
                Ok(None)
            }
        }
    }

    async fn set(&self, channel: &Channel, task_id: Option<&TaskId>) -> Result<(), StoreError> {
        match task_id {
            Some(task_id) => TaskIdentityRepo::upsert(&self.pool, channel, task_id).await?,
            None => {
                TaskIdentityRepo::delete(&self.pool, channel).await?;
            }
        }
        Ok(())
    }

    async fn clear_if(&self, channel: &Channel, expected: &TaskId) -> Result<bool, StoreError> {
        Ok(TaskIdentityRepo::delete_if_matches(&self.pool, channel, expected).await?)
    }

    async fn entries(&self) -> Result<Vec<(Channel, TaskId)>, StoreError> {
        let mut entries = Vec::new();
        for row in TaskIdentityRepo::list(&self.pool).await? {
            let storage_key = row.storage_key.clone();
            match row.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(e) => self.discard(&storage_key, &e).await?,
            }
        }
        Ok(entries)
    }
}
