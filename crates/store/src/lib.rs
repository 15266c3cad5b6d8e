//! Persistent identity store for tracked tasks.
//!
//! Remembers, per [`Channel`], the id of the task currently being
//! observed so that a later process can resume observing it. Two
//! backends implement [`IdentityStore`]:
//!
//! - [`MemoryStore`] -- process-local, for tests and ephemeral runs.
//! - [`SqliteStore`] -- durable SQLite file shared by every run on the
//!   same machine.

use async_trait::async_trait;
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod memory;
pub mod models;
pub mod repo;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type DbPool = sqlx::SqlitePool;

/// Key-value store of `channel -> task id`.
///
/// Reading an absent channel is not an error: it yields `Ok(None)`.
/// Errors only report backend failures.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Task id persisted for `channel`, if any.
    async fn get(&self, channel: &Channel) -> Result<Option<TaskId>, StoreError>;

    /// Persist `task_id` for `channel`, replacing any previous value.
    /// `None` removes the entry.
    async fn set(&self, channel: &Channel, task_id: Option<&TaskId>) -> Result<(), StoreError>;

    /// Remove the entry only if it still holds `expected`.
    ///
    /// Returns whether an entry was removed.
    async fn clear_if(&self, channel: &Channel, expected: &TaskId) -> Result<bool, StoreError>;

    /// Every persisted entry, ordered by channel name.
    async fn entries(&self) -> Result<Vec<(Channel, TaskId)>, StoreError>;
}

/// Errors from a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted row could not be turned back into domain types.
    #[error("Corrupt store entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Open (creating if needed) a SQLite pool for `database_url`,
/// e.g. `sqlite://scribe.db`.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options: SqliteConnectOptions = database_url.parse()?;
    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options.create_if_missing(true))
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
