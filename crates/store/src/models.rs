//! Row models for the `task_identities` table.

use chrono::{DateTime, Utc};
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use sqlx::FromRow;

use crate::StoreError;

/// A persisted `channel -> task id` entry.
#[derive(Debug, Clone, FromRow)]
pub struct TaskIdentity {
    pub storage_key: String,
    pub channel: String,
    pub task_id: String,
    pub updated_at: DateTime<Utc>,
}

impl TaskIdentity {
    /// Convert the raw row back into validated domain types.
    pub fn into_entry(self) -> Result<(Channel, TaskId), StoreError> {
        let channel = Channel::new(self.channel).map_err(|e| StoreError::Corrupt {
            key: self.storage_key.clone(),
            reason: e.to_string(),
        })?;
        let task_id = TaskId::new(self.task_id).map_err(|e| StoreError::Corrupt {
            key: self.storage_key,
            reason: e.to_string(),
        })?;
        Ok((channel, task_id))
    }
}
