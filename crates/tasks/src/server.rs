//! The server seam the tracker talks through.

use async_trait::async_trait;
use scribe_core::status::StatusResponse;
use scribe_core::types::TaskId;

use crate::api::TaskApiError;
use crate::payload::Payload;

/// Operations the tracker needs from a task server.
///
/// [`TaskApi`](crate::api::TaskApi) is the HTTP implementation; tests
/// substitute a scripted fake.
#[async_trait]
pub trait TaskServer: Send + Sync {
    /// Submit a job and return the id the server minted for it.
    async fn submit_job(&self, endpoint: &str, payload: Payload) -> Result<TaskId, TaskApiError>;

    /// Fetch the current status of a task.
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusResponse, TaskApiError>;
}
