//! Job submission.

use scribe_core::channel::Channel;
use scribe_core::types::TaskId;

use crate::error::TaskError;
use crate::payload::Payload;
use crate::tracker::Tracker;

impl Tracker {
    /// Submit a job and persist its id under `channel` before returning.
    ///
    /// Does not start polling. A job already tracked on `channel` is
    /// overwritten: it keeps running on the server but is no longer
    /// observed.
    pub async fn submit(
        &self,
        channel: &Channel,
        endpoint: &str,
        payload: Payload,
    ) -> Result<TaskId, TaskError> {
        let task_id = self
            .server
            .submit_job(endpoint, payload)
            .await
            .map_err(|e| {
                tracing::warn!(
                    channel = %channel,
                    endpoint,
                    error = %e,
                    "Job submission rejected",
                );
                TaskError::SubmissionFailed {
                    channel: channel.clone(),
                    message: e.user_message(),
                }
            })?;

        if let Some(previous) = self.store.get(channel).await? {
            if previous != task_id {
                tracing::warn!(
                    channel = %channel,
                    previous_task_id = %previous,
                    task_id = %task_id,
                    "Replacing outstanding task; the previous task is no longer observed",
                );
            }
        }
        self.store.set(channel, Some(&task_id)).await?;

        tracing::info!(channel = %channel, endpoint, task_id = %task_id, "Job submitted");

        Ok(task_id)
    }
}
