//! Status poll loop.
//!
//! One loop per observed task: fetch, deliver to the observer, and if
//! the status is not terminal wait [`PollConfig::interval`](crate::PollConfig)
//! before the next fetch. Fetches never overlap, so records reach the
//! observer in fetch order.

use scribe_core::channel::Channel;
use scribe_core::status::StatusRecord;
use scribe_core::types::TaskId;

use crate::error::TaskError;
use crate::observer::TaskObserver;
use crate::outcome::TrackOutcome;
use crate::tracker::Tracker;

impl Tracker {
    /// Poll `task_id` until it reaches a terminal status.
    ///
    /// Returns [`TrackOutcome::Completed`] after finalizing, or
    /// [`TrackOutcome::Abandoned`] if the stop token fired first. A fetch
    /// failure aborts with [`TaskError::PollFailed`] and leaves the id
    /// persisted.
    ///
    /// Start loops through [`Tracker::submit`] + `observe`, [`Tracker::resume`]
    /// or the [`TaskManager`](crate::TaskManager); two loops on the same
    /// channel would both deliver updates.
    pub async fn observe(
        &self,
        channel: &Channel,
        task_id: &TaskId,
        observer: &dyn TaskObserver,
    ) -> Result<TrackOutcome, TaskError> {
        self.poll_until_terminal(channel, task_id, observer, 0).await
    }

    /// The loop behind [`Tracker::observe`]. `last_progress` seeds the
    /// value used when a sample omits its progress.
    pub(crate) async fn poll_until_terminal(
        &self,
        channel: &Channel,
        task_id: &TaskId,
        observer: &dyn TaskObserver,
        mut last_progress: u8,
    ) -> Result<TrackOutcome, TaskError> {
        let mut polls: u32 = 0;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    tracing::info!(channel = %channel, task_id = %task_id, "Observation abandoned");
                    return Ok(TrackOutcome::Abandoned);
                }
                fetched = self.server.fetch_status(task_id) => fetched,
            };

            let response = fetched.map_err(|e| {
                tracing::warn!(
                    channel = %channel,
                    task_id = %task_id,
                    polls,
                    error = %e,
                    "Status fetch failed; task stays resumable",
                );
                TaskError::PollFailed {
                    channel: channel.clone(),
                    task_id: task_id.clone(),
                    message: e.user_message(),
                }
            })?;
            polls += 1;

            let record = StatusRecord::from_response(response, last_progress);
            last_progress = record.progress;

            tracing::debug!(
                channel = %channel,
                task_id = %task_id,
                status = %record.status,
                progress = record.progress,
                log_lines = record.logs.len(),
                "Task status",
            );
            observer.on_update(channel, &record);

            if record.is_terminal() {
                self.finalize(channel, task_id, observer, &record).await?;
                tracing::info!(
                    channel = %channel,
                    task_id = %task_id,
                    status = %record.status,
                    polls,
                    "Task finished",
                );
                return Ok(TrackOutcome::Completed(record));
            }

            tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    tracing::info!(channel = %channel, task_id = %task_id, "Observation abandoned");
                    return Ok(TrackOutcome::Abandoned);
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// Clear the persisted id, then hand the terminal record to the
    /// observer.
    ///
    /// The id is only cleared if the channel still holds `task_id`; a job
    /// submitted on the same channel since then keeps its entry.
    pub(crate) async fn finalize(
        &self,
        channel: &Channel,
        task_id: &TaskId,
        observer: &dyn TaskObserver,
        record: &StatusRecord,
    ) -> Result<(), TaskError> {
        if !self.store.clear_if(channel, task_id).await? {
            tracing::debug!(
                channel = %channel,
                task_id = %task_id,
                "Channel no longer holds this task; leaving its entry in place",
            );
        }
        observer.on_terminal(channel, record);
        Ok(())
    }
}
