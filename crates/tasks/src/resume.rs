//! Resuming observation from a persisted task id.
//!
//! Run once per channel when an observing process starts. Order matters:
//! the persisted id is read, one snapshot is fetched and delivered, and
//! only a non-terminal snapshot leads to a new poll loop.

use futures::future::join_all;
use scribe_core::channel::Channel;
use scribe_core::status::StatusRecord;

use crate::error::TaskError;
use crate::observer::TaskObserver;
use crate::outcome::TrackOutcome;
use crate::tracker::Tracker;

impl Tracker {
    /// Resume observing whatever task is persisted for `channel`.
    ///
    /// - Nothing persisted: [`TrackOutcome::Idle`], no callbacks.
    /// - Snapshot fetch fails: the id is cleared and
    ///   [`TrackOutcome::Unresolvable`] returned, no callbacks.
    /// - Terminal snapshot: one `on_update`, then finalization,
    ///   [`TrackOutcome::Finalized`]; no poll loop.
    /// - Otherwise: one `on_update` for the snapshot, then the poll loop.
    pub async fn resume(
        &self,
        channel: &Channel,
        observer: &dyn TaskObserver,
    ) -> Result<TrackOutcome, TaskError> {
        let Some(task_id) = self.store.get(channel).await? else {
            tracing::debug!(channel = %channel, "Nothing to resume");
            return Ok(TrackOutcome::Idle);
        };

        let fetched = tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Ok(TrackOutcome::Abandoned),
            fetched = self.server.fetch_status(&task_id) => fetched,
        };

        let snapshot = match fetched {
            Ok(response) => StatusRecord::from_response(response, 0),
            Err(e) => {
                // The task's fate is unknowable; fall back to idle.
                tracing::warn!(
                    channel = %channel,
                    task_id = %task_id,
                    error = %e,
                    "Persisted task no longer resolves; clearing it",
                );
                self.store.clear_if(channel, &task_id).await?;
                return Ok(TrackOutcome::Unresolvable { task_id });
            }
        };

        tracing::info!(
            channel = %channel,
            task_id = %task_id,
            status = %snapshot.status,
            progress = snapshot.progress,
            "Resuming task",
        );
        observer.on_update(channel, &snapshot);

        if snapshot.is_terminal() {
            self.finalize(channel, &task_id, observer, &snapshot).await?;
            return Ok(TrackOutcome::Finalized(snapshot));
        }

        tokio::select! {
            biased;
            _ = self.stop.cancelled() => return Ok(TrackOutcome::Abandoned),
            _ = tokio::time::sleep(self.config.interval) => {}
        }

        self.poll_until_terminal(channel, &task_id, observer, snapshot.progress)
            .await
    }

    /// Resume every channel that has a persisted task, concurrently.
    ///
    /// Channels are independent: one channel failing does not affect the
    /// others, so each gets its own result.
    pub async fn resume_all(
        &self,
        observer: &dyn TaskObserver,
    ) -> Result<Vec<(Channel, Result<TrackOutcome, TaskError>)>, TaskError> {
        let channels: Vec<Channel> = self
            .store
            .entries()
            .await?
            .into_iter()
            .map(|(channel, _)| channel)
            .collect();

        let outcomes = join_all(
            channels
                .iter()
                .map(|channel| self.resume(channel, observer)),
        )
        .await;

        Ok(channels.into_iter().zip(outcomes).collect())
    }
}
