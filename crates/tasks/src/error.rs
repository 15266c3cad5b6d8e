use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use scribe_store::StoreError;

/// Errors surfaced by the tracking operations.
///
/// A task that the server reports as `error` is not one of these: it is
/// delivered to the observer's terminal callback. A persisted id that no
/// longer resolves during resume is not one either: it is cleared and
/// reported as [`TrackOutcome::Unresolvable`](crate::TrackOutcome::Unresolvable).
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The server rejected the job request. Nothing was persisted.
    #[error("Submission on {channel} failed: {message}")]
    SubmissionFailed { channel: Channel, message: String },

    /// A status fetch failed while observing. The task id stays
    /// persisted so a later resume can pick the task up again.
    #[error("Polling task {task_id} on {channel} failed: {message}")]
    PollFailed {
        channel: Channel,
        task_id: TaskId,
        message: String,
    },

    /// The identity store failed.
    #[error("Task store error: {0}")]
    Store(#[from] StoreError),

    /// A spawned observation loop panicked or was aborted.
    #[error("Observation loop for {channel} ended abnormally: {message}")]
    LoopFailed { channel: Channel, message: String },
}
