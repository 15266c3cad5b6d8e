//! Per-channel observation loop manager.
//!
//! [`TaskManager`] runs every poll loop on its own tokio task and keeps
//! at most one loop per channel: starting a loop for a channel stops the
//! previous one first. Tracking events are broadcast via a
//! [`tokio::sync::broadcast`] channel; call [`TaskManager::subscribe`] to
//! receive them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::TaskEvent;
use crate::jobs::JobRequest;
use crate::observer::{BroadcastObserver, Fanout, TaskObserver};
use crate::outcome::TrackOutcome;
use crate::payload::Payload;
use crate::tracker::Tracker;

/// Broadcast channel capacity for tracking events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long [`TaskManager::shutdown`] waits for each loop to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Runs and supervises observation loops, one per channel.
pub struct TaskManager {
    tracker: Tracker,
    /// Loop tasks indexed by channel.
    loops: RwLock<HashMap<Channel, ManagedLoop>>,
    next_generation: AtomicU64,
    event_tx: broadcast::Sender<TaskEvent>,
}

/// Internal bookkeeping for a single channel's loop.
///
/// The entry stays registered until the loop body has returned, even
/// while [`TaskManager::wait`] holds the join handle.
struct ManagedLoop {
    generation: u64,
    /// Taken by the first `wait` on the channel.
    task_handle: Option<JoinHandle<Result<TrackOutcome, TaskError>>>,
    /// Per-loop token (child of the tracker's stop token).
    cancel: CancellationToken,
    /// Cancelled once the loop body has returned.
    done: CancellationToken,
}

impl ManagedLoop {
    fn is_running(&self) -> bool {
        !self.done.is_cancelled()
    }
}

/// What a spawned loop does first.
enum LoopStart {
    /// Poll a freshly submitted task.
    Observe(TaskId),
    /// Resume whatever is persisted for the channel.
    Resume,
}

impl TaskManager {
    pub fn new(tracker: Tracker) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tracker,
            loops: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            event_tx,
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Subscribe to tracking events for every channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Submit a job and start observing it on `channel`.
    ///
    /// A loop already running on `channel` is stopped; its task keeps
    /// running on the server but is no longer observed.
    pub async fn track(
        &self,
        channel: Channel,
        endpoint: &str,
        payload: Payload,
        observer: Arc<dyn TaskObserver>,
    ) -> Result<TaskId, TaskError> {
        let task_id = self.tracker.submit(&channel, endpoint, payload).await?;
        let _ = self.event_tx.send(TaskEvent::Submitted {
            channel: channel.clone(),
            task_id: task_id.clone(),
        });

        self.spawn_loop(channel, LoopStart::Observe(task_id.clone()), observer, true)
            .await;
        Ok(task_id)
    }

    /// [`track`](Self::track) for a prepared [`JobRequest`].
    pub async fn track_job(
        &self,
        request: JobRequest,
        observer: Arc<dyn TaskObserver>,
    ) -> Result<(Channel, TaskId), TaskError> {
        let channel = request.channel.clone();
        let task_id = self
            .track(request.channel, &request.endpoint, request.payload, observer)
            .await?;
        Ok((channel, task_id))
    }

    /// Resume `channel` on a new loop unless one is already running.
    ///
    /// Returns whether a loop was started.
    pub async fn resume(&self, channel: Channel, observer: Arc<dyn TaskObserver>) -> bool {
        self.spawn_loop(channel, LoopStart::Resume, observer, false)
            .await
    }

    /// Resume every channel with a persisted task.
    ///
    /// Returns the channels a loop was started for.
    pub async fn resume_all(
        &self,
        observer: Arc<dyn TaskObserver>,
    ) -> Result<Vec<Channel>, TaskError> {
        let entries = self.tracker.store().entries().await?;
        tracing::info!(count = entries.len(), "Resuming persisted tasks");

        let mut started = Vec::new();
        for (channel, _) in entries {
            if self.resume(channel.clone(), Arc::clone(&observer)).await {
                started.push(channel);
            }
        }
        Ok(started)
    }

    /// Whether a loop is currently running for `channel`.
    pub async fn is_active(&self, channel: &Channel) -> bool {
        self.loops
            .read()
            .await
            .get(channel)
            .is_some_and(ManagedLoop::is_running)
    }

    /// Channels with a running loop, sorted by name.
    pub async fn active_channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self
            .loops
            .read()
            .await
            .iter()
            .filter(|(_, managed)| managed.is_running())
            .map(|(channel, _)| channel.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Wait for the loop on `channel` to finish and return its outcome.
    ///
    /// Returns `Ok(None)` when no loop was started for the channel, or when
    /// another caller collects the outcome; the latter still returns only
    /// after the loop has finished.
    ///
    /// The loop counts as active until it returns, so neither
    /// [`resume`](Self::resume) nor [`shutdown`](Self::shutdown) lose
    /// track of it while this call is pending.
    pub async fn wait(&self, channel: &Channel) -> Result<Option<TrackOutcome>, TaskError> {
        let (generation, task_handle, done) = {
            let mut loops = self.loops.write().await;
            let Some(managed) = loops.get_mut(channel) else {
                return Ok(None);
            };
            (
                managed.generation,
                managed.task_handle.take(),
                managed.done.clone(),
            )
        };

        let Some(task_handle) = task_handle else {
            done.cancelled().await;
            return Ok(None);
        };
        let joined = task_handle.await;

        {
            let mut loops = self.loops.write().await;
            if loops
                .get(channel)
                .is_some_and(|managed| managed.generation == generation)
            {
                loops.remove(channel);
            }
        }

        match joined {
            Ok(result) => result.map(Some),
            Err(e) => Err(TaskError::LoopFailed {
                channel: channel.clone(),
                message: e.to_string(),
            }),
        }
    }

    /// Stop every loop without finalizing anything.
    ///
    /// Persisted ids stay in the store, so a later run resumes them.
    /// Cancels the tracker's stop token, then waits up to 5 seconds per
    /// loop for a clean exit. The manager cannot start loops afterwards.
    pub async fn shutdown(&self) {
        tracing::info!("Stopping task observation");
        self.tracker.stop_token().cancel();

        let mut loops = self.loops.write().await;
        for (channel, managed) in loops.drain() {
            managed.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_GRACE, managed.done.cancelled())
                .await
                .is_err()
            {
                tracing::warn!(channel = %channel, "Observation loop did not stop in time");
            }
        }

        tracing::info!("Task observation stopped");
    }

    // ---- private helpers ----

    /// Spawn a loop for `channel`.
    ///
    /// With `replace`, a running loop is stopped first; otherwise a running
    /// loop wins and nothing is spawned. Returns whether a loop was spawned.
    async fn spawn_loop(
        &self,
        channel: Channel,
        start: LoopStart,
        observer: Arc<dyn TaskObserver>,
        replace: bool,
    ) -> bool {
        let mut loops = self.loops.write().await;

        if let Some(previous) = loops.get(&channel) {
            if previous.is_running() {
                if !replace {
                    tracing::debug!(channel = %channel, "Loop already running");
                    return false;
                }
                tracing::info!(channel = %channel, "Stopping previous observation loop");
            }
            previous.cancel.cancel();
        }

        let cancel = self.tracker.stop_token().child_token();
        let tracker = self.tracker.scoped(cancel.clone());
        let event_tx = self.event_tx.clone();
        let observer = Fanout {
            first: observer,
            second: BroadcastObserver::new(self.event_tx.clone()),
        };
        let loop_channel = channel.clone();
        let done = CancellationToken::new();
        let finished = done.clone().drop_guard();

        let task_handle = tokio::spawn(async move {
            let _finished = finished;
            run_loop(&tracker, &loop_channel, start, &observer, &event_tx).await
        });

        loops.insert(
            channel,
            ManagedLoop {
                generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
                task_handle: Some(task_handle),
                cancel,
                done,
            },
        );
        true
    }
}

/// Body of a spawned loop: observe or resume, then publish the
/// failure-side events observers do not see.
async fn run_loop(
    tracker: &Tracker,
    channel: &Channel,
    start: LoopStart,
    observer: &dyn TaskObserver,
    event_tx: &broadcast::Sender<TaskEvent>,
) -> Result<TrackOutcome, TaskError> {
    let result = match &start {
        LoopStart::Observe(task_id) => tracker.observe(channel, task_id, observer).await,
        LoopStart::Resume => tracker.resume(channel, observer).await,
    };

    match &result {
        Ok(TrackOutcome::Unresolvable { task_id }) => {
            let _ = event_tx.send(TaskEvent::ResumeCleared {
                channel: channel.clone(),
                task_id: task_id.clone(),
            });
        }
        Err(TaskError::PollFailed {
            task_id, message, ..
        }) => {
            let _ = event_tx.send(TaskEvent::PollFailed {
                channel: channel.clone(),
                task_id: task_id.clone(),
                error: message.clone(),
            });
        }
        Err(e) => {
            tracing::error!(channel = %channel, error = %e, "Observation loop failed");
        }
        Ok(_) => {}
    }

    result
}
