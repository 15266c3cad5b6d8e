//! Observer callbacks.
//!
//! `on_update` is called for every status sample, in fetch order.
//! `on_terminal` is called exactly once per task lifecycle, after the
//! persisted id was cleared, or never when a resumed id no longer
//! resolves.

use scribe_core::channel::Channel;
use scribe_core::status::StatusRecord;
use tokio::sync::broadcast;

use crate::events::TaskEvent;

/// Sink for task status records.
///
/// Callbacks run on the poll loop's task and must not block.
pub trait TaskObserver: Send + Sync {
    fn on_update(&self, channel: &Channel, record: &StatusRecord);

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TaskObserver for NoopObserver {
    fn on_update(&self, _channel: &Channel, _record: &StatusRecord) {}

    fn on_terminal(&self, _channel: &Channel, _record: &StatusRecord) {}
}

/// Observer that republishes callbacks as [`TaskEvent`]s.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    event_tx: broadcast::Sender<TaskEvent>,
}

impl BroadcastObserver {
    pub fn new(event_tx: broadcast::Sender<TaskEvent>) -> Self {
        Self { event_tx }
    }
}

impl TaskObserver for BroadcastObserver {
    fn on_update(&self, channel: &Channel, record: &StatusRecord) {
        // No subscribers is fine.
        let _ = self.event_tx.send(TaskEvent::Update {
            channel: channel.clone(),
            record: record.clone(),
        });
    }

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord) {
        let _ = self.event_tx.send(TaskEvent::Terminal {
            channel: channel.clone(),
            record: record.clone(),
        });
    }
}

/// Forwards every callback to two observers, `first` then `second`.
pub(crate) struct Fanout<A, B> {
    pub first: A,
    pub second: B,
}

impl<A: TaskObserver, B: TaskObserver> TaskObserver for Fanout<A, B> {
    fn on_update(&self, channel: &Channel, record: &StatusRecord) {
        self.first.on_update(channel, record);
        self.second.on_update(channel, record);
    }

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord) {
        self.first.on_terminal(channel, record);
        self.second.on_terminal(channel, record);
    }
}

impl<T: TaskObserver + ?Sized> TaskObserver for std::sync::Arc<T> {
    fn on_update(&self, channel: &Channel, record: &StatusRecord) {
        (**self).on_update(channel, record);
    }

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord) {
        (**self).on_terminal(channel, record);
    }
}
