//! Events emitted while tasks are tracked.
//!
//! The [`TaskManager`](crate::TaskManager) publishes these on a
//! [`tokio::sync::broadcast`] channel so any number of UIs can follow
//! every channel at once.

use scribe_core::channel::Channel;
use scribe_core::status::StatusRecord;
use scribe_core::types::TaskId;
use serde::Serialize;

/// A tracking event for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A job was accepted and its id persisted.
    Submitted { channel: Channel, task_id: TaskId },

    /// A status sample (live poll or resume snapshot).
    Update {
        channel: Channel,
        record: StatusRecord,
    },

    /// The task reached `done` or `error` and was finalized.
    Terminal {
        channel: Channel,
        record: StatusRecord,
    },

    /// Polling stopped on a transport failure; the id stays persisted.
    PollFailed {
        channel: Channel,
        task_id: TaskId,
        error: String,
    },

    /// A persisted id no longer resolved on resume and was cleared.
    ResumeCleared { channel: Channel, task_id: TaskId },
}

impl TaskEvent {
    pub fn channel(&self) -> &Channel {
        match self {
            TaskEvent::Submitted { channel, .. }
            | TaskEvent::Update { channel, .. }
            | TaskEvent::Terminal { channel, .. }
            | TaskEvent::PollFailed { channel, .. }
            | TaskEvent::ResumeCleared { channel, .. } => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::status::TaskStatus;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = TaskEvent::Update {
            channel: Channel::transcription(),
            record: StatusRecord {
                status: TaskStatus::Running,
                progress: 42,
                logs: vec!["loading model".into()],
                error: None,
                result: None,
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["channel"], "transcription");
        assert_eq!(json["record"]["status"], "running");
        assert_eq!(json["record"]["progress"], 42);
        assert!(json["record"].get("error").is_none());
    }
}
