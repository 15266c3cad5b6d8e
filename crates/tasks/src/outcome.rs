use scribe_core::status::StatusRecord;
use scribe_core::types::TaskId;

/// How an observation of a channel ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Nothing was persisted for the channel; no callbacks were made.
    Idle,
    /// The persisted task no longer resolved on the server. Its id was
    /// cleared and no callbacks were made.
    Unresolvable { task_id: TaskId },
    /// The resume snapshot was already terminal; no poll loop ran.
    Finalized(StatusRecord),
    /// The poll loop observed the terminal status.
    Completed(StatusRecord),
    /// Observation was stopped before a terminal status; the task id
    /// remains persisted.
    Abandoned,
}

impl TrackOutcome {
    /// The terminal record, when the task finished.
    pub fn terminal_record(&self) -> Option<&StatusRecord> {
        match self {
            TrackOutcome::Finalized(record) | TrackOutcome::Completed(record) => Some(record),
            _ => None,
        }
    }
}
