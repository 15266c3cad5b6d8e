//! Task status as reported by the server.
//!
//! The server answers `GET /api/tasks/{task_id}` with a
//! [`StatusResponse`]. Observers never see that raw shape: it is
//! normalized into a [`StatusRecord`] (progress clamped to 0-100 and
//! carried over when missing, logs defaulted to empty).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a server-side task.
///
/// Unknown values are kept verbatim in [`TaskStatus::Other`] and are
/// treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Error,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Other(raw) => raw,
        }
    }

    /// `done` and `error` end a task's lifecycle; nothing is polled after them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "done" => Self::Done,
            "error" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /api/tasks/{task_id}` exactly as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// A normalized status sample delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub status: TaskStatus,
    /// Completion percentage, 0-100.
    pub progress: u8,
    /// Full log history as of this sample. Replaces any earlier view.
    pub logs: Vec<String>,
    /// Human-readable failure message (`status = error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Task-specific payload (`status = done`), passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl StatusRecord {
    /// Normalize a raw response. `last_progress` fills in a missing
    /// progress value.
    pub fn from_response(response: StatusResponse, last_progress: u8) -> Self {
        Self {
            status: response.status,
            progress: normalize_progress(response.progress, last_progress),
            logs: response.logs.unwrap_or_default(),
            error: response.error,
            result: response.result,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Round and clamp a wire progress value to 0-100, falling back to
/// `last` when the value is missing or not a finite number.
pub fn normalize_progress(raw: Option<f64>, last: u8) -> u8 {
    match raw {
        Some(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u8,
        _ => last,
    }
}
