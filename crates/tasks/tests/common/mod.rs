#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scribe_core::channel::Channel;
use scribe_core::status::{StatusRecord, StatusResponse};
use scribe_core::types::TaskId;
use scribe_store::{IdentityStore, MemoryStore};
use scribe_tasks::api::TaskApiError;
use scribe_tasks::server::TaskServer;
use scribe_tasks::{Payload, PollConfig, TaskObserver, Tracker};

pub fn id(raw: &str) -> TaskId {
    TaskId::new(raw).unwrap()
}

/// One scripted answer to a status fetch.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(serde_json::Value),
    /// Fail with this HTTP status.
    Fail(u16),
}

/// In-process fake of the task server.
///
/// Status replies are consumed in order per task; the last reply
/// repeats once the script runs out.
#[derive(Default)]
pub struct ScriptedServer {
    submissions: Mutex<VecDeque<Result<String, (u16, String)>>>,
    statuses: Mutex<HashMap<String, VecDeque<Reply>>>,
    fetches: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(String, Payload)>>,
}

impl ScriptedServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next submission succeeds with `task_id`.
    pub fn accept(&self, task_id: &str) {
        self.submissions
            .lock()
            .unwrap()
            .push_back(Ok(task_id.to_string()));
    }

    /// The next submission is rejected with `status` and `body`.
    pub fn reject(&self, status: u16, body: &str) {
        self.submissions
            .lock()
            .unwrap()
            .push_back(Err((status, body.to_string())));
    }

    /// Append status replies for `task_id`.
    pub fn script(&self, task_id: &str, replies: impl IntoIterator<Item = Reply>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(replies);
    }

    /// Number of status fetches issued for `task_id`.
    pub fn fetch_count(&self, task_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == task_id)
            .count()
    }

    pub fn submitted(&self) -> Vec<(String, Payload)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskServer for ScriptedServer {
    async fn submit_job(&self, endpoint: &str, payload: Payload) -> Result<TaskId, TaskApiError> {
        self.submitted
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload));
        match self.submissions.lock().unwrap().pop_front() {
            Some(Ok(task_id)) => Ok(id(&task_id)),
            Some(Err((status, body))) => Err(TaskApiError::ApiError { status, body }),
            None => Err(TaskApiError::ApiError {
                status: 500,
                body: String::new(),
            }),
        }
    }

    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusResponse, TaskApiError> {
        self.fetches
            .lock()
            .unwrap()
            .push(task_id.as_str().to_string());

        let reply = {
            let mut statuses = self.statuses.lock().unwrap();
            let script = statuses.get_mut(task_id.as_str());
            match script {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Status(body)) => Ok(serde_json::from_value(body).unwrap()),
            Some(Reply::Fail(status)) => Err(TaskApiError::ApiError {
                status,
                body: String::new(),
            }),
            None => Err(TaskApiError::ApiError {
                status: 404,
                body: r#"{"detail":"Task not found"}"#.to_string(),
            }),
        }
    }
}

/// A callback seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Update(Channel, StatusRecord),
    Terminal(Channel, StatusRecord),
}

/// Observer that records every callback in order.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Seen>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<StatusRecord> {
        self.seen()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::Update(_, record) => Some(record),
                Seen::Terminal(..) => None,
            })
            .collect()
    }

    pub fn terminals(&self) -> Vec<StatusRecord> {
        self.seen()
            .into_iter()
            .filter_map(|seen| match seen {
                Seen::Terminal(_, record) => Some(record),
                Seen::Update(..) => None,
            })
            .collect()
    }
}

impl TaskObserver for RecordingObserver {
    fn on_update(&self, channel: &Channel, record: &StatusRecord) {
        self.seen
            .lock()
            .unwrap()
            .push(Seen::Update(channel.clone(), record.clone()));
    }

    fn on_terminal(&self, channel: &Channel, record: &StatusRecord) {
        self.seen
            .lock()
            .unwrap()
            .push(Seen::Terminal(channel.clone(), record.clone()));
    }
}

/// A tracker over `server` and a fresh in-memory store.
pub fn tracker(server: &Arc<ScriptedServer>) -> (Tracker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let tracker = Tracker::new(
        Arc::clone(server) as Arc<dyn TaskServer>,
        Arc::clone(&store) as Arc<dyn IdentityStore>,
        PollConfig::default(),
    );
    (tracker, store)
}

pub fn running(progress: u8) -> Reply {
    Reply::Status(serde_json::json!({ "status": "running", "progress": progress }))
}
