//! Long-running task tracking for the scribe server.
//!
//! Submits server-executed jobs (transcription, diarization, model
//! installs, translation-model downloads), polls their status until a
//! terminal state, and resumes observation in a later run from the task
//! id persisted per channel.
//!
//! - [`api::TaskApi`] -- HTTP client for the server endpoints.
//! - [`tracker::Tracker`] -- submit / observe / resume operations.
//! - [`manager::TaskManager`] -- one spawned poll loop per channel.
//! - [`observer::TaskObserver`] -- callback boundary for UIs.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod jobs;
pub mod manager;
pub mod observer;
pub mod outcome;
pub mod payload;
pub mod poller;
pub mod resume;
pub mod server;
pub mod submit;
pub mod tracker;

pub use config::PollConfig;
pub use error::TaskError;
pub use manager::TaskManager;
pub use observer::TaskObserver;
pub use outcome::TrackOutcome;
pub use payload::Payload;
pub use tracker::Tracker;
