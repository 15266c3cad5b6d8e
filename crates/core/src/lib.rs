//! Domain types shared by the scribe task tracking crates.
//!
//! - [`channel::Channel`] -- logical slot a tracked task lives in.
//! - [`types::TaskId`] -- opaque server-minted task identifier.
//! - [`status::StatusRecord`] -- normalized view of a task's status.

pub mod channel;
pub mod error;
pub mod status;
pub mod types;
