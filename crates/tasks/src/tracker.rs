//! Shared handle for the tracking operations.
//!
//! The operations themselves live next to their concerns:
//! [`submit`](crate::submit), [`poller`](crate::poller) and
//! [`resume`](crate::resume) each add methods to [`Tracker`].

use std::sync::Arc;

use scribe_core::status::StatusRecord;
use scribe_core::types::TaskId;
use scribe_store::IdentityStore;
use tokio_util::sync::CancellationToken;

use crate::api::TaskApiError;
use crate::config::PollConfig;
use crate::server::TaskServer;

/// Server, identity store and poll settings bundled together.
///
/// Cheap to clone. Every clone shares the same stop token unless
/// re-scoped with [`Tracker::scoped`].
#[derive(Clone)]
pub struct Tracker {
    pub(crate) server: Arc<dyn TaskServer>,
    pub(crate) store: Arc<dyn IdentityStore>,
    pub(crate) config: PollConfig,
    /// Cancelled when observers should stop ("navigation").
    pub(crate) stop: CancellationToken,
}

impl Tracker {
    pub fn new(
        server: Arc<dyn TaskServer>,
        store: Arc<dyn IdentityStore>,
        config: PollConfig,
    ) -> Self {
        Self {
            server,
            store,
            config,
            stop: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Token that stops every loop run through this tracker.
    ///
    /// Cancelling it abandons observation at the next fetch or wait;
    /// persisted ids are left in place so a later run can resume.
    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// A clone whose loops stop on `stop` instead of this tracker's token.
    pub(crate) fn scoped(&self, stop: CancellationToken) -> Self {
        Self {
            stop,
            ..self.clone()
        }
    }

    /// Fetch one status sample without touching the store.
    pub async fn snapshot(&self, task_id: &TaskId) -> Result<StatusRecord, TaskApiError> {
        let response = self.server.fetch_status(task_id).await?;
        Ok(StatusRecord::from_response(response, 0))
    }
}
