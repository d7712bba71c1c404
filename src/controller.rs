use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::engine::TranslateApi;
use crate::poller::{JobCache, JobPoller, PollHandle};
use crate::quota::{QuotaSource, QuotaTracker};
use crate::session::Identity;

/// Drives the session-scoped lifecycle: on every identity transition it
/// rebinds the job cache, refreshes the quota and restarts (or stops) the
/// poll loop.
///
/// All state here is initialized empty, populated on the identity-present
/// transition and cleared synchronously on the identity-absent one.
pub struct LifecycleController<A: TranslateApi + 'static, Q: QuotaSource> {
    api: Arc<A>,
    quota_source: Q,
    quota: QuotaTracker,
    cache: JobCache,
    poll_every: Duration,
    poll: Option<PollHandle>,
}

impl<A: TranslateApi + 'static, Q: QuotaSource> LifecycleController<A, Q> {
    pub fn new(api: Arc<A>, quota_source: Q, poll_every: Duration) -> Self {
        Self {
            api,
            quota_source,
            quota: QuotaTracker::new(),
            cache: JobCache::new(),
            poll_every,
            poll: None,
        }
    }

    pub fn quota(&self) -> QuotaTracker {
        self.quota.clone()
    }

    pub fn cache(&self) -> JobCache {
        self.cache.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    /// React to one identity transition.
    ///
    /// The previous poll loop is cancelled first in every case, so no tick
    /// can fire against a stale identity. A present identity then gets a
    /// quota refresh and a fresh poll loop (whose immediate first tick is
    /// the job-list refresh for the new identity); an absent one gets the
    /// cache and quota cleared back to their empty defaults.
    pub async fn handle_transition(&mut self, identity: Option<Identity>) {
        if let Some(handle) = self.poll.take() {
            handle.cancel();
        }
        match identity {
            Some(identity) => {
                tracing::debug!(identity = %identity.id, "session active, starting poll loop");
                self.cache.bind(Some(identity.id.clone()));
                self.quota.refresh(&self.quota_source, &identity.id).await;
                self.poll = Some(JobPoller::start(
                    self.api.clone(),
                    self.cache.clone(),
                    identity.id,
                    self.poll_every,
                ));
            }
            None => {
                tracing::debug!("session ended, clearing cached state");
                self.cache.bind(None);
                self.quota.reset();
            }
        }
    }

    /// Follow the session gate until `shutdown` fires or the gate is dropped.
    pub async fn run(
        &mut self,
        mut sessions: watch::Receiver<Option<Identity>>,
        shutdown: CancellationToken,
    ) {
        let current = sessions.borrow_and_update().clone();
        self.handle_transition(current).await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let identity = sessions.borrow_and_update().clone();
                    self.handle_transition(identity).await;
                }
            }
        }
        self.stop();
    }

    /// Cancel the poll loop on teardown. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.cancel();
        }
    }
}
