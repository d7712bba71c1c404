use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::{Job, TranslateApi};

#[derive(Debug, Default)]
struct CacheState {
    /// Identity the cached snapshot belongs to. Fetch results tagged with a
    /// different identity are discarded (the "fetch epoch" check).
    owner: Option<String>,
    jobs: Vec<Job>,
}

/// Read-only display cache of the server's job snapshot.
///
/// Written only by the fetch path below; every write is a full replacement
/// of the previous snapshot (last writer wins, no merge), which keeps the
/// view idempotent against missed or duplicated polls.
#[derive(Debug, Clone, Default)]
pub struct JobCache {
    inner: Arc<Mutex<CacheState>>,
}

impl JobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached jobs, in the order the server returned them.
    pub fn jobs(&self) -> Vec<Job> {
        self.inner.lock().expect("job cache poisoned").jobs.clone()
    }

    pub fn owner(&self) -> Option<String> {
        self.inner.lock().expect("job cache poisoned").owner.clone()
    }

    /// Rebind the cache to a new identity (or none), clearing the snapshot.
    ///
    /// Clearing happens synchronously so that a logout leaves nothing from
    /// the previous identity visible, whatever in-flight fetches remain.
    pub fn bind(&self, owner: Option<String>) {
        let mut state = self.inner.lock().expect("job cache poisoned");
        state.owner = owner;
        state.jobs.clear();
    }

    /// Replace the snapshot iff the cache is still bound to `owner_id`.
    ///
    /// Returns false when the result arrived for a stale identity and was
    /// dropped to avoid cross-identity leakage.
    pub fn replace(&self, owner_id: &str, jobs: Vec<Job>) -> bool {
        let mut state = self.inner.lock().expect("job cache poisoned");
        if state.owner.as_deref() != Some(owner_id) {
            return false;
        }
        state.jobs = jobs;
        true
    }
}

/// Handle to a running poll loop. The owner cancels it exactly once, on
/// identity change or teardown; dropping the handle also stops the loop so
/// no orphaned timer can keep referencing a stale identity.
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop. No further tick fires once this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Await loop termination, for tests and orderly shutdown.
    pub async fn stopped(mut self) {
        self.token.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Periodically re-fetches the full job list while a session is active.
pub struct JobPoller;

impl JobPoller {
    /// Start polling `every` interval for `identity_id`. The first tick
    /// fires immediately, covering the job refresh on session start.
    pub fn start<A>(
        api: Arc<A>,
        cache: JobCache,
        identity_id: String,
        every: Duration,
    ) -> PollHandle
    where
        A: TranslateApi + 'static,
    {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        Self::refresh_once(api.as_ref(), &cache, &identity_id).await;
                    }
                }
            }
            tracing::debug!(identity = %identity_id, "poll loop stopped");
        });
        PollHandle { token, task }
    }

    /// One fetch-and-replace cycle.
    ///
    /// Shared by the periodic tick, the post-submission refresh and the
    /// manual refresh affordance; an ad-hoc call does not reset the timer.
    /// Fetch failures are logged and the previous snapshot is kept — they
    /// are routine and self-heal on the next tick.
    pub async fn refresh_once<A: TranslateApi>(api: &A, cache: &JobCache, identity_id: &str) {
        match api.jobs(identity_id).await {
            Ok(jobs) => {
                if !cache.replace(identity_id, jobs) {
                    tracing::debug!(
                        identity = identity_id,
                        "dropped job snapshot fetched under a stale identity"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    identity = identity_id,
                    error = %e,
                    "job list refresh failed, keeping cached snapshot"
                );
            }
        }
    }
}
