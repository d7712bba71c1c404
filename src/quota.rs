use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Deserialize;
use thiserror::Error;

/// Ceiling for submissions made on the shared server credential.
pub const SERVER_QUOTA_CEILING: u32 = 3;

/// Failure of the external quota lookup. Best-effort only, never fatal.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("quota lookup failed: {0}")]
    Lookup(String),

    #[error("no quota source configured")]
    NotConfigured,
}

/// Boundary to the external quota store: one read, keyed by identity.
pub trait QuotaSource {
    async fn lookup(&self, identity_id: &str) -> Result<u32, QuotaError>;
}

/// Bounded usage counter for the current identity.
///
/// `used` is refreshed from the external source on identity change and bumped
/// locally after a confirmed server-quota submission. The local bump is a
/// responsiveness optimization: the next refresh is the source of truth and
/// simply replaces the value ("last refresh wins"). Ceiling enforcement is a
/// pre-flight check in the submitter, not here.
#[derive(Debug, Clone, Default)]
pub struct QuotaTracker {
    used: Arc<AtomicU32>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Relaxed)
    }

    /// True once the server-credential path has no submissions left.
    pub fn is_exhausted(&self) -> bool {
        self.used() >= SERVER_QUOTA_CEILING
    }

    /// Replace `used` with the external source's value.
    ///
    /// Failures are logged and ignored — the quota display is best-effort
    /// and must never block anything.
    pub async fn refresh(&self, source: &impl QuotaSource, identity_id: &str) {
        match source.lookup(identity_id).await {
            Ok(used) => {
                self.used.store(used, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(identity = identity_id, error = %e, "quota refresh failed, keeping previous value");
            }
        }
    }

    /// Optimistic local bump after a confirmed server-quota submission.
    ///
    /// Must not be called for submissions made on a caller-supplied
    /// credential; that path is quota-exempt.
    pub fn increment(&self) {
        self.used.fetch_add(1, Ordering::Relaxed);
    }

    /// Back to the empty default, used on the absent-identity transition.
    pub fn reset(&self) {
        self.used.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Deserialize)]
struct QuotaRow {
    used: u32,
}

/// HTTP-backed quota source: `GET {base}/{identity_id}` returning `{"used": n}`.
pub struct HttpQuotaSource {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpQuotaSource {
    /// `base_url = None` leaves every lookup failing as not-configured,
    /// which the tracker absorbs silently.
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

impl QuotaSource for HttpQuotaSource {
    async fn lookup(&self, identity_id: &str) -> Result<u32, QuotaError> {
        let base = self.base_url.as_deref().ok_or(QuotaError::NotConfigured)?;
        let row = self
            .client
            .get(format!("{base}/{identity_id}"))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| QuotaError::Lookup(e.to_string()))?
            .json::<QuotaRow>()
            .await
            .map_err(|e| QuotaError::Lookup(e.to_string()))?;
        Ok(row.used)
    }
}
