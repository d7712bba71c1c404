use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::{EngineError, FilePart, SubmitAck, TranslateApi, TranslationRequest};
use crate::error::ValidationError;
use crate::poller::{JobCache, JobPoller};
use crate::quota::QuotaTracker;
use crate::session::Identity;

/// Translation register forwarded to the engine as an opaque style tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    /// "Formal but natural"
    FormalNatural,
    /// "Novel Fantasy, Immersive, Dramatic" — the reference default.
    #[default]
    NovelFantasy,
    /// "Casual and easy to read"
    Casual,
    /// "Literature, Poetic"
    Literary,
}

impl Style {
    /// Wire value the engine expects for this style.
    pub fn tag(&self) -> &'static str {
        match self {
            Style::FormalNatural => "Formal but natural",
            Style::NovelFantasy => "Novel Fantasy, Immersive, Dramatic",
            Style::Casual => "Casual and easy to read",
            Style::Literary => "Literature, Poetic",
        }
    }
}

/// Phases of one submission attempt. Terminal in a single round-trip; there
/// is no retry and no transition out of the terminal phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    Submitting,
    Accepted,
    Rejected,
}

impl fmt::Display for SubmitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitPhase::Idle => write!(f, "IDLE"),
            SubmitPhase::Validating => write!(f, "VALIDATING"),
            SubmitPhase::Submitting => write!(f, "SUBMITTING"),
            SubmitPhase::Accepted => write!(f, "ACCEPTED"),
            SubmitPhase::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// What the user asked to submit, before any validation ran.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    /// Primary document. Required; its absence is the first rejection.
    pub document: Option<FilePart>,
    /// Optional font for embedding in the translated result.
    pub font: Option<FilePart>,
    pub style: Style,
    /// Caller opted into the bring-your-own-key path.
    pub use_own_key: bool,
    /// The caller-supplied credential itself.
    pub api_key: Option<String>,
}

impl SubmissionRequest {
    /// The quota-exempt path applies only when the flag is set and a
    /// credential is actually present.
    fn own_key(&self) -> Option<&str> {
        if !self.use_own_key {
            return None;
        }
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Why a submission attempt ended in `Rejected`.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Pre-flight rejection; nothing was sent over the network.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The engine or the network rejected the dispatched attempt.
    #[error("{0}")]
    Submission(#[from] EngineError),
}

impl SubmitError {
    /// Message to surface to the user: the engine's detail when it gave one,
    /// otherwise the local or generic message.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.to_string(),
            SubmitError::Submission(e) => e.user_message(),
        }
    }
}

/// Validates, packages and dispatches one submission to the engine.
///
/// Exactly one network call per attempt, no automatic retry. Acceptance
/// bumps the quota tracker (server-key path only) and triggers an immediate
/// job-list refresh independent of the periodic poll cadence.
pub struct JobSubmitter<A: TranslateApi> {
    api: Arc<A>,
    quota: QuotaTracker,
    cache: JobCache,
    target_lang: String,
    phase: SubmitPhase,
}

impl<A: TranslateApi> JobSubmitter<A> {
    pub fn new(api: Arc<A>, quota: QuotaTracker, cache: JobCache, target_lang: String) -> Self {
        Self {
            api,
            quota,
            cache,
            target_lang,
            phase: SubmitPhase::Idle,
        }
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    /// True while an attempt is in flight. The caller must gate its trigger
    /// on this; submission itself is not debounced.
    pub fn is_busy(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    /// Run one submission attempt to its terminal outcome.
    ///
    /// Validation is fail-fast in a fixed order, each check with its own
    /// user-facing message: document present, identity present, then the
    /// quota ceiling unless the attempt rides a caller-supplied credential.
    pub async fn submit(
        &mut self,
        identity: Option<&Identity>,
        req: SubmissionRequest,
    ) -> Result<SubmitAck, SubmitError> {
        self.phase = SubmitPhase::Validating;

        let document = match req.document.clone() {
            Some(d) => d,
            None => {
                self.phase = SubmitPhase::Rejected;
                return Err(ValidationError::MissingDocument.into());
            }
        };
        let identity = match identity {
            Some(i) => i,
            None => {
                self.phase = SubmitPhase::Rejected;
                return Err(ValidationError::MissingSession.into());
            }
        };
        let own_key = req.own_key();
        if own_key.is_none() && self.quota.is_exhausted() {
            self.phase = SubmitPhase::Rejected;
            return Err(ValidationError::QuotaExhausted.into());
        }

        let attempt = Uuid::new_v4();
        tracing::debug!(
            %attempt,
            identity = %identity.id,
            filename = %document.filename,
            style = req.style.tag(),
            own_key = own_key.is_some(),
            "dispatching translation request"
        );

        let wire = TranslationRequest {
            document,
            font: req.font.clone(),
            target_lang: self.target_lang.clone(),
            style: req.style.tag().to_string(),
            user_id: identity.id.clone(),
            api_key: own_key.map(str::to_string),
        };

        self.phase = SubmitPhase::Submitting;
        match self.api.translate(&wire).await {
            Ok(ack) => {
                if own_key.is_none() {
                    self.quota.increment();
                }
                // Out-of-band refresh so the new job shows up before the
                // next periodic tick.
                JobPoller::refresh_once(self.api.as_ref(), &self.cache, &identity.id).await;
                self.phase = SubmitPhase::Accepted;
                tracing::debug!(%attempt, job_id = %ack.job_id, "translation request queued");
                Ok(ack)
            }
            Err(e) => {
                self.phase = SubmitPhase::Rejected;
                tracing::debug!(%attempt, error = %e, "translation request rejected");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, Job, JobStatus};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockEngine {
        response: Result<SubmitAck, (u16, Option<String>)>,
        translate_calls: AtomicUsize,
        jobs_calls: AtomicUsize,
        last_request: Mutex<Option<TranslationRequest>>,
    }

    impl MockEngine {
        fn accepting() -> Self {
            Self {
                response: Ok(SubmitAck {
                    status: "queued".into(),
                    job_id: "j-new".into(),
                }),
                translate_calls: AtomicUsize::new(0),
                jobs_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn rejecting(status: u16, detail: Option<&str>) -> Self {
            Self {
                response: Err((status, detail.map(str::to_string))),
                translate_calls: AtomicUsize::new(0),
                jobs_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    impl TranslateApi for MockEngine {
        async fn jobs(&self, _user_id: &str) -> Result<Vec<Job>, EngineError> {
            self.jobs_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Job {
                id: "j-new".into(),
                filename: "book.epub".into(),
                status: JobStatus::Pending,
                download_url: None,
                created_at: chrono::Utc::now(),
            }])
        }

        async fn translate(&self, req: &TranslationRequest) -> Result<SubmitAck, EngineError> {
            self.translate_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(req.clone());
            match &self.response {
                Ok(ack) => Ok(ack.clone()),
                Err((status, detail)) => Err(EngineError::Rejected {
                    status: *status,
                    detail: detail.clone(),
                }),
            }
        }
    }

    fn identity() -> Identity {
        Identity {
            id: "user-1".into(),
            email: "ana@example.com".into(),
        }
    }

    fn request_with_file() -> SubmissionRequest {
        SubmissionRequest {
            document: Some(FilePart {
                filename: "book.epub".into(),
                bytes: b"epub".to_vec(),
            }),
            ..Default::default()
        }
    }

    fn submitter(api: Arc<MockEngine>, quota: QuotaTracker, cache: JobCache) -> JobSubmitter<MockEngine> {
        JobSubmitter::new(api, quota, cache, "Indonesian".into())
    }

    #[tokio::test]
    async fn rejects_missing_document_first() {
        let api = Arc::new(MockEngine::accepting());
        let mut sub = submitter(api.clone(), QuotaTracker::new(), JobCache::new());

        // No document and no identity: the document check wins.
        let err = sub
            .submit(None, SubmissionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "no file provided.");
        assert_eq!(api.translate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(sub.phase(), SubmitPhase::Rejected);
    }

    #[tokio::test]
    async fn rejects_missing_identity() {
        let api = Arc::new(MockEngine::accepting());
        let mut sub = submitter(api.clone(), QuotaTracker::new(), JobCache::new());

        let err = sub.submit(None, request_with_file()).await.unwrap_err();
        assert_eq!(err.user_message(), "authentication required.");
        assert_eq!(api.translate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_locally_without_network_call() {
        let api = Arc::new(MockEngine::accepting());
        let quota = QuotaTracker::new();
        for _ in 0..3 {
            quota.increment();
        }
        let mut sub = submitter(api.clone(), quota, JobCache::new());

        let err = sub
            .submit(Some(&identity()), request_with_file())
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "server quota exhausted; supply your own credential."
        );
        assert_eq!(api.translate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn own_key_bypasses_quota_and_skips_increment() {
        let api = Arc::new(MockEngine::accepting());
        let quota = QuotaTracker::new();
        for _ in 0..3 {
            quota.increment();
        }
        let cache = JobCache::new();
        cache.bind(Some("user-1".into()));
        let mut sub = submitter(api.clone(), quota.clone(), cache);

        let req = SubmissionRequest {
            use_own_key: true,
            api_key: Some("AIza-user-key".into()),
            ..request_with_file()
        };
        let ack = sub.submit(Some(&identity()), req).await.unwrap();
        assert_eq!(ack.job_id, "j-new");
        assert_eq!(quota.used(), 3, "own-key path is quota-exempt");

        let wire = api.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(wire.api_key.as_deref(), Some("AIza-user-key"));
    }

    #[tokio::test]
    async fn own_key_flag_without_credential_stays_on_quota_path() {
        let api = Arc::new(MockEngine::accepting());
        let quota = QuotaTracker::new();
        for _ in 0..3 {
            quota.increment();
        }
        let mut sub = submitter(api.clone(), quota, JobCache::new());

        let req = SubmissionRequest {
            use_own_key: true,
            api_key: None,
            ..request_with_file()
        };
        let err = sub.submit(Some(&identity()), req).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::QuotaExhausted)
        ));
    }

    #[tokio::test]
    async fn acceptance_increments_quota_and_refreshes_jobs() {
        let api = Arc::new(MockEngine::accepting());
        let quota = QuotaTracker::new();
        let cache = JobCache::new();
        cache.bind(Some("user-1".into()));
        let mut sub = submitter(api.clone(), quota.clone(), cache.clone());

        assert!(!sub.is_busy());
        let ack = sub
            .submit(Some(&identity()), request_with_file())
            .await
            .unwrap();
        assert!(!sub.is_busy(), "attempt reached a terminal phase");
        assert_eq!(ack.status, "queued");
        assert_eq!(quota.used(), 1);
        assert_eq!(api.jobs_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.jobs().len(), 1);
        assert_eq!(sub.phase(), SubmitPhase::Accepted);

        let wire = api.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(wire.target_lang, "Indonesian");
        assert_eq!(wire.style, "Novel Fantasy, Immersive, Dramatic");
        assert_eq!(wire.user_id, "user-1");
        assert!(wire.api_key.is_none());
    }

    #[tokio::test]
    async fn engine_rejection_surfaces_detail_and_leaves_quota_alone() {
        let api = Arc::new(MockEngine::rejecting(400, Some("Kuota habis.")));
        let quota = QuotaTracker::new();
        let mut sub = submitter(api.clone(), quota.clone(), JobCache::new());

        let err = sub
            .submit(Some(&identity()), request_with_file())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Kuota habis.");
        assert_eq!(quota.used(), 0);
        assert_eq!(sub.phase(), SubmitPhase::Rejected);
        // Exactly one attempt, no retry.
        assert_eq!(api.translate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_rejection_without_detail_is_generic() {
        let api = Arc::new(MockEngine::rejecting(500, None));
        let mut sub = submitter(api, QuotaTracker::new(), JobCache::new());

        let err = sub
            .submit(Some(&identity()), request_with_file())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "translation request failed");
    }

    #[test]
    fn style_wire_tags() {
        assert_eq!(Style::default(), Style::NovelFantasy);
        assert_eq!(Style::FormalNatural.tag(), "Formal but natural");
        assert_eq!(Style::NovelFantasy.tag(), "Novel Fantasy, Immersive, Dramatic");
        assert_eq!(Style::Casual.tag(), "Casual and easy to read");
        assert_eq!(Style::Literary.tag(), "Literature, Poetic");
    }

    #[test]
    fn phase_display() {
        assert_eq!(SubmitPhase::Idle.to_string(), "IDLE");
        assert_eq!(SubmitPhase::Validating.to_string(), "VALIDATING");
        assert_eq!(SubmitPhase::Submitting.to_string(), "SUBMITTING");
        assert_eq!(SubmitPhase::Accepted.to_string(), "ACCEPTED");
        assert_eq!(SubmitPhase::Rejected.to_string(), "REJECTED");
    }
}
