use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};

use super::error::EngineError;
use super::types::{ErrorBody, Job, SubmitAck, TranslationRequest};

/// Seam over the two engine calls so the submitter and poller can be
/// exercised against a mock in tests. Futures are `Send` because the
/// poll loop runs on a spawned task.
pub trait TranslateApi: Send + Sync {
    /// Full snapshot of the user's jobs, newest first, as the server returns them.
    fn jobs(&self, user_id: &str) -> impl Future<Output = Result<Vec<Job>, EngineError>> + Send;
    /// Dispatch one translation request. Exactly one attempt, no retry.
    fn translate(
        &self,
        req: &TranslationRequest,
    ) -> impl Future<Output = Result<SubmitAck, EngineError>> + Send;
}

pub struct EngineClient {
    client: Client,
    base_url: String,
}

impl EngineClient {
    /// Create a client pointing at the given engine base URL.
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the engine's health endpoint.
    pub async fn health(&self) -> Result<(), EngineError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await?;
        Self::reject_on_error_status(response).await?;
        Ok(())
    }

    async fn reject_on_error_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        Err(EngineError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

impl TranslateApi for EngineClient {
    async fn jobs(&self, user_id: &str) -> Result<Vec<Job>, EngineError> {
        let response = self
            .client
            .get(format!("{}/jobs/{user_id}", self.base_url))
            .send()
            .await?;
        let response = Self::reject_on_error_status(response).await?;
        let jobs = response.json::<Vec<Job>>().await?;
        Ok(jobs)
    }

    async fn translate(&self, req: &TranslationRequest) -> Result<SubmitAck, EngineError> {
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(req.document.bytes.clone()).file_name(req.document.filename.clone()),
            )
            .text("target_lang", req.target_lang.clone())
            .text("style", req.style.clone())
            .text("user_id", req.user_id.clone());
        if let Some(font) = &req.font {
            form = form.part(
                "font",
                Part::bytes(font.bytes.clone()).file_name(font.filename.clone()),
            );
        }
        if let Some(key) = &req.api_key {
            form = form.text("api_key", key.clone());
        }

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = Self::reject_on_error_status(response).await?;
        let ack = response.json::<SubmitAck>().await?;
        Ok(ack)
    }
}
