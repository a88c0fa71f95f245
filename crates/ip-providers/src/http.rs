//! A real-shaped (but network-optional to construct and unit-test)
//! `LlmReviewService` over HTTP, demonstrating the retry-with-backoff
//! policy (spec §5, §7) a production provider would actually use. No
//! live endpoint ships with this core; this stub exists so the shape of
//! a real integration — and its error-classification boundary — is on
//! record rather than left to the mock alone.

use crate::error::ProviderError;
use crate::llm::{parse_review_response, parse_sweep_response, LlmReviewService, ReviewRequest, ReviewResult, SweepIssue, SweepRequest};
use crate::retry::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;

pub struct HttpLlmReviewService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    retry_policy: RetryPolicy,
}

impl HttpLlmReviewService {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<String, ProviderError> {
        let mut request = self.client.post(format!("{}{}", self.endpoint, path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| ProviderError::Transient {
            status: None,
            message: format!("request to {path} failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), format!("{path} returned {status}")));
        }

        response.text().await.map_err(|e| ProviderError::Unparseable(e.to_string()))
    }
}

#[async_trait]
impl LlmReviewService for HttpLlmReviewService {
    async fn review(&self, request: ReviewRequest) -> Result<Vec<ReviewResult>, ProviderError> {
        let pairs = request.pairs.clone();
        let body = serde_json::json!({
            "model": self.model,
            "pairs": request.pairs,
            "contents": request.contents,
            "decision_context": request.decision_context,
            "workstream_context": request.workstream_context,
        });

        let raw = retry_with_backoff(self.retry_policy, || self.post("/review", &body)).await?;
        Ok(parse_review_response(&raw, &pairs))
    }

    async fn sweep_corpus(&self, request: SweepRequest) -> Result<Vec<SweepIssue>, ProviderError> {
        let body = serde_json::json!({
            "model": request.model,
            "corpus": request.corpus,
            "workstreams": request.workstreams,
            "prompt": request.prompt,
        });

        let raw = retry_with_backoff(self.retry_policy, || self.post("/sweep", &body)).await?;
        Ok(parse_sweep_response(&raw))
    }
}
