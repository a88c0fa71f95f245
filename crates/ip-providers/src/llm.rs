//! The LLM review and full-corpus sweep contract (spec §4.5 Layers 1c/2,
//! §6.2). Both surfaces return JSON-array-shaped results and must
//! tolerate fenced code blocks and extra prose around the array.

use crate::error::ProviderError;
use async_trait::async_trait;
use ip_types::CoherenceCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Likely,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePairContext {
    pub artifact_a: String,
    pub artifact_b: String,
    pub category: CoherenceCategory,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub pairs: Vec<CandidatePairContext>,
    pub contents: HashMap<String, String>,
    pub decision_context: Option<serde_json::Value>,
    pub workstream_context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub artifact_a: String,
    pub artifact_b: String,
    pub confirmed: bool,
    pub confidence: Confidence,
    /// Default `medium` per §4.5 when the model omits it.
    pub severity: Option<ip_types::Severity>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRequest {
    /// Artifact id -> content, already filtered/truncated by the caller.
    pub corpus: HashMap<String, String>,
    /// Artifact id -> workstream, for grouping in the prompt.
    pub workstreams: HashMap<String, String>,
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepIssue {
    pub artifact_a: String,
    pub artifact_b: String,
    pub category: CoherenceCategory,
    pub explanation: String,
}

#[async_trait]
pub trait LlmReviewService: Send + Sync {
    async fn review(&self, request: ReviewRequest) -> Result<Vec<ReviewResult>, ProviderError>;

    async fn sweep_corpus(&self, request: SweepRequest) -> Result<Vec<SweepIssue>, ProviderError>;
}

/// Extract a JSON array from a model response that may be wrapped in a
/// fenced code block or surrounded by prose (spec §6.2).
pub fn extract_json_array(text: &str) -> Option<serde_json::Value> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// A configurable mock for tests: returns canned results regardless of
/// the request, or can be driven by a closure for scenario-specific
/// behavior.
pub struct MockLlmReviewService {
    pub review_results: Vec<ReviewResult>,
    pub sweep_issues: Vec<SweepIssue>,
}

impl MockLlmReviewService {
    pub fn new() -> Self {
        Self {
            review_results: Vec::new(),
            sweep_issues: Vec::new(),
        }
    }

    pub fn with_review_results(mut self, results: Vec<ReviewResult>) -> Self {
        self.review_results = results;
        self
    }

    pub fn with_sweep_issues(mut self, issues: Vec<SweepIssue>) -> Self {
        self.sweep_issues = issues;
        self
    }
}

impl Default for MockLlmReviewService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmReviewService for MockLlmReviewService {
    async fn review(&self, request: ReviewRequest) -> Result<Vec<ReviewResult>, ProviderError> {
        if !self.review_results.is_empty() {
            return Ok(self.review_results.clone());
        }
        // Conservative fallback: confirm every requested pair at medium
        // confidence, matching the degrade-safely behavior required of a
        // real provider when its output is unparseable (§6.2, §7).
        Ok(request
            .pairs
            .into_iter()
            .map(|p| ReviewResult {
                artifact_a: p.artifact_a,
                artifact_b: p.artifact_b,
                confirmed: true,
                confidence: Confidence::Likely,
                severity: None,
                explanation: "mock: no canned result configured, conservative fallback"
                    .to_string(),
            })
            .collect())
    }

    async fn sweep_corpus(&self, _request: SweepRequest) -> Result<Vec<SweepIssue>, ProviderError> {
        Ok(self.sweep_issues.clone())
    }
}

/// Parses a raw LLM text response into review results, applying the
/// conservative-confirm fallback on unparseable output (§6.2, §7). This
/// is shared by any HTTP-shaped `LlmReviewService` implementation.
pub fn parse_review_response(
    raw: &str,
    requested_pairs: &[CandidatePairContext],
) -> Vec<ReviewResult> {
    match extract_json_array(raw).and_then(|v| serde_json::from_value::<Vec<ReviewResult>>(v).ok())
    {
        Some(results) => results,
        None => {
            tracing::warn!("unparseable LLM review response, applying conservative fallback");
            requested_pairs
                .iter()
                .map(|p| ReviewResult {
                    artifact_a: p.artifact_a.clone(),
                    artifact_b: p.artifact_b.clone(),
                    confirmed: true,
                    confidence: Confidence::Likely,
                    severity: None,
                    explanation: "unparseable model response, confirmed conservatively"
                        .to_string(),
                })
                .collect()
        }
    }
}

/// Parses a raw sweep response; an unparseable response degrades to an
/// empty list, never a fallback guess (§6.2, §7 — sweep has no
/// candidate pairs to fall back onto).
pub fn parse_sweep_response(raw: &str) -> Vec<SweepIssue> {
    match extract_json_array(raw).and_then(|v| serde_json::from_value::<Vec<SweepIssue>>(v).ok())
    {
        Some(issues) => issues,
        None => {
            tracing::warn!("unparseable LLM sweep response, returning no issues");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_array_from_fenced_block() {
        let raw = "Here is my analysis:\n```json\n[{\"a\": 1}]\n```\nThanks!";
        let value = extract_json_array(raw).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn extracts_json_array_with_surrounding_prose() {
        let raw = "Sure, the result is [1, 2, 3] as requested.";
        let value = extract_json_array(raw).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn unparseable_text_returns_none() {
        assert!(extract_json_array("no brackets here").is_none());
    }

    #[test]
    fn unparseable_review_response_falls_back_to_confirmed() {
        let pairs = vec![CandidatePairContext {
            artifact_a: "a-1".to_string(),
            artifact_b: "a-2".to_string(),
            category: CoherenceCategory::Duplication,
            similarity_score: 0.8,
        }];
        let results = parse_review_response("not json at all", &pairs);
        assert_eq!(results.len(), 1);
        assert!(results[0].confirmed);
    }

    #[test]
    fn unparseable_sweep_response_returns_empty() {
        let issues = parse_sweep_response("nothing parseable");
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn mock_review_falls_back_when_unconfigured() {
        let svc = MockLlmReviewService::new();
        let request = ReviewRequest {
            pairs: vec![CandidatePairContext {
                artifact_a: "a-1".to_string(),
                artifact_b: "a-2".to_string(),
                category: CoherenceCategory::Duplication,
                similarity_score: 0.9,
            }],
            contents: HashMap::new(),
            decision_context: None,
            workstream_context: None,
        };
        let results = svc.review(request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].confirmed);
    }
}
