//! Pluggable embedding and LLM review/sweep provider contracts (spec
//! §4.1, §4.5 Layers 1c/2, §6.1, §6.2), with deterministic mocks so the
//! rest of the workspace builds and tests without a live external
//! service.

pub mod embedding;
pub mod error;
pub mod http;
pub mod llm;
pub mod rate_limit;
pub mod retry;

pub use embedding::{cosine_similarity, EmbeddingService, MockEmbeddingService, Vector};
pub use error::ProviderError;
pub use http::HttpLlmReviewService;
pub use llm::{
    extract_json_array, parse_review_response, parse_sweep_response, CandidatePairContext,
    Confidence, LlmReviewService, MockLlmReviewService, ReviewRequest, ReviewResult, SweepIssue,
    SweepRequest,
};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
