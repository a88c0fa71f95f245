//! HTTP handlers (spec §6.4), grounded on the teacher's
//! `agentkern-arbiter/src/bin/server.rs` handler shape: `State<Arc<AppState>>`
//! extractor, `Json<T>` responses, `StatusCode` for the few failure paths.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tick: u64,
    pub version: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", tick: state.tick.current_tick(), version: env!("CARGO_PKG_VERSION") })
}

#[derive(Debug, Serialize)]
pub struct FeedbackLoopResponse {
    pub current_promotion_threshold: f64,
    pub pending_candidate_count: usize,
    pub history: Vec<ip_coherence::ThresholdAdjustment>,
}

/// `GET /api/coherence/feedback-loop` (spec §6.4).
pub async fn feedback_loop_status(State(state): State<Arc<AppState>>) -> Json<FeedbackLoopResponse> {
    let current_promotion_threshold = state.coherence.current_promotion_threshold().await;
    let pending_candidate_count = state.coherence.pending_candidate_count().await;
    let history = state.coherence.threshold_history().await;

    Json(FeedbackLoopResponse { current_promotion_threshold, pending_candidate_count, history })
}

#[derive(Debug, Serialize)]
pub struct TrustSnapshotResponse {
    pub scores: Vec<ip_types::TrustSnapshot>,
}

pub async fn trust_snapshot(State(state): State<Arc<AppState>>) -> Json<TrustSnapshotResponse> {
    Json(TrustSnapshotResponse { scores: state.trust.snapshot() })
}

pub async fn pending_decisions(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ip_types::QueuedDecision>> {
    Json(state.decisions.list_pending())
}

/// `POST /api/posts/{slug}/pipeline/{action}` is listed in spec §6.4 as
/// "unrelated to this core" — the contract is named only so the surface
/// inventory is complete. Nothing in the Intelligence Plane core handles
/// pipeline triggers, so the route isn't wired; out of scope (spec §1).
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
