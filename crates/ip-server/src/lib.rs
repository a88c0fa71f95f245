//! Intelligence Plane server (spec §4.8, §6.4): a thin `axum` router
//! wiring the tick service, event bus, trust engine, decision queue,
//! coherence monitor, context tracker, and analyzers together. The HTTP
//! and WebSocket surface is a collaborator, not part of the core — this
//! crate is where the two meet.

pub mod config;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ServerConfig;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/coherence/feedback-loop", get(routes::feedback_loop_status))
        .route("/api/trust/snapshot", get(routes::trust_snapshot))
        .route("/api/decisions/pending", get(routes::pending_decisions))
        .route("/ws/state-sync", get(ws::state_sync_ws))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drives periodic work off the tick service: every tick, decay trust,
/// expire stale decisions, and publish a fresh state-sync snapshot. Layer
/// 1/1c scans and Layer 2 review are scan-interval-gated inside the
/// coherence monitor itself (spec §4.5); this loop only decides when to
/// ask.
pub async fn run_tick_driven_work(state: Arc<AppState>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<u64>();
    state.tick.subscribe(move |tick| {
        // Fire-and-forget into an unbounded channel: tick callbacks run
        // synchronously on the tick service's own task and must not
        // block on async work.
        let _ = tx.send(tick);
    });

    while let Some(tick) = rx.recv().await {
        state.trust.decay_tick(tick);
        let expired = state.decisions.tick(tick);
        if !expired.is_empty() {
            tracing::info!(tick, count = expired.len(), "decisions auto-resolved or timed out");
        }

        if state.coherence.should_run_layer1_scan(tick).await {
            state.coherence.run_layer1_scan(state.store.as_ref(), tick).await;
        }
        if state.coherence.should_run_layer1c_sweep(tick).await {
            state.coherence.run_layer1c_sweep(state.store.as_ref(), tick).await;
        }

        state.publish_snapshot(ip_types::ControlMode::Orchestrator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use ip_tick::{TickConfig, TickMode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = ServerConfig {
            port: 0,
            tick: TickConfig { mode: TickMode::Manual, interval: std::time::Duration::from_millis(1) },
            coherence: ip_coherence::CoherenceConfig::default(),
            review_model: "mock-review-model".to_string(),
        };
        AppState::new(&config)
    }

    #[tokio::test]
    async fn health_reports_current_tick() {
        let state = test_state();
        state.tick.advance(3).unwrap();
        let app = build_router(state);

        let response =
            app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["tick"], 3);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn feedback_loop_endpoint_reports_default_threshold() {
        let state = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/coherence/feedback-loop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["current_promotion_threshold"], 0.75);
        assert!(json["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_falls_back_to_not_found() {
        let state = test_state();
        let app = build_router(state);

        let response =
            app.oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn trust_snapshot_reflects_registered_agents() {
        let state = test_state();
        state.trust.register_agent("a-1", 0);
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/trust/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["scores"][0]["agent_id"], "a-1");
    }
}
