//! The state-sync WebSocket endpoint (spec §6.4), grounded on the
//! broadcast-subscribe pattern in
//! `dashflow-observability/src/bin/websocket_server/handlers.rs`: each
//! connection subscribes to a shared `broadcast::Sender` and forwards
//! every snapshot until the client disconnects.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::state::AppState;

pub async fn state_sync_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.snapshot_tx.subscribe();

    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                match snapshot {
                    Ok(payload) => {
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "state-sync client lagged, dropping missed snapshots");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Clients don't send control messages other than close;
                    // anything else is ignored.
                    _ => {}
                }
            }
        }
    }
}
