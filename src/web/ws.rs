//! Live-update socket — wakes dashboard viewers when trade state changes.
//!
//! The wire protocol is a single content-free "refresh" frame; viewers
//! respond by re-fetching /api/trades. Writes commit before events are
//! published, so a re-fetch always observes the change. Rapid bursts may
//! coalesce into one re-fetch on the viewer side, which is fine.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tower_sessions::Session;
use tracing::{debug, info};

use crate::error::ApiError;

use super::auth;
use super::server::AppState;

/// GET /ws — upgrade an authenticated viewer onto the change broadcast.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    session: Session,
    State(state): State<AppState>,
) -> Response {
    if auth::require_session(&session).await.is_err() {
        return ApiError::Unauthorized("login required".into()).into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("dashboard viewer connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.bus.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "waking viewer");
                    if sender.send(Message::Text("refresh".to_string())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed events collapse into a single wake-up.
                    if sender.send(Message::Text("refresh".to_string())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Drain client frames so pings and closes are processed.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!("dashboard viewer disconnected");
}
