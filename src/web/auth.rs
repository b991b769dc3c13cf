//! Session-cookie login for the dashboard read/delete surface.
//!
//! Event-ingestion endpoints stay open — they come from the trusted MT4
//! process, which has no cookie jar.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use tracing::info;

use crate::error::ApiError;

use super::server::AppState;

const SESSION_USER_KEY: &str = "user";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
}

/// Reject with 401 unless the session carries an authenticated user.
pub async fn require_session(session: &Session) -> Result<(), ApiError> {
    let user: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);
    match user {
        Some(_) => Ok(()),
        None => Err(ApiError::Unauthorized("login required".into())),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// POST /api/login — issue a session cookie on matching credentials.
async fn login(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Value>, ApiError> {
    if payload.username == state.auth.username && payload.password == state.auth.password {
        session
            .insert(SESSION_USER_KEY, "authenticated")
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        info!(username = %payload.username, "dashboard login");
        return Ok(Json(json!({ "success": true })));
    }

    Err(ApiError::Unauthorized("Invalid credentials".into()))
}

/// POST /api/logout — clear the session.
async fn logout(session: Session) -> Json<Value> {
    let _ = session.delete().await;
    Json(json!({ "success": true }))
}
