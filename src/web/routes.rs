//! HTTP route handlers — the trade lifecycle lives here.
//!
//! Event-ingestion endpoints (signal/setup/price/log) are unauthenticated:
//! they originate from the trusted MT4-side process. Read and delete
//! require a dashboard session. Every state change commits to Postgres
//! before the notifier or the broadcaster hears about it, so a viewer
//! re-fetch always observes the write.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::db::models::Trade;
use crate::db::{pool, queries};
use crate::error::ApiError;
use crate::events::bus::TradeEvent;
use crate::lifecycle::points;
use crate::lifecycle::status::{transition, Decision, Direction, TradeStatus};

use super::auth;
use super::server::AppState;

/// Build all API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trades", get(list_trades))
        .route("/api/signal_detected", post(signal_detected))
        .route("/api/setup_confirmed", post(setup_confirmed))
        .route("/api/price_update", post(price_update))
        .route("/api/log_event", post(log_event))
        .route("/api/delete_trades", post(delete_trades))
        .route("/health", get(health))
}

// ── Payloads ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignalPayload {
    pub trade_id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub direction: String,
}

#[derive(Debug, Deserialize)]
pub struct SetupPayload {
    pub trade_id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub direction: String,
    pub entry: f64,
    pub sl: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,
}

#[derive(Debug, Deserialize)]
pub struct PricePayload {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
}

#[derive(Debug, Deserialize)]
pub struct LogEventPayload {
    pub trade_id: String,
    pub new_status: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct DeletePayload {
    #[serde(default)]
    pub trade_ids: Vec<String>,
    #[serde(default)]
    pub password: String,
}

fn parse_direction(label: &str) -> Result<Direction, ApiError> {
    Direction::from_label(label)
        .ok_or_else(|| ApiError::Validation(format!("invalid trade type: {}", label)))
}

// ── Handlers ─────────────────────────────────────────────────────

/// GET /api/trades — rows inside the retention window, newest first.
async fn list_trades(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    auth::require_session(&session).await?;
    let rows = queries::list_recent(
        &state.db,
        state.retention.max_age_days,
        state.retention.list_limit,
    )
    .await?;
    Ok(Json(rows))
}

/// POST /api/signal_detected — create-if-absent in SIGNAL state.
async fn signal_detected(
    State(state): State<AppState>,
    Json(payload): Json<SignalPayload>,
) -> Result<Json<Value>, ApiError> {
    if payload.trade_id.is_empty() {
        return Err(ApiError::Validation("trade_id is required".into()));
    }
    let direction = parse_direction(&payload.direction)?;

    // Opportunistic retention sweep — old rows age out on ingestion.
    match queries::purge_older_than(&state.db, state.retention.max_age_days).await {
        Ok(0) => {}
        Ok(n) => info!(purged = n, "retention sweep removed old trades"),
        Err(e) => warn!(error = %e, "retention sweep failed"),
    }

    // Send first so the row can carry its thread anchor; on failure the
    // row is still written and later updates fall back to unthreaded.
    let msg_id = state
        .notifier
        .announce_signal(&payload.symbol, direction)
        .await;

    let inserted = queries::upsert_signal(
        &state.db,
        &payload.trade_id,
        &payload.symbol,
        direction,
        msg_id,
        Utc::now(),
    )
    .await?;

    if inserted {
        info!(trade_id = %payload.trade_id, symbol = %payload.symbol, "signal recorded");
        state.bus.publish(TradeEvent::SignalCreated {
            trade_id: payload.trade_id,
        });
    } else {
        debug!(trade_id = %payload.trade_id, "duplicate signal, keeping first record");
    }

    Ok(Json(json!({ "success": true })))
}

/// POST /api/setup_confirmed — reverse open siblings, then upsert SETUP.
///
/// The scan, the forced closes, and the upsert share one transaction so
/// two near-simultaneous setups on a symbol cannot both survive as open.
async fn setup_confirmed(
    State(state): State<AppState>,
    Json(payload): Json<SetupPayload>,
) -> Result<Json<Value>, ApiError> {
    if payload.trade_id.is_empty() {
        return Err(ApiError::Validation("trade_id is required".into()));
    }
    let direction = parse_direction(&payload.direction)?;

    let mut tx = state.db.begin().await?;

    let reversed =
        queries::find_open_by_symbol_except(&mut *tx, &payload.symbol, &payload.trade_id).await?;
    for old in &reversed {
        queries::update_status(&mut *tx, &old.trade_id, TradeStatus::ClosedReversal.as_label())
            .await?;
    }

    let existing_msg_id = queries::find_by_trade_id(&mut *tx, &payload.trade_id)
        .await?
        .and_then(|t| t.telegram_msg_id);

    queries::upsert_setup(
        &mut *tx,
        &payload.trade_id,
        &payload.symbol,
        direction,
        payload.entry,
        payload.sl,
        payload.tp1,
        payload.tp2,
        payload.tp3,
        Utc::now(),
    )
    .await?;

    tx.commit().await?;

    if !reversed.is_empty() {
        info!(
            symbol = %payload.symbol,
            count = reversed.len(),
            "open trades reversed by new setup"
        );
    }
    for old in &reversed {
        if let Some(msg_id) = old.telegram_msg_id {
            state.notifier.announce_reversal(msg_id).await;
        }
    }
    state
        .notifier
        .announce_setup(
            payload.entry,
            payload.sl,
            payload.tp1,
            payload.tp2,
            payload.tp3,
            existing_msg_id,
        )
        .await;
    state.bus.publish(TradeEvent::SetupConfirmed {
        trade_id: payload.trade_id,
    });

    Ok(Json(json!({ "success": true })))
}

/// POST /api/price_update — floating P/L for ACTIVE trades on the symbol.
/// No notification, no broadcast: ticks are too frequent for either.
async fn price_update(
    State(state): State<AppState>,
    Json(payload): Json<PricePayload>,
) -> Result<Json<Value>, ApiError> {
    let trades = queries::find_active_by_symbol(&state.db, &payload.symbol).await?;

    for trade in &trades {
        let Some(direction) = trade.parsed_direction() else {
            warn!(trade_id = %trade.trade_id, direction = %trade.direction, "skipping trade with unknown direction");
            continue;
        };
        let reference = points::reference_price(direction, payload.bid, payload.ask);
        let pts = points::compute(direction, trade.entry_price, reference);
        queries::update_points(&state.db, &trade.trade_id, pts).await?;
    }

    Ok(Json(json!({ "success": true })))
}

/// POST /api/log_event — guarded lifecycle transition.
async fn log_event(
    State(state): State<AppState>,
    Json(payload): Json<LogEventPayload>,
) -> Result<Json<Value>, ApiError> {
    let Some(trade) = queries::find_by_trade_id(&state.db, &payload.trade_id).await? else {
        // Soft failure keeps the MT4 caller's retry logic simple.
        return Ok(Json(json!({ "success": false, "msg": "Trade not found" })));
    };

    let current = TradeStatus::from_label(&trade.status);
    let incoming = TradeStatus::from_label(&payload.new_status);

    match transition(&current, &incoming) {
        Decision::Suppress(reason) => {
            debug!(
                trade_id = %payload.trade_id,
                current = %current,
                incoming = %incoming,
                ?reason,
                "status event suppressed"
            );
            return Ok(Json(json!({ "success": true })));
        }
        Decision::Apply => {}
    }

    let direction = trade.parsed_direction().ok_or_else(|| {
        ApiError::Internal(format!("trade {} has invalid direction", trade.trade_id))
    })?;
    let pts = points::compute(direction, trade.entry_price, payload.price);

    queries::update_status_and_points(&state.db, &payload.trade_id, incoming.as_label(), pts)
        .await?;
    info!(
        trade_id = %payload.trade_id,
        status = %incoming,
        points = pts,
        "trade status updated"
    );

    state
        .notifier
        .announce_status(incoming.as_label(), payload.price, pts, trade.telegram_msg_id)
        .await;
    state.bus.publish(TradeEvent::StatusChanged {
        trade_id: payload.trade_id,
        status: incoming.as_label().to_string(),
    });

    Ok(Json(json!({ "success": true })))
}

/// POST /api/delete_trades — guarded bulk hard delete.
async fn delete_trades(
    session: Session,
    State(state): State<AppState>,
    Json(payload): Json<DeletePayload>,
) -> Result<Json<Value>, ApiError> {
    auth::require_session(&session).await?;

    if state.auth.delete_password.is_empty() || payload.password != state.auth.delete_password {
        return Err(ApiError::Unauthorized("Invalid password".into()));
    }
    if payload.trade_ids.is_empty() {
        return Err(ApiError::Validation("No IDs provided".into()));
    }

    let deleted = queries::delete_by_ids(&state.db, &payload.trade_ids).await?;
    info!(deleted, "bulk delete removed trades");

    state
        .bus
        .publish(TradeEvent::TradesDeleted { count: deleted });

    Ok(Json(json!({ "success": true })))
}

/// GET /health — liveness probe incl. database round trip.
async fn health(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    pool::health_check(&state.db).await?;
    Ok("ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_payload_accepts_mt4_shape() {
        let payload: SignalPayload =
            serde_json::from_str(r#"{"trade_id":"T1","symbol":"EURUSD","type":"BUY"}"#).unwrap();
        assert_eq!(payload.trade_id, "T1");
        assert_eq!(payload.direction, "BUY");
    }

    #[test]
    fn setup_payload_requires_all_levels() {
        let missing =
            serde_json::from_str::<SetupPayload>(r#"{"trade_id":"T1","symbol":"EURUSD","type":"SELL","entry":1.1}"#);
        assert!(missing.is_err());

        let full: SetupPayload = serde_json::from_str(
            r#"{"trade_id":"T1","symbol":"EURUSD","type":"SELL",
                "entry":1.1,"sl":1.2,"tp1":1.05,"tp2":1.0,"tp3":0.95}"#,
        )
        .unwrap();
        assert_eq!(full.tp3, 0.95);
    }

    #[test]
    fn delete_payload_tolerates_missing_fields() {
        let payload: DeletePayload = serde_json::from_str("{}").unwrap();
        assert!(payload.trade_ids.is_empty());
        assert!(payload.password.is_empty());
    }

    #[test]
    fn direction_validation_rejects_junk() {
        assert!(parse_direction("BUY").is_ok());
        assert!(parse_direction("HOLD").is_err());
        assert!(parse_direction("buy").is_err());
    }
}
