//! SQL query functions for the trades table.
//!
//! Every mutation is keyed on the external `trade_id` and uses
//! insert-or-update-on-conflict semantics — never a blind insert. Functions
//! take any Postgres executor so the reversal sequence can run on a single
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

use super::models::Trade;
use crate::lifecycle::status::Direction;

// ── Lookups ──────────────────────────────────────────────────────

pub async fn find_by_trade_id(
    db: impl PgExecutor<'_>,
    trade_id: &str,
) -> sqlx::Result<Option<Trade>> {
    sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE trade_id = $1")
        .bind(trade_id)
        .fetch_optional(db)
        .await
}

/// Open trades on a symbol other than `exclude_id` — the set a new setup
/// supersedes.
pub async fn find_open_by_symbol_except(
    db: impl PgExecutor<'_>,
    symbol: &str,
    exclude_id: &str,
) -> sqlx::Result<Vec<Trade>> {
    sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades
         WHERE symbol = $1 AND status IN ('SIGNAL', 'SETUP', 'ACTIVE') AND trade_id != $2",
    )
    .bind(symbol)
    .bind(exclude_id)
    .fetch_all(db)
    .await
}

pub async fn find_active_by_symbol(
    db: impl PgExecutor<'_>,
    symbol: &str,
) -> sqlx::Result<Vec<Trade>> {
    sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE symbol = $1 AND status = 'ACTIVE'")
        .bind(symbol)
        .fetch_all(db)
        .await
}

/// Trades inside the retention window, newest first, capped.
pub async fn list_recent(
    db: impl PgExecutor<'_>,
    max_age_days: i32,
    limit: i64,
) -> sqlx::Result<Vec<Trade>> {
    sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades
         WHERE created_at > now() - make_interval(days => $1)
         ORDER BY id DESC LIMIT $2",
    )
    .bind(max_age_days)
    .bind(limit)
    .fetch_all(db)
    .await
}

// ── Upserts ──────────────────────────────────────────────────────

/// Create a trade in SIGNAL state. First write wins: an existing row is
/// left untouched so retried deliveries cannot clobber `telegram_msg_id`
/// or `created_at`. Returns whether a row was actually inserted.
pub async fn upsert_signal(
    db: impl PgExecutor<'_>,
    trade_id: &str,
    symbol: &str,
    direction: Direction,
    telegram_msg_id: Option<i64>,
    created_at: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO trades (trade_id, symbol, type, telegram_msg_id, created_at, status)
         VALUES ($1, $2, $3, $4, $5, 'SIGNAL')
         ON CONFLICT (trade_id) DO NOTHING",
    )
    .bind(trade_id)
    .bind(symbol)
    .bind(direction.as_label())
    .bind(telegram_msg_id)
    .bind(created_at)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Create-or-refine a trade into SETUP state with concrete price levels.
/// The conflict arm only merges levels and status — `telegram_msg_id` and
/// `created_at` of an existing row are never touched.
#[allow(clippy::too_many_arguments)]
pub async fn upsert_setup(
    db: impl PgExecutor<'_>,
    trade_id: &str,
    symbol: &str,
    direction: Direction,
    entry: f64,
    sl: f64,
    tp1: f64,
    tp2: f64,
    tp3: f64,
    created_at: DateTime<Utc>,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO trades (trade_id, symbol, type, entry_price, sl_price,
                             tp1_price, tp2_price, tp3_price, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'SETUP', $9)
         ON CONFLICT (trade_id)
         DO UPDATE SET
             entry_price = EXCLUDED.entry_price, sl_price = EXCLUDED.sl_price,
             tp1_price = EXCLUDED.tp1_price, tp2_price = EXCLUDED.tp2_price,
             tp3_price = EXCLUDED.tp3_price,
             status = 'SETUP', updated_at = now()",
    )
    .bind(trade_id)
    .bind(symbol)
    .bind(direction.as_label())
    .bind(entry)
    .bind(sl)
    .bind(tp1)
    .bind(tp2)
    .bind(tp3)
    .bind(created_at)
    .execute(db)
    .await?;
    Ok(())
}

// ── Status & points ──────────────────────────────────────────────

pub async fn update_status(
    db: impl PgExecutor<'_>,
    trade_id: &str,
    status: &str,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE trades SET status = $2, updated_at = now() WHERE trade_id = $1")
        .bind(trade_id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}

/// Persist a lifecycle transition and its recomputed points in one statement.
pub async fn update_status_and_points(
    db: impl PgExecutor<'_>,
    trade_id: &str,
    status: &str,
    points: f64,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE trades SET status = $2, points_gained = $3, updated_at = now()
         WHERE trade_id = $1",
    )
    .bind(trade_id)
    .bind(status)
    .bind(points)
    .execute(db)
    .await?;
    Ok(())
}

/// Floating P/L tick — status untouched.
pub async fn update_points(
    db: impl PgExecutor<'_>,
    trade_id: &str,
    points: f64,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE trades SET points_gained = $2, updated_at = now() WHERE trade_id = $1")
        .bind(trade_id)
        .bind(points)
        .execute(db)
        .await?;
    Ok(())
}

// ── Deletion & retention ─────────────────────────────────────────

pub async fn delete_by_ids(db: impl PgExecutor<'_>, trade_ids: &[String]) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM trades WHERE trade_id = ANY($1)")
        .bind(trade_ids)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Retention sweep — drops rows older than the window. Invoked
/// opportunistically on signal ingestion.
pub async fn purge_older_than(db: impl PgExecutor<'_>, max_age_days: i32) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM trades WHERE created_at < now() - make_interval(days => $1)")
        .bind(max_age_days)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
