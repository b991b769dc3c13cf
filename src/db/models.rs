//! Database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::lifecycle::status::Direction;

/// A trade row — one per externally assigned `trade_id`.
///
/// `status` stays a plain label here; the lifecycle module parses it where
/// guard decisions are made. `telegram_msg_id` anchors the notification
/// thread and is never overwritten once set.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trade {
    pub id: i64,
    pub trade_id: String,
    pub symbol: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub direction: String,
    pub entry_price: f64,
    pub sl_price: f64,
    pub tp1_price: f64,
    pub tp2_price: f64,
    pub tp3_price: f64,
    pub status: String,
    pub points_gained: f64,
    pub telegram_msg_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Stored direction, validated at ingestion so this only fails on a
    /// hand-edited row.
    pub fn parsed_direction(&self) -> Option<Direction> {
        Direction::from_label(&self.direction)
    }
}
