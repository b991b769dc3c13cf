//! Telegram notification relay — threaded lifecycle alerts.
//!
//! The first message for a trade anchors a thread; every later update is a
//! reply to it. Delivery is best-effort: failures are logged and swallowed
//! so the chat side-channel can never fail or stall an API call, and each
//! send carries a bounded timeout. Persisted trade state is the source of
//! truth; a dropped message stays dropped.

use std::time::Duration;

use chrono::Utc;
use chrono_tz::Asia::Kolkata;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::lifecycle::status::Direction;

/// Per-send timeout so a slow Telegram API cannot stall a request handler.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Escape the Markdown characters Telegram reserves. Unescaped, a symbol
/// like "GBP_JPY" renders wrong or rejects the whole message.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn signal_text(symbol: &str, direction: Direction, time: &str) -> String {
    format!(
        "⚠️ *NEW SIGNAL*\nSymbol: {}\nType: {}\nTime: {}",
        escape_markdown(symbol),
        direction.as_label(),
        time,
    )
}

fn setup_text(entry: f64, sl: f64, tp1: f64, tp2: f64, tp3: f64) -> String {
    format!("📋 *SETUP CONFIRMED*\nEntry: {entry}\nSL: {sl}\nTP1: {tp1}\nTP2: {tp2}\nTP3: {tp3}")
}

fn reversal_text() -> String {
    "🔄 *Trade Reversed*\nClosed by new signal.".to_string()
}

// 5 decimals so raw forex points stay readable in the alert.
fn status_text(status: &str, price: f64, points: f64) -> String {
    format!(
        "⚡ *UPDATE: {}*\nPrice: {}\nProfit: {:.5}",
        escape_markdown(status),
        price,
        points,
    )
}

/// Telegram Bot API client for the trade channel. Disabled (all sends are
/// silent no-ops) when token or chat id are not configured.
pub struct Notifier {
    client: Client,
    token: Option<String>,
    chat_id: Option<String>,
}

impl Notifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }

    /// New-signal alert. Returns the message id that anchors the trade's
    /// thread, or None when disabled or the send failed.
    pub async fn announce_signal(&self, symbol: &str, direction: Direction) -> Option<i64> {
        let time = Utc::now()
            .with_timezone(&Kolkata)
            .format("%d/%m/%Y, %I:%M:%S %p")
            .to_string();
        self.deliver(signal_text(symbol, direction, &time), None)
            .await
    }

    /// Setup details, threaded onto the signal message when one exists.
    pub async fn announce_setup(
        &self,
        entry: f64,
        sl: f64,
        tp1: f64,
        tp2: f64,
        tp3: f64,
        reply_to: Option<i64>,
    ) {
        self.deliver(setup_text(entry, sl, tp1, tp2, tp3), reply_to)
            .await;
    }

    /// Forced-closure notice for a trade superseded by a new setup.
    pub async fn announce_reversal(&self, reply_to: i64) {
        self.deliver(reversal_text(), Some(reply_to)).await;
    }

    /// Lifecycle transition with the reported price and recomputed points.
    pub async fn announce_status(
        &self,
        status: &str,
        price: f64,
        points: f64,
        reply_to: Option<i64>,
    ) {
        self.deliver(status_text(status, price, points), reply_to)
            .await;
    }

    /// Fire a message, logging and swallowing any failure.
    async fn deliver(&self, text: String, reply_to: Option<i64>) -> Option<i64> {
        match self.send(&text, reply_to).await {
            Ok(message_id) => message_id,
            Err(e) => {
                warn!(error = %e, "failed to send telegram notification");
                None
            }
        }
    }

    /// Raw sendMessage call. Returns the provider-assigned message id.
    async fn send(&self, text: &str, reply_to: Option<i64>) -> anyhow::Result<Option<i64>> {
        let (Some(token), Some(chat_id)) = (&self.token, &self.chat_id) else {
            debug!("telegram not configured, dropping notification");
            return Ok(None);
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(id) = reply_to {
            body["reply_to_message_id"] = serde_json::json!(id);
        }

        let resp = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("telegram API error: {}", body);
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(body.pointer("/result/message_id").and_then(|v| v.as_i64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_markdown_characters() {
        assert_eq!(escape_markdown("GBP_JPY"), "GBP\\_JPY");
        assert_eq!(escape_markdown("a*b"), "a\\*b");
        assert_eq!(escape_markdown("x[1]"), "x\\[1]");
        assert_eq!(escape_markdown("`code`"), "\\`code\\`");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape_markdown("EURUSD"), "EURUSD");
    }

    #[test]
    fn signal_text_escapes_symbol() {
        let text = signal_text("GBP_JPY", Direction::Buy, "01/01/2026, 09:00:00 AM");
        assert!(text.contains("GBP\\_JPY"));
        assert!(text.contains("Type: BUY"));
    }

    #[test]
    fn status_text_renders_five_decimals() {
        let text = status_text("TP1_HIT", 1.0851, 0.0005);
        assert!(text.contains("Profit: 0.00050"));
        assert!(text.contains("TP1\\_HIT"));
    }
}
