//! Configuration — TOML file defaults + environment variable overrides.
//!
//! Non-secret defaults live in `config/default.toml`. Secrets (database
//! URL, Telegram token, dashboard credentials) come from environment
//! variables, keeping the names the MT4-side deployment already exports.

use serde::Deserialize;
use std::env;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

/// Dashboard login plus the bulk-delete password.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub delete_password: String,
}

fn default_username() -> String {
    "admin".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Rows older than this are swept on signal ingestion and hidden from
    /// the trade list.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i32,
    /// Row cap for GET /api/trades.
    #[serde(default = "default_list_limit")]
    pub list_limit: i64,
}

fn default_max_age_days() -> i32 {
    30
}

fn default_list_limit() -> i64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_output: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from `config/default.toml` merged with env vars.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("TSD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Config = builder.try_deserialize()?;

        // Override secrets from env (these should never be in TOML)
        if let Ok(v) = env::var("DATABASE_URL") {
            cfg.database.url = v;
        }
        if let Ok(v) = env::var("TG_BOT_TOKEN") {
            cfg.telegram.bot_token = Some(v);
        }
        if let Ok(v) = env::var("TG_CHAT_ID") {
            cfg.telegram.chat_id = Some(v);
        }
        if let Ok(v) = env::var("APP_USER") {
            cfg.auth.username = v;
        }
        if let Ok(v) = env::var("APP_PASSWORD") {
            cfg.auth.password = v;
        }
        if let Ok(v) = env::var("DELETE_PASSWORD") {
            cfg.auth.delete_password = v;
        }
        if let Ok(v) = env::var("PORT") {
            cfg.server.port = v.parse().unwrap_or(cfg.server.port);
        }

        Ok(cfg)
    }
}
