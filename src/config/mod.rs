use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Process configuration, assembled once at startup from the environment
/// (after dotenvy has loaded .env) and injected into the gateways and
/// handlers. No ambient singletons: everything downstream receives this
/// by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub trello: TrelloConfig,
    pub database_url: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Base API URL, overridable for tests (TELEGRAM_API_URL).
    pub api_url: String,
    /// Public URL Telegram should push updates to (TELEGRAM_WEBHOOK_URL).
    pub webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub api_key: String,
    pub api_token: String,
    /// Base API URL, overridable for tests (TRELLO_API_URL).
    pub api_url: String,
    /// The single board this bridge manages (TRELLO_BOARD).
    pub board_id: String,
    /// Callback URL registered for board webhooks (TRELLO_CALLBACK).
    pub callback_url: String,
    /// Column names whose cards do not count as active for /tasks
    /// (BRIDGE_DONE_COLUMNS, comma-separated).
    pub done_columns: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram = TelegramConfig {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            api_url: optional("TELEGRAM_API_URL", "https://api.telegram.org"),
            webhook_url: required("TELEGRAM_WEBHOOK_URL")?,
        };

        let trello = TrelloConfig {
            api_key: required("TRELLO_API_KEY")?,
            api_token: required("TRELLO_API_TOKEN")?,
            api_url: optional("TRELLO_API_URL", "https://api.trello.com/1"),
            board_id: required("TRELLO_BOARD")?,
            callback_url: required("TRELLO_CALLBACK")?,
            done_columns: parse_done_columns(env::var("BRIDGE_DONE_COLUMNS").ok()),
        };

        let port = env::var("BRIDGE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3000);

        Ok(Self {
            telegram,
            trello,
            database_url: required("DATABASE_URL")?,
            port,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn optional(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_done_columns(raw: Option<String>) -> Vec<String> {
    match raw {
        Some(v) => v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec!["Done".to_string()],
    }
}
