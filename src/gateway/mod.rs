// Outbound façades over the Telegram and Trello HTTP APIs.
//
// Both gateways are constructed once at startup from injected config and
// hold their own reqwest client; nothing here is process-global.
pub mod telegram;
pub mod trello;

use thiserror::Error;

pub use telegram::TelegramGateway;
pub use trello::TrelloGateway;

/// Generic gateway failure. Network and non-2xx responses collapse into
/// `Http`; the remaining variants are local precondition failures raised
/// before any request is made.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid board id: {0}")]
    InvalidBoardId(String),

    #[error("Board {0} has no columns")]
    NoColumns(String),

    #[error("Column {0} not found among created columns")]
    ColumnNotFound(String),
}
