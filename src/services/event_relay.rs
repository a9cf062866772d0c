// Board webhook events relayed into the bound notification chat
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::error::BridgeError;
use crate::gateway::{TelegramGateway, TrelloGateway};
use crate::store::BindingStore;
use crate::types::{CardMovedEvent, ChatId};

/// Forwards card-movement notices to whichever chat is bound to the board.
/// Everything that is not a card move, or that decodes incompletely, is a
/// silent no-op.
pub struct EventRelay {
    store: Arc<dyn BindingStore>,
    telegram: Arc<TelegramGateway>,
    board_id: String,
}

impl EventRelay {
    pub fn new(
        store: Arc<dyn BindingStore>,
        telegram: Arc<TelegramGateway>,
        board_id: String,
    ) -> Self {
        Self {
            store,
            telegram,
            board_id,
        }
    }

    pub async fn relay(&self, payload: &Value) {
        let Some(event) = TrelloGateway::decode_event(payload) else {
            return;
        };
        if event.card.is_empty() || event.column.is_empty() {
            return;
        }

        if let Err(err) = self.forward(&event).await {
            error!("Failed to relay board event: {}", err);
        }
    }

    async fn forward(&self, event: &CardMovedEvent) -> Result<(), BridgeError> {
        let chats = self.store.chats_for_board(&self.board_id).await?;
        // Single-row assumption: only the first bound chat gets the notice.
        let Some(chat_id) = chats.first() else {
            debug!("No chat bound to board {}, dropping event", self.board_id);
            return Ok(());
        };

        let text = format!(" {} moved to {} ", event.card, event.column);
        self.telegram
            .send_message(ChatId::from_raw(*chat_id), &text, None)
            .await?;
        Ok(())
    }
}
