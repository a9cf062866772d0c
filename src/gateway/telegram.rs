// Telegram Bot API façade: outbound sends plus inbound update decoding
use serde_json::{json, Map, Value};

use super::GatewayError;
use crate::config::TelegramConfig;
use crate::types::{ChatId, InboundMessage};

pub struct TelegramGateway {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramGateway {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            bot_token: config.bot_token.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// Send a text message, with optional extra parameters (keyboard markup
    /// and the like) merged into the request body. Failures are reported to
    /// the caller, never retried.
    pub async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        options: Option<Value>,
    ) -> Result<(), GatewayError> {
        let mut body = match options {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        body.insert("chat_id".to_string(), json!(chat.raw()));
        body.insert("text".to_string(), json!(text));

        self.client
            .post(self.method_url("sendMessage"))
            .json(&Value::Object(body))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Point Telegram's update delivery at the given public URL.
    pub async fn set_webhook(&self, url: &str) -> Result<(), GatewayError> {
        self.client
            .post(self.method_url("setWebhook"))
            .json(&json!({ "url": url }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Decode an inbound webhook update. Anything without a message text is
    /// nothing to do, not an error.
    pub fn decode_update(update: &Value) -> Option<InboundMessage> {
        let message = update.get("message")?;
        let chat = message.get("chat")?;
        let id = chat.get("id")?.as_i64()?;
        let first_name = chat
            .get("first_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let text = message.get("text")?.as_str()?.to_string();

        Some(InboundMessage {
            chat: ChatId::from_raw(id),
            first_name,
            text,
        })
    }
}
