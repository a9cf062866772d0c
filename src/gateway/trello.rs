// Trello REST façade: board/column/card operations, member invitation,
// webhook registration, and inbound event decoding
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::GatewayError;
use crate::config::TrelloConfig;
use crate::types::CardMovedEvent;

#[derive(Debug, Clone, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default, rename = "idList")]
    pub id_list: String,
    #[serde(default, rename = "idMembers")]
    pub id_members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A card considered active for the /tasks listing, with its column name
/// and member emails already resolved.
#[derive(Debug, Clone)]
pub struct ActiveCard {
    pub name: String,
    pub column: String,
    pub member_emails: Vec<String>,
}

pub struct TrelloGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    api_token: String,
}

impl TrelloGateway {
    pub fn new(config: &TrelloConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}{}?key={}&token={}",
            self.api_url, endpoint, self.api_key, self.api_token
        )
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<(), GatewayError> {
        self.client
            .put(self.url(endpoint))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Boards visible to the configured token.
    pub async fn boards(&self) -> Result<Vec<Board>, GatewayError> {
        self.get("/members/me/boards").await
    }

    /// Columns (lists) on a board, in board order.
    pub async fn columns(&self, board_id: &str) -> Result<Vec<Column>, GatewayError> {
        self.get(&format!("/boards/{}/lists", board_id)).await
    }

    /// Create columns that do not already exist on the board, matching
    /// existing names case-sensitively. Returns requested-name -> created-id
    /// for the columns actually created; pre-existing names are skipped.
    pub async fn create_columns(
        &self,
        board_id: &str,
        names: &[String],
    ) -> Result<HashMap<String, String>, GatewayError> {
        let existing = self.columns(board_id).await?;
        let existing_names: Vec<&str> = existing.iter().map(|c| c.name.as_str()).collect();

        let mut created = HashMap::new();
        for name in names {
            if existing_names.contains(&name.as_str()) {
                continue;
            }
            let column: Column = self
                .post("/lists", &json!({ "name": name, "idBoard": board_id }))
                .await?;
            created.insert(name.clone(), column.id);
        }
        Ok(created)
    }

    /// Create cards inside columns returned by `create_columns`. A column
    /// name absent from that mapping is a "column not found" error.
    pub async fn create_cards(
        &self,
        created_columns: &HashMap<String, String>,
        cards: &HashMap<String, Vec<String>>,
    ) -> Result<HashMap<String, Card>, GatewayError> {
        let mut created = HashMap::new();
        for (column_name, card_names) in cards {
            let column_id = created_columns
                .get(column_name)
                .ok_or_else(|| GatewayError::ColumnNotFound(column_name.clone()))?;
            for card_name in card_names {
                let card: Card = self
                    .post("/cards", &json!({ "idList": column_id, "name": card_name }))
                    .await?;
                created.insert(card_name.clone(), card);
            }
        }
        Ok(created)
    }

    /// Create a card in the board's first column.
    pub async fn add_card(&self, board_id: &str, name: &str) -> Result<Card, GatewayError> {
        if !is_valid_board_id(board_id) {
            return Err(GatewayError::InvalidBoardId(board_id.to_string()));
        }

        let columns = self.columns(board_id).await?;
        let first = columns
            .first()
            .ok_or_else(|| GatewayError::NoColumns(board_id.to_string()))?;

        self.post("/cards", &json!({ "idList": first.id, "name": name }))
            .await
    }

    /// Fetch a single card by id.
    pub async fn card(&self, card_id: &str) -> Result<Card, GatewayError> {
        self.get(&format!("/cards/{}", card_id)).await
    }

    /// Shareable board URL. No request involved.
    pub fn board_url(&self, board_id: &str) -> String {
        format!("https://trello.com/b/{}", board_id)
    }

    /// Invite a member to the board by email.
    pub async fn add_member(
        &self,
        board_id: &str,
        email: &str,
        role: &str,
    ) -> Result<(), GatewayError> {
        self.put(
            &format!("/boards/{}/members", board_id),
            &json!({ "email": email, "type": role }),
        )
        .await
    }

    /// Register a webhook delivering the board's events to `callback_url`.
    pub async fn add_webhook(
        &self,
        board_id: &str,
        callback_url: &str,
        description: &str,
    ) -> Result<Value, GatewayError> {
        self.post(
            "/webhooks",
            &json!({
                "idModel": board_id,
                "callbackURL": callback_url,
                "description": description,
            }),
        )
        .await
    }

    /// Open cards outside the done columns, with column names and member
    /// emails resolved against the board's roster.
    pub async fn active_cards(
        &self,
        board_id: &str,
        done_columns: &[String],
    ) -> Result<Vec<ActiveCard>, GatewayError> {
        let columns = self.columns(board_id).await?;
        let column_names: HashMap<&str, &str> = columns
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        let members: Vec<Member> = self
            .get(&format!("/boards/{}/members", board_id))
            .await?;
        let member_emails: HashMap<&str, &str> = members
            .iter()
            .filter_map(|m| m.email.as_deref().map(|e| (m.id.as_str(), e)))
            .collect();

        let cards: Vec<Card> = self.get(&format!("/boards/{}/cards", board_id)).await?;

        let mut active = Vec::new();
        for card in &cards {
            if card.closed {
                continue;
            }
            let column = match column_names.get(card.id_list.as_str()) {
                Some(name) => *name,
                None => continue,
            };
            if done_columns.iter().any(|done| done == column) {
                continue;
            }
            active.push(ActiveCard {
                name: card.name.clone(),
                column: column.to_string(),
                member_emails: card
                    .id_members
                    .iter()
                    .filter_map(|id| member_emails.get(id.as_str()).map(|e| e.to_string()))
                    .collect(),
            });
        }
        Ok(active)
    }

    /// Decode an inbound board webhook payload. Only "updateCard" actions
    /// are actionable; everything else is no event. Card and column names
    /// may still come back empty for updates that are not moves.
    pub fn decode_event(payload: &Value) -> Option<CardMovedEvent> {
        let action = payload.get("action")?;
        if action.get("type")?.as_str()? != "updateCard" {
            return None;
        }

        let data = action.get("data");
        let field = |outer: &str, inner: &str| -> String {
            data.and_then(|d| d.get(outer))
                .and_then(|v| v.get(inner))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(CardMovedEvent {
            card: field("card", "name"),
            column: field("list", "name"),
        })
    }
}

/// Trello board ids are 24 alphanumeric characters.
fn is_valid_board_id(board_id: &str) -> bool {
    board_id.len() == 24 && board_id.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_id_must_be_24_alnum_chars() {
        assert!(is_valid_board_id("abc123abc123abc123abc123"));
        assert!(!is_valid_board_id("abc123"));
        assert!(!is_valid_board_id("abc123abc123abc123abc12!"));
        assert!(!is_valid_board_id(""));
    }

    #[test]
    fn decodes_update_card_event() {
        let payload = json!({
            "action": {
                "type": "updateCard",
                "data": {
                    "card": { "name": "Ship it" },
                    "list": { "name": "In progress" }
                }
            }
        });
        let event = TrelloGateway::decode_event(&payload).unwrap();
        assert_eq!(event.card, "Ship it");
        assert_eq!(event.column, "In progress");
    }

    #[test]
    fn other_action_types_are_no_event() {
        let payload = json!({
            "action": { "type": "createCard", "data": { "card": { "name": "x" } } }
        });
        assert_eq!(TrelloGateway::decode_event(&payload), None);
    }

    #[test]
    fn malformed_payloads_are_no_event() {
        assert_eq!(TrelloGateway::decode_event(&json!({})), None);
        assert_eq!(TrelloGateway::decode_event(&json!({ "action": {} })), None);
        assert_eq!(TrelloGateway::decode_event(&json!({ "model": {} })), None);
    }

    #[test]
    fn missing_names_decode_to_empty_strings() {
        let payload = json!({ "action": { "type": "updateCard", "data": {} } });
        let event = TrelloGateway::decode_event(&payload).unwrap();
        assert_eq!(event.card, "");
        assert_eq!(event.column, "");
    }
}
