#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use tower::ServiceExt;

use trellogram::config::{AppConfig, TelegramConfig, TrelloConfig};
use trellogram::handlers::{app, AppState};
use trellogram::store::{BindingStore, NotifyBinding, OwnerBinding, StoreError};
use trellogram::types::ChatId;

pub const BOARD_ID: &str = "abc123abc123abc123abc123";
pub const BOT_TOKEN: &str = "test-token";

/// In-memory BindingStore with the same observable semantics as the
/// Postgres implementation: owner upsert keyed by board_id updating only
/// the email on conflict, append-only chat bindings.
#[derive(Default)]
pub struct MemoryStore {
    owners: Mutex<Vec<OwnerBinding>>,
    chats: Mutex<Vec<NotifyBinding>>,
}

impl MemoryStore {
    pub fn owners(&self) -> Vec<OwnerBinding> {
        self.owners.lock().unwrap().clone()
    }

    pub fn chats(&self) -> Vec<NotifyBinding> {
        self.chats.lock().unwrap().clone()
    }
}

#[async_trait]
impl BindingStore for MemoryStore {
    async fn upsert_owner(
        &self,
        board_id: &str,
        chat: ChatId,
        first_name: &str,
        email: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut owners = self.owners.lock().unwrap();
        match owners.iter_mut().find(|o| o.board_id == board_id) {
            Some(existing) => existing.email = email.map(str::to_string),
            None => owners.push(OwnerBinding {
                board_id: board_id.to_string(),
                telegram_id: chat.raw(),
                email: email.map(str::to_string),
                first_name: first_name.to_string(),
            }),
        }
        Ok(())
    }

    async fn bind_chat(&self, chat: ChatId, board_id: &str) -> Result<(), StoreError> {
        self.chats.lock().unwrap().push(NotifyBinding {
            chat_id: chat.raw(),
            board_id: board_id.to_string(),
        });
        Ok(())
    }

    async fn chats_for_board(&self, board_id: &str) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.board_id == board_id)
            .map(|c| c.chat_id)
            .collect())
    }

    async fn owner_name_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .owners
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.email.as_deref() == Some(email))
            .map(|o| o.first_name.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The bridge wired against mock Telegram and Trello servers and an
/// in-memory store, driven in-process through the router.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub telegram: ServerGuard,
    pub trello: ServerGuard,
}

pub async fn spawn() -> TestApp {
    let telegram = mockito::Server::new_async().await;
    let trello = mockito::Server::new_async().await;

    let config = AppConfig {
        telegram: TelegramConfig {
            bot_token: BOT_TOKEN.to_string(),
            api_url: telegram.url(),
            webhook_url: "https://bridge.example.com/webhook/telegram".to_string(),
        },
        trello: TrelloConfig {
            api_key: "test-key".to_string(),
            api_token: "test-trello-token".to_string(),
            api_url: trello.url(),
            board_id: BOARD_ID.to_string(),
            callback_url: "https://bridge.example.com/webhook/trello".to_string(),
            done_columns: vec!["Done".to_string()],
        },
        database_url: "postgres://unused".to_string(),
        port: 0,
    };

    let store = Arc::new(MemoryStore::default());
    let state = Arc::new(AppState::new(config, store.clone()));

    TestApp {
        app: app(state),
        store,
        telegram,
        trello,
    }
}

impl TestApp {
    /// Expect one sendMessage call with exactly this text (and chat id).
    pub async fn expect_send(&mut self, chat_id: i64, text: &str) -> Mock {
        self.telegram
            .mock("POST", format!("/bot{}/sendMessage", BOT_TOKEN).as_str())
            .match_body(Matcher::PartialJson(json!({ "chat_id": chat_id, "text": text })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await
    }

    /// Expect zero sendMessage calls of any kind.
    pub async fn expect_no_sends(&mut self) -> Mock {
        self.telegram
            .mock("POST", format!("/bot{}/sendMessage", BOT_TOKEN).as_str())
            .expect(0)
            .create_async()
            .await
    }
}

pub fn telegram_update(chat_id: i64, first_name: &str, text: &str) -> Value {
    json!({
        "message": {
            "chat": { "id": chat_id, "first_name": first_name },
            "text": text
        }
    })
}

pub fn card_moved_payload(card: &str, column: &str) -> Value {
    json!({
        "action": {
            "type": "updateCard",
            "data": {
                "card": { "name": card },
                "list": { "name": column }
            }
        }
    })
}

pub async fn post_json(app: &Router, path: &str, body: &Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &Router, path: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn head(app: &Router, path: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn assert_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}
