// HTTP surface: the two inbound webhooks plus admin/bootstrap endpoints
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::gateway::{TelegramGateway, TrelloGateway};
use crate::services::{CommandRouter, EventRelay};
use crate::store::BindingStore;

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn BindingStore>,
    pub telegram: Arc<TelegramGateway>,
    pub trello: Arc<TrelloGateway>,
    pub router: CommandRouter,
    pub relay: EventRelay,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn BindingStore>) -> Self {
        let telegram = Arc::new(TelegramGateway::new(&config.telegram));
        let trello = Arc::new(TrelloGateway::new(&config.trello));

        let router = CommandRouter::new(
            store.clone(),
            telegram.clone(),
            trello.clone(),
            config.trello.board_id.clone(),
            config.trello.done_columns.clone(),
        );
        let relay = EventRelay::new(
            store.clone(),
            telegram.clone(),
            config.trello.board_id.clone(),
        );

        Self {
            config,
            store,
            telegram,
            trello,
            router,
            relay,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Inbound webhooks
        .route("/webhook/telegram", post(telegram_webhook))
        .route(
            "/webhook/trello",
            post(trello_webhook).head(trello_webhook_check),
        )
        // Bootstrap/admin
        .route("/admin/telegram/webhook", post(register_telegram_webhook))
        .route("/admin/trello/webhook", post(register_trello_webhook))
        .route("/admin/boards", get(list_boards))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Trellogram",
            "version": version,
            "description": "Telegram bot bridging chat commands to a Trello board",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "telegram_webhook": "/webhook/telegram (inbound updates)",
                "trello_webhook": "/webhook/trello (inbound board events)",
                "admin": "/admin/* (bootstrap: webhook registration, board listing)",
            }
        }
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}

/// Inbound Telegram update. Always 200: an undecodable update is nothing to
/// do, and command failures are already handled as chat replies.
async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Value>,
) -> StatusCode {
    if let Some(message) = TelegramGateway::decode_update(&update) {
        state.router.route(message).await;
    }
    StatusCode::OK
}

/// Inbound Trello board event. Always 200; non-actionable events are
/// silently dropped by the relay.
async fn trello_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> StatusCode {
    state.relay.relay(&payload).await;
    StatusCode::OK
}

/// Trello probes the callback URL with a HEAD request when a webhook is
/// registered; it must answer 200 for registration to succeed.
async fn trello_webhook_check() -> StatusCode {
    StatusCode::OK
}

async fn register_telegram_webhook(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let url = &state.config.telegram.webhook_url;
    state.telegram.set_webhook(url).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "webhook_url": url }
    })))
}

async fn register_trello_webhook(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let webhook = state
        .trello
        .add_webhook(
            &state.config.trello.board_id,
            &state.config.trello.callback_url,
            "Trellogram webhook",
        )
        .await?;
    Ok(Json(json!({ "success": true, "data": webhook })))
}

async fn list_boards(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let boards: Vec<Value> = state
        .trello
        .boards()
        .await?
        .into_iter()
        .map(|b| json!({ "id": b.id, "name": b.name }))
        .collect();
    Ok(Json(json!({ "success": true, "data": boards })))
}
