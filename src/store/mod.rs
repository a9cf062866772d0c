// Binding persistence: who owns the board, and which chats get its events
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::info;

use crate::types::ChatId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Ownership row: the chat that provisioned and administers a board.
/// At most one row per board_id; the upsert key is the board, not the chat.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwnerBinding {
    pub board_id: String,
    pub telegram_id: i64,
    pub email: Option<String>,
    pub first_name: String,
}

/// Subscription row: a chat that receives card-movement notices for a board.
/// Append-only; duplicates are allowed and preserved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotifyBinding {
    pub chat_id: i64,
    pub board_id: String,
}

/// The single source of truth shared by the command and relay paths.
/// Behind a trait so tests can substitute an in-memory implementation.
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Insert or update the owner row for a board. On conflict only the
    /// email changes; telegram_id and first_name keep their first recorded
    /// values. That asymmetry is deliberate and observable.
    async fn upsert_owner(
        &self,
        board_id: &str,
        chat: ChatId,
        first_name: &str,
        email: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Subscribe a chat to a board's events. Plain insert, no dedup:
    /// repeated binds append additional rows.
    async fn bind_chat(&self, chat: ChatId, board_id: &str) -> Result<(), StoreError>;

    /// Chat ids subscribed to a board, in insertion order.
    async fn chats_for_board(&self, board_id: &str) -> Result<Vec<i64>, StoreError>;

    /// Resolve a board member's email to the owner name on record.
    async fn owner_name_by_email(&self, email: &str) -> Result<Option<String>, StoreError>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres-backed store over a shared connection pool.
pub struct PgBindingStore {
    pool: PgPool,
}

impl PgBindingStore {
    /// Connect and bring the schema up to date. Failures here are fatal to
    /// startup by design.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Connected to binding store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl BindingStore for PgBindingStore {
    async fn upsert_owner(
        &self,
        board_id: &str,
        chat: ChatId,
        first_name: &str,
        email: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO boards (board_id, telegram_id, email, first_name)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (board_id) DO UPDATE SET email = EXCLUDED.email",
        )
        .bind(board_id)
        .bind(chat.raw())
        .bind(email)
        .bind(first_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bind_chat(&self, chat: ChatId, board_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO chats (chat_id, board_id) VALUES ($1, $2)")
            .bind(chat.raw())
            .bind(board_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn chats_for_board(&self, board_id: &str) -> Result<Vec<i64>, StoreError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT chat_id FROM chats WHERE board_id = $1 ORDER BY id")
                .bind(board_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn owner_name_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT first_name FROM boards WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(name,)| name))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
