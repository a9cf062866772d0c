// Inbound chat message classification and command workflows
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

use crate::error::BridgeError;
use crate::gateway::{TelegramGateway, TrelloGateway};
use crate::store::BindingStore;
use crate::types::InboundMessage;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub fn is_valid_email(text: &str) -> bool {
    EMAIL_RE.is_match(text)
}

/// Intent of an inbound message. Classification is first-match-wins over an
/// ordered predicate list: exact match, then substring, then prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Start,
    EmailSubmission(&'a str),
    CreateColumn(&'a str),
    CreateCard(&'a str),
    BindChat,
    ListTasks,
    Unknown,
}

fn classify(text: &str) -> Command<'_> {
    if text == "/start" {
        Command::Start
    } else if text.contains('@') {
        Command::EmailSubmission(text)
    } else if let Some(name) = text.strip_prefix("/col ") {
        Command::CreateColumn(name)
    } else if let Some(name) = text.strip_prefix("/card ") {
        Command::CreateCard(name)
    } else if text.starts_with("/bind") {
        Command::BindChat
    } else if text.contains("/tasks") {
        Command::ListTasks
    } else {
        Command::Unknown
    }
}

/// Executes chat commands against the binding store and the two gateways.
///
/// `route` never raises: collaborator failures become a best-effort "Error"
/// reply, and chat-kind precondition violations terminate silently with no
/// reply at all. Holds no state between invocations; the store is the only
/// place cross-request state lives.
pub struct CommandRouter {
    store: Arc<dyn BindingStore>,
    telegram: Arc<TelegramGateway>,
    trello: Arc<TrelloGateway>,
    board_id: String,
    done_columns: Vec<String>,
}

impl CommandRouter {
    pub fn new(
        store: Arc<dyn BindingStore>,
        telegram: Arc<TelegramGateway>,
        trello: Arc<TrelloGateway>,
        board_id: String,
        done_columns: Vec<String>,
    ) -> Self {
        Self {
            store,
            telegram,
            trello,
            board_id,
            done_columns,
        }
    }

    pub async fn route(&self, message: InboundMessage) {
        let chat = message.chat;
        if let Err(err) = self.dispatch(&message).await {
            error!("Command failed for chat {}: {}", chat.raw(), err);
            // Best effort; a failed error reply is only logged.
            if let Err(send_err) = self.telegram.send_message(chat, "Error", None).await {
                error!("Failed to send error reply to chat {}: {}", chat.raw(), send_err);
            }
        }
    }

    async fn dispatch(&self, message: &InboundMessage) -> Result<(), BridgeError> {
        match classify(&message.text) {
            Command::Start => self.start(message).await,
            Command::EmailSubmission(email) => self.submit_email(message, email).await,
            Command::CreateColumn(name) => self.create_column(message, name).await,
            Command::CreateCard(name) => self.create_card(message, name).await,
            Command::BindChat => self.bind_chat(message).await,
            Command::ListTasks => self.list_tasks(message).await,
            Command::Unknown => self.reply(message, "Error").await,
        }
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), BridgeError> {
        self.telegram.send_message(message.chat, text, None).await?;
        Ok(())
    }

    /// `/start`: greet, prompt for email, record board ownership.
    /// Direct chats only; a group sending /start is dropped without a reply
    /// so groups cannot register themselves as board owners.
    async fn start(&self, message: &InboundMessage) -> Result<(), BridgeError> {
        if message.chat.is_group() {
            debug!("Dropping /start from group chat {}", message.chat.raw());
            return Ok(());
        }

        self.reply(message, &format!("Hello, {}!", message.first_name)).await?;
        self.reply(message, "Enter your email").await?;
        self.store
            .upsert_owner(&self.board_id, message.chat, &message.first_name, None)
            .await?;
        Ok(())
    }

    /// Any text containing `@`: treat as an email submission. Same
    /// direct-chat-only guard as /start. A valid address is recorded on the
    /// owner row, invited to the board, and answered with the board link;
    /// an invalid one gets "Wrong format" and touches nothing.
    async fn submit_email(&self, message: &InboundMessage, email: &str) -> Result<(), BridgeError> {
        if message.chat.is_group() {
            debug!("Dropping email submission from group chat {}", message.chat.raw());
            return Ok(());
        }

        if !is_valid_email(email) {
            return self.reply(message, "Wrong format").await;
        }

        self.reply(message, "Email added").await?;
        self.store
            .upsert_owner(&self.board_id, message.chat, &message.first_name, Some(email))
            .await?;
        self.trello.add_member(&self.board_id, email, "normal").await?;

        let url = self.trello.board_url(&self.board_id);
        self.reply(message, &format!("Your board link: {}", url)).await
    }

    /// `/col <name>`: create-if-absent column. An empty creation result
    /// means the name already existed, answered with "Error" as observed.
    async fn create_column(&self, message: &InboundMessage, name: &str) -> Result<(), BridgeError> {
        let created = self
            .trello
            .create_columns(&self.board_id, &[name.to_string()])
            .await?;

        if created.is_empty() {
            self.reply(message, "Error").await
        } else {
            self.reply(message, &format!("Column created {}", name)).await
        }
    }

    /// `/card <name>`: create a card in the board's first column. An empty
    /// name is rejected locally without any gateway call.
    async fn create_card(&self, message: &InboundMessage, name: &str) -> Result<(), BridgeError> {
        if name.is_empty() {
            return self.reply(message, "Error").await;
        }

        self.trello.add_card(&self.board_id, name).await?;
        self.reply(message, &format!("Card created {}", name)).await
    }

    /// `/bind`: subscribe a group chat to the board's events. Group chats
    /// only; a direct chat is dropped silently with no row inserted.
    async fn bind_chat(&self, message: &InboundMessage) -> Result<(), BridgeError> {
        if !message.chat.is_group() {
            debug!("Dropping /bind from direct chat {}", message.chat.raw());
            return Ok(());
        }

        self.store.bind_chat(message.chat, &self.board_id).await?;
        self.reply(message, "Chat linked to board").await
    }

    /// `/tasks`: one message per active card, then a count summary.
    async fn list_tasks(&self, message: &InboundMessage) -> Result<(), BridgeError> {
        let cards = self
            .trello
            .active_cards(&self.board_id, &self.done_columns)
            .await?;

        if cards.is_empty() {
            self.reply(message, "No active tasks").await?;
        }

        let count = cards.len();
        for card in &cards {
            let mut text = String::new();
            text.push_str(&format!("Name: {}\n", card.name));
            text.push_str(&format!("Column: {}\n", card.column));
            text.push_str("Members:\n");

            if card.member_emails.is_empty() {
                text.push_str("Unassigned\n");
            } else {
                for email in &card.member_emails {
                    match self.store.owner_name_by_email(email).await? {
                        Some(name) => {
                            text.push_str(&format!("Name: {}, Email: {}\n", name, email))
                        }
                        None => {
                            text.push_str(&format!("User not in group, Email: {}\n", email))
                        }
                    }
                }
            }

            self.reply(message, &text).await?;
        }

        self.reply(message, &format!("Active tasks: {}", count)).await
    }
}
