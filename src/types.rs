// Shared plain types crossing module boundaries
use serde::{Deserialize, Serialize};

/// Chat identifier, tagged by chat kind.
///
/// Telegram encodes group chats as negative ids; that sign test happens
/// exactly once, here, rather than ad hoc inside each command workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatId {
    /// One-to-one chat between the bot and a single user.
    Direct(i64),
    /// Multi-party chat thread.
    Group(i64),
}

impl ChatId {
    pub fn from_raw(id: i64) -> Self {
        if id < 0 {
            ChatId::Group(id)
        } else {
            ChatId::Direct(id)
        }
    }

    /// Underlying Telegram id, as sent on the wire.
    pub fn raw(&self) -> i64 {
        match self {
            ChatId::Direct(id) | ChatId::Group(id) => *id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ChatId::Group(_))
    }
}

/// One decoded inbound chat message. Transient: produced by the Telegram
/// update decoder, consumed once by the command router, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat: ChatId,
    pub first_name: String,
    pub text: String,
}

/// The single actionable board event: a card moved between columns.
/// Every other event type decodes to "no event" and is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMovedEvent {
    pub card: String,
    pub column: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_group_chats() {
        assert_eq!(ChatId::from_raw(-555), ChatId::Group(-555));
        assert!(ChatId::from_raw(-555).is_group());
    }

    #[test]
    fn positive_ids_are_direct_chats() {
        assert_eq!(ChatId::from_raw(111), ChatId::Direct(111));
        assert!(!ChatId::from_raw(111).is_group());
    }

    #[test]
    fn raw_round_trips() {
        assert_eq!(ChatId::from_raw(-555).raw(), -555);
        assert_eq!(ChatId::from_raw(111).raw(), 111);
    }
}
