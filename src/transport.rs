//! Chat transport contract.
//!
//! Handlers talk to the chat platform only through [`ChatTransport`], so the
//! Telegram client can be swapped for an in-memory fake in tests.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation identifier; keys the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Identifier of the user who sent an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a message within a chat, needed to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the platform should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Sent verbatim; used for model output
    Plain,
    /// Telegram HTML subset (`<b>`, `<i>`, ...)
    Html,
}

/// One selectable option attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionButton {
    pub label: String,
    pub token: String,
}

/// Outbound operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message and return its id.
    async fn send_text(&self, chat: ChatId, text: &str, format: TextFormat) -> Result<MessageId>;

    /// Send a message that also installs a persistent reply keyboard with the given labels.
    async fn send_with_menu(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
        labels: &[&str],
    ) -> Result<MessageId>;

    /// Replace the text of a message sent earlier.
    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<()>;

    /// Send a message with selectable options laid out in the given rows.
    async fn send_options(
        &self,
        chat: ChatId,
        text: &str,
        rows: &[Vec<OptionButton>],
    ) -> Result<MessageId>;

    /// Tell the platform a selection was received so the client stops waiting.
    async fn acknowledge_selection(&self, selection_id: &str) -> Result<()>;
}
