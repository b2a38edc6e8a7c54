use crate::config::Config;
use crate::transport::{ChatId, ChatTransport, MessageId, OptionButton, TextFormat};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// Telegram update types
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// The part of a sent message we keep
#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

// Outgoing request types
#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ReplyMarkup {
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
    Reply {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
    },
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some("HTML"),
    }
}

/// Telegram Bot API client
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    /// `<api url>/bot<token>`, without a trailing slash
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.telegram_api_url.trim_end_matches('/'),
                config.telegram_bot_token
            ),
            poll_timeout: Duration::from_secs(config.telegram_poll_timeout_secs),
        }
    }

    /// Call a Bot API method and unwrap its envelope
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context(format!("Failed to send {} request to Telegram API", method))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Telegram API response")?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            anyhow::anyhow!("Telegram API error ({}): {} [{}]", status, body, e)
        })?;

        if !parsed.ok {
            anyhow::bail!(
                "Telegram API error ({}) on {}: {}",
                status,
                method,
                parsed.description.unwrap_or_default()
            );
        }

        parsed
            .result
            .context(format!("Telegram API {} response had no result", method))
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message", "callback_query"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        debug!("Received {} updates (offset {})", updates.len(), offset);
        Ok(updates)
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
        reply_markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        let request = SendMessageRequest {
            chat_id: chat.0,
            text,
            parse_mode: parse_mode(format),
            reply_markup,
        };
        let sent: SentMessage = self.call("sendMessage", &request).await?;
        Ok(MessageId(sent.message_id))
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str, format: TextFormat) -> Result<MessageId> {
        self.send_message(chat, text, format, None).await
    }

    async fn send_with_menu(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
        labels: &[&str],
    ) -> Result<MessageId> {
        let markup = ReplyMarkup::Reply {
            keyboard: labels
                .iter()
                .map(|label| {
                    vec![KeyboardButton {
                        text: label.to_string(),
                    }]
                })
                .collect(),
            resize_keyboard: true,
        };
        self.send_message(chat, text, format, Some(markup)).await
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<()> {
        let request = EditMessageTextRequest {
            chat_id: chat.0,
            message_id: message.0,
            text,
            parse_mode: parse_mode(format),
        };
        // The edited message comes back as the result; only success matters
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn send_options(
        &self,
        chat: ChatId,
        text: &str,
        rows: &[Vec<OptionButton>],
    ) -> Result<MessageId> {
        let markup = ReplyMarkup::Inline {
            inline_keyboard: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|option| InlineKeyboardButton {
                            text: option.label.clone(),
                            callback_data: option.token.clone(),
                        })
                        .collect()
                })
                .collect(),
        };
        self.send_message(chat, text, TextFormat::Plain, Some(markup))
            .await
    }

    async fn acknowledge_selection(&self, selection_id: &str) -> Result<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id: selection_id,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }
}
