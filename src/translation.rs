use crate::detection::LanguageDetector;
use crate::i18n::strings;
use crate::openai::{CompletionError, CompletionProvider, Message};
use crate::session::SessionStore;
use crate::transport::{ChatId, ChatTransport, TextFormat, UserId};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest text Telegram accepts in a single message
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Split `text` into pieces of at most [`MAX_MESSAGE_CHARS`] characters.
fn split_message(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(MAX_MESSAGE_CHARS)
            .map_or(rest.len(), |(index, _)| index);
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// One incoming message to translate.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub chat: ChatId,
    pub user: UserId,
    pub text: String,
}

/// Provider failure categories shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidRequest,
    RateLimited,
    Connection,
    Unexpected,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::InvalidRequest => strings::INVALID_REQUEST,
            FailureKind::RateLimited => strings::RATE_LIMITED,
            FailureKind::Connection => strings::CONNECTION_ERROR,
            FailureKind::Unexpected => strings::UNEXPECTED_ERROR,
        }
    }
}

impl From<&CompletionError> for FailureKind {
    fn from(error: &CompletionError) -> Self {
        match error {
            CompletionError::InvalidRequest(_) => FailureKind::InvalidRequest,
            CompletionError::RateLimited(_) => FailureKind::RateLimited,
            CompletionError::Connection(_) => FailureKind::Connection,
            CompletionError::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

/// What happened to a translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    EmptyInput,
    AlreadyTargetLanguage,
    Failed(FailureKind),
}

/// Turns free text into a translation reply.
#[derive(Clone)]
pub struct Translator {
    sessions: SessionStore,
    provider: Arc<dyn CompletionProvider>,
    detector: Arc<dyn LanguageDetector>,
    transport: Arc<dyn ChatTransport>,
}

impl Translator {
    pub fn new(
        sessions: SessionStore,
        provider: Arc<dyn CompletionProvider>,
        detector: Arc<dyn LanguageDetector>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            sessions,
            provider,
            detector,
            transport,
        }
    }

    /// Translate `request.text` into the conversation's target language and
    /// reply with the result.
    ///
    /// Provider failures become a [`TranslationOutcome::Failed`] and a notice
    /// to the user. Only transport errors (the reply itself could not be sent)
    /// are returned as `Err`.
    pub async fn translate(&self, request: TranslationRequest) -> Result<TranslationOutcome> {
        let TranslationRequest { chat, user, text } = request;

        if text.trim().is_empty() {
            info!("User {} sent empty text", user);
            self.transport
                .send_text(chat, strings::EMPTY_INPUT, TextFormat::Plain)
                .await?;
            return Ok(TranslationOutcome::EmptyInput);
        }

        let session = self.sessions.get(chat);
        let target = session.selected_language();

        match self.detector.detect(&text).await {
            Ok(code) if code == target.code() => {
                info!(
                    "User {} sent text already in {} ({}), skipping translation",
                    user,
                    target.name(),
                    code
                );
                self.transport
                    .send_text(chat, strings::ALREADY_TARGET_LANGUAGE, TextFormat::Plain)
                    .await?;
                return Ok(TranslationOutcome::AlreadyTargetLanguage);
            }
            Ok(_) => {}
            Err(e) => warn!("Language detection failed for user {}: {}", user, e),
        }

        info!(
            "User {} requested translation to {}: {}",
            user,
            target.name(),
            text
        );
        let in_progress = self
            .transport
            .send_text(chat, strings::LOADING_MESSAGE, TextFormat::Plain)
            .await?;

        let messages = [
            Message::system(session.instruction_prompt()),
            Message::user(text),
        ];

        let outcome = match self.provider.complete(&messages).await {
            Ok(translated) => {
                info!("Translation successful for user {}: {}", user, translated);
                let mut chunks = split_message(&translated).into_iter();
                let first = chunks.next().unwrap_or_default();

                match self
                    .transport
                    .edit_text(chat, in_progress, first, TextFormat::Plain)
                    .await
                {
                    Ok(()) => {
                        for chunk in chunks {
                            self.transport
                                .send_text(chat, chunk, TextFormat::Plain)
                                .await?;
                        }
                        TranslationOutcome::Translated(translated)
                    }
                    Err(e) => {
                        // Leave the user a notice instead of the loading message
                        error!("Failed to deliver translation to user {}: {:#}", user, e);
                        self.transport
                            .edit_text(
                                chat,
                                in_progress,
                                strings::UNEXPECTED_ERROR,
                                TextFormat::Plain,
                            )
                            .await?;
                        TranslationOutcome::Failed(FailureKind::Unexpected)
                    }
                }
            }
            Err(e) => {
                let kind = FailureKind::from(&e);
                error!(
                    "Translation failed for user {} ({}): {}",
                    user,
                    e.category(),
                    e
                );
                self.transport
                    .edit_text(chat, in_progress, kind.message(), TextFormat::Plain)
                    .await?;
                TranslationOutcome::Failed(kind)
            }
        };

        Ok(outcome)
    }
}
