//! Command, menu and selection handlers.

use crate::i18n::strings;
use crate::selector::LanguageSelector;
use crate::session::SessionStore;
use crate::transport::{ChatId, ChatTransport, MessageId, TextFormat, UserId};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct CommandHandlers {
    sessions: SessionStore,
    selector: LanguageSelector,
    transport: Arc<dyn ChatTransport>,
}

impl CommandHandlers {
    pub fn new(
        sessions: SessionStore,
        selector: LanguageSelector,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            sessions,
            selector,
            transport,
        }
    }

    /// `/start`: reset the session and greet with the default language.
    pub async fn on_start(&self, chat: ChatId, user: UserId) -> Result<()> {
        let session = self.sessions.reset(chat);
        info!("User {} initiated the /start command", user);

        self.transport
            .send_with_menu(
                chat,
                &strings::welcome(session.selected_language()),
                TextFormat::Html,
                &[strings::CHANGE_LANGUAGE_BUTTON],
            )
            .await?;
        Ok(())
    }

    /// `/help`: static usage text, session untouched.
    pub async fn on_help(&self, chat: ChatId, user: UserId) -> Result<()> {
        info!("User {} requested help", user);
        self.transport
            .send_text(chat, strings::HELP, TextFormat::Html)
            .await?;
        Ok(())
    }

    /// The "Change Language" button: show the catalog as inline options.
    pub async fn on_change_language(&self, chat: ChatId, user: UserId) -> Result<()> {
        info!("User {} requested to change language", user);
        self.transport
            .send_options(chat, strings::CHOOSE_LANGUAGE, &self.selector.keyboard())
            .await?;
        Ok(())
    }

    /// A tap on one of the inline options.
    ///
    /// The menu message is edited into a confirmation. An unknown token only
    /// gets the callback acknowledged.
    pub async fn on_selection(
        &self,
        chat: ChatId,
        user: UserId,
        selection_id: &str,
        menu: Option<MessageId>,
        token: &str,
    ) -> Result<()> {
        match self.selector.apply_selection(chat, token) {
            Ok(confirmation) => {
                info!(
                    "User {} selected language: {}",
                    user,
                    confirmation.language.name()
                );
                self.transport.acknowledge_selection(selection_id).await?;
                match menu {
                    Some(message) => {
                        self.transport
                            .edit_text(chat, message, &confirmation.text, TextFormat::Html)
                            .await?
                    }
                    None => {
                        self.transport
                            .send_text(chat, &confirmation.text, TextFormat::Html)
                            .await?;
                    }
                }
            }
            Err(e) => {
                warn!("User {} sent a bad selection: {}", user, e);
                self.transport.acknowledge_selection(selection_id).await?;
            }
        }
        Ok(())
    }
}
