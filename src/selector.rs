//! Language selection menu.

use crate::i18n::{strings, Language};
use crate::session::SessionStore;
use crate::transport::{ChatId, OptionButton};
use thiserror::Error;

/// Prefix shared by every selection token
pub const TOKEN_PREFIX: &str = "language_";

/// Maximum options per keyboard row
pub const ROW_WIDTH: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown selection token: {0}")]
    UnknownToken(String),
}

/// What to show the user after a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub language: Language,
    pub text: String,
}

/// Token identifying `language` in the selection keyboard.
pub fn selection_token(language: Language) -> String {
    format!("{}{}", TOKEN_PREFIX, language.name())
}

/// Whether a callback payload belongs to this menu.
pub fn is_selection_token(data: &str) -> bool {
    data.starts_with(TOKEN_PREFIX)
}

/// Presents the catalog and records the user's choice.
#[derive(Debug, Clone)]
pub struct LanguageSelector {
    sessions: SessionStore,
}

impl LanguageSelector {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    /// All catalog entries as (display name, selection token), in catalog order.
    pub fn list_options(&self) -> Vec<(String, String)> {
        Language::all()
            .map(|language| (language.name().to_string(), selection_token(language)))
            .collect()
    }

    /// The options grouped into keyboard rows of at most [`ROW_WIDTH`].
    pub fn keyboard(&self) -> Vec<Vec<OptionButton>> {
        self.list_options()
            .chunks(ROW_WIDTH)
            .map(|row| {
                row.iter()
                    .map(|(label, token)| OptionButton {
                        label: label.clone(),
                        token: token.clone(),
                    })
                    .collect()
            })
            .collect()
    }

    /// Resolve `token` and make its language the conversation's target.
    pub fn apply_selection(
        &self,
        chat: ChatId,
        token: &str,
    ) -> Result<Confirmation, SelectionError> {
        let name = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| SelectionError::UnknownToken(token.to_string()))?;

        let session = self
            .sessions
            .set_language(chat, name)
            .map_err(|_| SelectionError::UnknownToken(token.to_string()))?;

        let language = session.selected_language();
        Ok(Confirmation {
            language,
            text: strings::language_set(language),
        })
    }
}
