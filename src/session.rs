//! Per-conversation session state.
//!
//! Sessions live in memory only and are lost on restart. A conversation with
//! no stored entry reads as the default session.

use crate::i18n::Language;
use crate::transport::ChatId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Clause appended to the prompt for languages written in more than one script
const LATIN_SCRIPT_CLAUSE: &str = " Use only the official Latin script.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Build the system instruction sent to the completion provider.
///
/// The output depends only on `language`, so switching languages back and
/// forth always yields the same prompt.
pub fn build_instruction_prompt(language: Language) -> String {
    let mut prompt = format!(
        "You are a professional translator fluent in multiple languages. \
Your task is to accurately translate user input into {}.",
        language.name()
    );
    if language.requires_latin_script() {
        prompt.push_str(LATIN_SCRIPT_CLAUSE);
    }
    prompt
}

/// State of one conversation.
///
/// The fields are private so the prompt can only change together with the
/// language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    selected_language: Language,
    instruction_prompt: String,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            selected_language: language,
            instruction_prompt: build_instruction_prompt(language),
        }
    }

    pub fn selected_language(&self) -> Language {
        self.selected_language
    }

    pub fn instruction_prompt(&self) -> &str {
        &self.instruction_prompt
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

/// Shared map of conversation id to session.
///
/// Cloning is cheap and every clone sees the same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChatId, Session>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session for `chat`, or the default session if none exists.
    pub fn get(&self, chat: ChatId) -> Session {
        self.lock().get(&chat).cloned().unwrap_or_default()
    }

    /// Select a language by its catalog name.
    pub fn set_language(&self, chat: ChatId, language: &str) -> Result<Session, SessionError> {
        let language = Language::from_name(language)
            .map_err(|_| SessionError::UnsupportedLanguage(language.to_string()))?;
        Ok(self.select(chat, language))
    }

    /// Select an already validated language.
    pub fn select(&self, chat: ChatId, language: Language) -> Session {
        let session = Session::new(language);
        self.lock().insert(chat, session.clone());
        session
    }

    /// Drop whatever the conversation had and start over with the default.
    pub fn reset(&self, chat: ChatId) -> Session {
        let session = Session::default();
        self.lock().insert(chat, session.clone());
        session
    }

    /// Number of conversations with explicit state.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
