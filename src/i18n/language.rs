//! Language type: a catalog entry validated against the registry.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use std::fmt;

/// A validated language.
///
/// Only languages present in the registry can be constructed, so the
/// accessors below never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "uz")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const RUSSIAN: Language = Language { code: "ru" };
    pub const UZBEK: Language = Language { code: "uz" };

    /// Create a Language from a two-letter code.
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Create a Language from its English display name (e.g., "German").
    pub fn from_name(name: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_name(name) {
            Some(config) => Ok(Language { code: config.code }),
            None => bail!("Unsupported language: '{}'", name),
        }
    }

    /// Every supported language, in catalog order.
    pub fn all() -> impl Iterator<Item = Language> {
        LanguageRegistry::get()
            .list_all()
            .iter()
            .map(|config| Language { code: config.code })
    }

    /// The two-letter code the detector reports for this language.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a Language built through `from_code`, `from_name` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Uzbek is written in both Cyrillic and Latin; replies must use Latin.
    pub fn requires_latin_script(&self) -> bool {
        *self == Language::UZBEK
    }
}

impl Default for Language {
    fn default() -> Self {
        Language {
            code: LanguageRegistry::get().default_language().code,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
