//! Language registry: the catalog of supported translation targets.
//!
//! The catalog is static and ordered. Its order drives the order of the
//! selection keyboard. It uses a singleton pattern with `OnceLock` so every
//! handler shares the same immutable instance.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 code the detector reports for this language (e.g., "en", "uz")
    pub code: &'static str,

    /// English name of the language, as shown to users and named in the prompt
    pub name: &'static str,

    /// Whether this is the language new sessions start with (exactly one is true)
    pub is_default: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its two-letter code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get a language configuration by its English display name.
    ///
    /// Matching is exact: "Russian" is found, "russian" is not.
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.name == name)
    }

    /// All languages, in catalog order.
    pub fn list_all(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Get the default language configuration.
    ///
    /// # Panics
    /// Panics if the catalog does not define exactly one default language
    /// (this indicates a configuration error).
    pub fn default_language(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("No default language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default languages found in registry"),
        }
    }
}

/// Default language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            is_default: true,
        },
        LanguageConfig {
            code: "ru",
            name: "Russian",
            is_default: false,
        },
        LanguageConfig {
            code: "uz",
            name: "Uzbek",
            is_default: false,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            is_default: false,
        },
        LanguageConfig {
            code: "fr",
            name: "French",
            is_default: false,
        },
        LanguageConfig {
            code: "de",
            name: "German",
            is_default: false,
        },
    ]
}
