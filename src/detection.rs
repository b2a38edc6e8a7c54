//! Local language detection.
//!
//! Detection runs in-process with `whatlang`, so it needs no network access
//! and has no rate limits.

use async_trait::async_trait;
use thiserror::Error;
use whatlang::Lang;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("could not determine the language of the text")]
    Undetermined,
}

/// Best-guess language identification.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Return the ISO 639-1 code of the most likely language of `text`.
    async fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

/// Detector backed by the `whatlang` trigram model.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LanguageDetector for WhatlangDetector {
    async fn detect(&self, text: &str) -> Result<String, DetectionError> {
        let info = whatlang::detect(text).ok_or(DetectionError::Undetermined)?;
        Ok(iso_639_1(info.lang())
            .map(str::to_string)
            // No two-letter code known; the three-letter code never equals a catalog code
            .unwrap_or_else(|| info.lang().code().to_string()))
    }
}

/// Map a `whatlang` language onto its two-letter code.
fn iso_639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Uzb => "uz",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ukr => "uk",
        Lang::Bel => "be",
        Lang::Bul => "bg",
        Lang::Mkd => "mk",
        Lang::Srp => "sr",
        Lang::Hrv => "hr",
        Lang::Slv => "sl",
        Lang::Pol => "pl",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Cat => "ca",
        Lang::Ron => "ro",
        Lang::Nld => "nl",
        Lang::Dan => "da",
        Lang::Swe => "sv",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Est => "et",
        Lang::Lav => "lv",
        Lang::Lit => "lt",
        Lang::Hun => "hu",
        Lang::Ell => "el",
        Lang::Tur => "tr",
        Lang::Aze => "az",
        Lang::Tuk => "tk",
        Lang::Kat => "ka",
        Lang::Hye => "hy",
        Lang::Ara => "ar",
        Lang::Heb => "he",
        Lang::Pes => "fa",
        Lang::Hin => "hi",
        Lang::Urd => "ur",
        Lang::Ben => "bn",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Vie => "vi",
        Lang::Tha => "th",
        Lang::Ind => "id",
        Lang::Afr => "af",
        Lang::Lat => "la",
        Lang::Epo => "eo",
        _ => return None,
    };
    Some(code)
}
