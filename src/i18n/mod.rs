//! Language catalog and user-facing text.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for the supported target languages
//! - `language`: Type-safe `Language` validated against the registry
//! - `strings`: Every fixed message the bot sends
//!
//! # Example
//!
//! ```rust,ignore
//! use translator_bot::i18n::Language;
//!
//! let russian = Language::from_name("Russian")?;
//! assert_eq!(russian.code(), "ru");
//! ```

mod language;
mod registry;
pub mod strings;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
