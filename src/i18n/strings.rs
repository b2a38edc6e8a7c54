//! Fixed user-facing strings.
//!
//! Strings that go out with `parse_mode=HTML` may carry `<b>` tags; the
//! language names interpolated into them come from the catalog and contain
//! no markup characters.

use crate::i18n::Language;

// ==================== Keyboard Labels ====================

/// Label of the persistent reply-keyboard button that opens the language menu
pub const CHANGE_LANGUAGE_BUTTON: &str = "🌍 Change Language";

/// Prompt shown above the inline language keyboard
pub const CHOOSE_LANGUAGE: &str = "🌍 Choose a language for translation:";

// ==================== Translation Flow ====================

/// Placeholder sent before the completion call, later edited into the result
pub const LOADING_MESSAGE: &str = "⏳ Translating your text, please wait...";

pub const EMPTY_INPUT: &str = "⚠️ Please enter some text to translate.";

pub const ALREADY_TARGET_LANGUAGE: &str =
    "⚠️ You are trying to translate a text that is already in the target language.";

// ==================== Provider Failures ====================

pub const INVALID_REQUEST: &str = "❌ Invalid request. Please try again.";

pub const RATE_LIMITED: &str = "⚠️ Too many requests. Please wait a few moments.";

pub const CONNECTION_ERROR: &str = "🔌 Connection error. Please check your internet connection.";

pub const UNEXPECTED_ERROR: &str = "❌ An error occurred. Please try again later.";

// ==================== Commands ====================

pub const HELP: &str = "🆘 <b>How to use me:</b>\n\n\
📌 Send any text, and I'll translate it to your preferred language.\n\
🌍 Use the <b>Change Language</b> button to switch languages.\n\
❓ If you have issues, try restarting the bot with /start.";

/// Welcome message naming the language a fresh session translates into
pub fn welcome(language: Language) -> String {
    format!(
        "👋 Hello! Send any text, and I'll translate it.\n\
🌍 Default language: <b>{}</b>.\n\
🔄 Use 'Change Language' to switch.",
        language.name()
    )
}

/// Confirmation shown in place of the language menu after a selection
pub fn language_set(language: Language) -> String {
    format!("✅ Translation language set to <b>{}</b>.", language.name())
}
