//! Telegram bot that translates incoming messages into a per-user target
//! language with an OpenAI chat model.

pub mod config;
pub mod detection;
pub mod handlers;
pub mod i18n;
pub mod logging;
pub mod openai;
pub mod router;
pub mod selector;
pub mod session;
pub mod telegram;
pub mod translation;
pub mod transport;
