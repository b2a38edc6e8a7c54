use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use translator_bot::config::Config;
use translator_bot::detection::WhatlangDetector;
use translator_bot::handlers::CommandHandlers;
use translator_bot::openai::OpenAiClient;
use translator_bot::router::{self, Router};
use translator_bot::selector::LanguageSelector;
use translator_bot::session::SessionStore;
use translator_bot::telegram::TelegramClient;
use translator_bot::translation::Translator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables are already set)
    let _ = dotenvy::dotenv();

    // Missing secrets stop the process before anything else starts
    let config = Config::from_env()?;

    let _log_guards = translator_bot::logging::init(&config.log_dir)?;

    let http = reqwest::Client::new();
    let telegram = TelegramClient::new(http.clone(), &config);
    let openai = OpenAiClient::new(http, &config);
    info!("Using model {}", openai.model());

    let sessions = SessionStore::new();
    let selector = LanguageSelector::new(sessions.clone());
    let transport = Arc::new(telegram.clone());

    let handlers = CommandHandlers::new(sessions.clone(), selector, transport.clone());
    let translator = Translator::new(
        sessions,
        Arc::new(openai),
        Arc::new(WhatlangDetector::new()),
        transport,
    );

    router::run_polling(telegram, Router::new(handlers, translator)).await
}
