use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub telegram_poll_timeout_secs: u64,

    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,

    // Logging
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Telegram
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            telegram_poll_timeout_secs: std::env::var("TELEGRAM_POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            // OpenAI
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),

            // Logging
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

/// Read a secret that must be present and non-empty
fn required(name: &str) -> Result<String> {
    let value = std::env::var(name).context(format!("{} not set", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} is empty", name);
    }
    Ok(value)
}
