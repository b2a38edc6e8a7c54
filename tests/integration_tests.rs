//! Integration tests for the translator bot
//!
//! These tests drive the router and dispatcher end to end with in-memory
//! stand-ins for Telegram, OpenAI and the language detector.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use translator_bot::detection::{DetectionError, LanguageDetector};
use translator_bot::handlers::CommandHandlers;
use translator_bot::i18n::{strings, Language};
use translator_bot::openai::{CompletionError, CompletionProvider, Message};
use translator_bot::router::{Dispatcher, Event, Router};
use translator_bot::selector::LanguageSelector;
use translator_bot::session::SessionStore;
use translator_bot::translation::Translator;
use translator_bot::transport::{
    ChatId, ChatTransport, MessageId, OptionButton, TextFormat, UserId,
};

// ==================== Test Doubles ====================

#[derive(Debug, Clone, PartialEq)]
enum Outbound {
    Text {
        chat: ChatId,
        text: String,
        format: TextFormat,
    },
    Menu {
        chat: ChatId,
        text: String,
        labels: Vec<String>,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
        format: TextFormat,
    },
    Options {
        chat: ChatId,
        text: String,
        rows: Vec<Vec<OptionButton>>,
    },
    Ack(String),
}

#[derive(Default)]
struct FakeTransport {
    outbound: Mutex<Vec<Outbound>>,
}

impl FakeTransport {
    fn outbound(&self) -> Vec<Outbound> {
        self.outbound.lock().unwrap().clone()
    }

    fn push(&self, item: Outbound) -> MessageId {
        let mut outbound = self.outbound.lock().unwrap();
        outbound.push(item);
        MessageId(outbound.len() as i64)
    }

    fn edits_for(&self, chat: ChatId) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|item| match item {
                Outbound::Edit { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
    ) -> anyhow::Result<MessageId> {
        Ok(self.push(Outbound::Text {
            chat,
            text: text.to_string(),
            format,
        }))
    }

    async fn send_with_menu(
        &self,
        chat: ChatId,
        text: &str,
        _format: TextFormat,
        labels: &[&str],
    ) -> anyhow::Result<MessageId> {
        Ok(self.push(Outbound::Menu {
            chat,
            text: text.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }))
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        format: TextFormat,
    ) -> anyhow::Result<()> {
        self.push(Outbound::Edit {
            chat,
            message,
            text: text.to_string(),
            format,
        });
        Ok(())
    }

    async fn send_options(
        &self,
        chat: ChatId,
        text: &str,
        rows: &[Vec<OptionButton>],
    ) -> anyhow::Result<MessageId> {
        Ok(self.push(Outbound::Options {
            chat,
            text: text.to_string(),
            rows: rows.to_vec(),
        }))
    }

    async fn acknowledge_selection(&self, selection_id: &str) -> anyhow::Result<()> {
        self.push(Outbound::Ack(selection_id.to_string()));
        Ok(())
    }
}

/// Echoes the user text prefixed with the target language name; text
/// "block" waits until released.
#[derive(Default)]
struct EchoProvider {
    calls: Mutex<Vec<Vec<Message>>>,
    release: Notify,
}

impl EchoProvider {
    fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let text = messages[1].content.clone();
        if text == "block" {
            self.release.notified().await;
        }
        if text == "overload" {
            return Err(CompletionError::RateLimited("429".to_string()));
        }
        let target = messages[0]
            .content
            .rsplit("into ")
            .next()
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(format!("[{}] {}", target, text))
    }
}

/// Says every text is English
struct EnglishDetector;

#[async_trait]
impl LanguageDetector for EnglishDetector {
    async fn detect(&self, _text: &str) -> Result<String, DetectionError> {
        Ok("en".to_string())
    }
}

struct Bot {
    sessions: SessionStore,
    transport: Arc<FakeTransport>,
    provider: Arc<EchoProvider>,
    router: Router,
}

fn bot() -> Bot {
    let sessions = SessionStore::new();
    let transport = Arc::new(FakeTransport::default());
    let provider = Arc::new(EchoProvider::default());

    let handlers = CommandHandlers::new(
        sessions.clone(),
        LanguageSelector::new(sessions.clone()),
        transport.clone(),
    );
    let translator = Translator::new(
        sessions.clone(),
        provider.clone(),
        Arc::new(EnglishDetector),
        transport.clone(),
    );

    Bot {
        sessions,
        transport,
        provider,
        router: Router::new(handlers, translator),
    }
}

const CHAT: ChatId = ChatId(500);
const USER: UserId = UserId(500);

fn command(name: &str) -> Event {
    Event::Command {
        chat: CHAT,
        user: USER,
        name: name.to_string(),
    }
}

fn text(chat: ChatId, text: &str) -> Event {
    Event::Text {
        chat,
        user: UserId(chat.0),
        text: text.to_string(),
    }
}

fn selection(token: &str) -> Event {
    Event::Selection {
        chat: CHAT,
        user: USER,
        selection_id: "cb-1".to_string(),
        menu: Some(MessageId(3)),
        token: token.to_string(),
    }
}

// ==================== Command Tests ====================

#[tokio::test]
async fn test_start_resets_session_and_shows_menu() {
    let bot = bot();
    bot.sessions.select(CHAT, Language::RUSSIAN);

    bot.router.route(command("start")).await.unwrap();

    assert_eq!(bot.sessions.get(CHAT).selected_language(), Language::ENGLISH);
    assert_eq!(
        bot.transport.outbound(),
        vec![Outbound::Menu {
            chat: CHAT,
            text: strings::welcome(Language::ENGLISH),
            labels: vec![strings::CHANGE_LANGUAGE_BUTTON.to_string()],
        }]
    );
}

#[tokio::test]
async fn test_help_leaves_session_alone() {
    let bot = bot();

    bot.router.route(command("help")).await.unwrap();

    assert!(bot.sessions.is_empty());
    assert_eq!(
        bot.transport.outbound(),
        vec![Outbound::Text {
            chat: CHAT,
            text: strings::HELP.to_string(),
            format: TextFormat::Html,
        }]
    );
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let bot = bot();

    bot.router.route(command("settings")).await.unwrap();

    assert!(bot.transport.outbound().is_empty());
    assert!(bot.provider.calls().is_empty());
}

// ==================== Language Menu Tests ====================

#[tokio::test]
async fn test_change_language_button_shows_catalog_in_pairs() {
    let bot = bot();

    bot.router
        .route(Event::ButtonLabel {
            chat: CHAT,
            user: USER,
            label: strings::CHANGE_LANGUAGE_BUTTON.to_string(),
        })
        .await
        .unwrap();

    let outbound = bot.transport.outbound();
    let Outbound::Options { text, rows, .. } = &outbound[0] else {
        panic!("expected options, got {:?}", outbound);
    };
    assert_eq!(text, strings::CHOOSE_LANGUAGE);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 2));
    assert_eq!(rows[1][0].label, "Uzbek");
}

#[tokio::test]
async fn test_selection_updates_session_and_edits_menu() {
    let bot = bot();

    bot.router.route(selection("language_German")).await.unwrap();

    assert_eq!(
        bot.sessions.get(CHAT).selected_language().name(),
        "German"
    );
    assert_eq!(
        bot.transport.outbound(),
        vec![
            Outbound::Ack("cb-1".to_string()),
            Outbound::Edit {
                chat: CHAT,
                message: MessageId(3),
                text: "✅ Translation language set to <b>German</b>.".to_string(),
                format: TextFormat::Html,
            },
        ]
    );
}

#[tokio::test]
async fn test_bad_selection_is_acknowledged_without_change() {
    let bot = bot();

    bot.router.route(selection("language_Klingon")).await.unwrap();

    assert!(bot.sessions.is_empty());
    assert_eq!(
        bot.transport.outbound(),
        vec![Outbound::Ack("cb-1".to_string())]
    );
}

// ==================== Translation Flow Tests ====================

#[tokio::test]
async fn test_default_session_english_text_skips_provider() {
    let bot = bot();

    bot.router.route(text(CHAT, "Hello")).await.unwrap();

    assert!(bot.provider.calls().is_empty());
    assert_eq!(
        bot.transport.outbound(),
        vec![Outbound::Text {
            chat: CHAT,
            text: strings::ALREADY_TARGET_LANGUAGE.to_string(),
            format: TextFormat::Plain,
        }]
    );
}

#[tokio::test]
async fn test_select_then_translate() {
    let bot = bot();

    bot.router.route(selection("language_Russian")).await.unwrap();
    bot.router.route(text(CHAT, "Hello")).await.unwrap();

    let calls = bot.provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0][0].content.ends_with("into Russian."));
    assert_eq!(calls[0][1], Message::user("Hello"));

    assert_eq!(
        bot.transport.edits_for(CHAT).last().map(String::as_str),
        Some("[Russian] Hello")
    );
}

#[tokio::test]
async fn test_start_after_selection_restores_default_target() {
    let bot = bot();

    bot.router.route(selection("language_Uzbek")).await.unwrap();
    bot.router.route(command("start")).await.unwrap();
    bot.router.route(text(CHAT, "Hello")).await.unwrap();

    assert!(bot.provider.calls().is_empty());
}

#[tokio::test]
async fn test_rate_limit_reaches_user_as_notice() {
    let bot = bot();
    bot.sessions.select(CHAT, Language::RUSSIAN);

    bot.router.route(text(CHAT, "overload")).await.unwrap();

    assert_eq!(bot.transport.edits_for(CHAT), vec![strings::RATE_LIMITED]);
}

// ==================== Dispatcher Tests ====================

#[tokio::test]
async fn test_dispatcher_keeps_per_chat_order() {
    let bot = bot();
    bot.sessions.select(CHAT, Language::RUSSIAN);

    let mut dispatcher = Dispatcher::new(bot.router.clone());
    for word in ["one", "two", "three", "four"] {
        dispatcher.dispatch(text(CHAT, word));
    }
    assert_eq!(dispatcher.conversations(), 1);
    dispatcher.shutdown().await;

    assert_eq!(
        bot.transport.edits_for(CHAT),
        vec![
            "[Russian] one",
            "[Russian] two",
            "[Russian] three",
            "[Russian] four"
        ]
    );
}

#[tokio::test]
async fn test_slow_chat_does_not_block_other_chats() {
    let bot = bot();
    let slow = ChatId(1);
    let fast = ChatId(2);
    bot.sessions.select(slow, Language::RUSSIAN);
    bot.sessions.select(fast, Language::UZBEK);

    let mut dispatcher = Dispatcher::new(bot.router.clone());
    dispatcher.dispatch(text(slow, "block"));
    dispatcher.dispatch(text(fast, "Hello"));

    // The fast chat finishes while the slow one is still waiting on the provider
    tokio::time::timeout(Duration::from_secs(5), async {
        while bot.transport.edits_for(fast).is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("fast chat should not wait for the slow one");
    assert!(bot.transport.edits_for(slow).is_empty());

    bot.provider.release.notify_one();
    dispatcher.shutdown().await;

    assert_eq!(bot.transport.edits_for(slow), vec!["[Russian] block"]);
    assert_eq!(bot.transport.edits_for(fast), vec!["[Uzbek] Hello"]);
}

#[tokio::test]
async fn test_idle_workers_exit_and_are_forgotten() {
    let bot = bot();
    let mut dispatcher =
        Dispatcher::with_idle_timeout(bot.router.clone(), Duration::from_millis(200));

    for id in 1..=200 {
        let chat = ChatId(id);
        bot.sessions.select(chat, Language::RUSSIAN);
        dispatcher.dispatch(text(chat, "Hello"));
    }
    assert_eq!(dispatcher.conversations(), 200);

    tokio::time::timeout(Duration::from_secs(5), async {
        while dispatcher.conversations() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("idle workers should stop");

    for id in 1..=200 {
        assert_eq!(bot.transport.edits_for(ChatId(id)), vec!["[Russian] Hello"]);
    }
}

#[tokio::test]
async fn test_chat_gets_new_worker_after_idling() {
    let bot = bot();
    bot.sessions.select(CHAT, Language::RUSSIAN);
    let mut dispatcher =
        Dispatcher::with_idle_timeout(bot.router.clone(), Duration::from_millis(50));

    dispatcher.dispatch(text(CHAT, "first"));
    tokio::time::timeout(Duration::from_secs(5), async {
        while dispatcher.conversations() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("worker should stop");

    dispatcher.dispatch(text(CHAT, "second"));
    dispatcher.dispatch(text(CHAT, "third"));
    assert_eq!(dispatcher.conversations(), 1);
    dispatcher.shutdown().await;

    assert_eq!(
        bot.transport.edits_for(CHAT),
        vec!["[Russian] first", "[Russian] second", "[Russian] third"]
    );
}

#[tokio::test]
async fn test_selection_without_menu_sends_confirmation() {
    let bot = bot();

    bot.router
        .route(Event::Selection {
            chat: CHAT,
            user: USER,
            selection_id: "cb-2".to_string(),
            menu: None,
            token: "language_Spanish".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(bot.sessions.get(CHAT).selected_language().code(), "es");
    assert_eq!(
        bot.transport.outbound(),
        vec![
            Outbound::Ack("cb-2".to_string()),
            Outbound::Text {
                chat: CHAT,
                text: "✅ Translation language set to <b>Spanish</b>.".to_string(),
                format: TextFormat::Html,
            },
        ]
    );
}
