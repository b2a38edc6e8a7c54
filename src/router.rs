//! Event classification, routing and per-conversation dispatch.
//!
//! The poller hands every update to [`Dispatcher::dispatch`]. Each
//! conversation owns a worker task fed by a channel, so one chat's events run
//! strictly in arrival order while other chats keep moving.

use crate::handlers::CommandHandlers;
use crate::i18n::strings;
use crate::selector::is_selection_token;
use crate::telegram::{TelegramClient, Update};
use crate::transport::{ChatId, MessageId, UserId};
use crate::translation::{TranslationRequest, Translator};
use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause after a failed poll before asking again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// How long a conversation worker waits for its next event before exiting
const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// A chat event, already stripped of platform detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command {
        chat: ChatId,
        user: UserId,
        name: String,
    },
    ButtonLabel {
        chat: ChatId,
        user: UserId,
        label: String,
    },
    Text {
        chat: ChatId,
        user: UserId,
        text: String,
    },
    Selection {
        chat: ChatId,
        user: UserId,
        selection_id: String,
        menu: Option<MessageId>,
        token: String,
    },
}

impl Event {
    pub fn chat(&self) -> ChatId {
        match self {
            Event::Command { chat, .. }
            | Event::ButtonLabel { chat, .. }
            | Event::Text { chat, .. }
            | Event::Selection { chat, .. } => *chat,
        }
    }

    /// Classify a Telegram update. Updates the bot does not handle map to `None`.
    pub fn from_update(update: Update) -> Option<Event> {
        if let Some(query) = update.callback_query {
            let token = query.data.filter(|data| is_selection_token(data))?;
            let (chat, menu) = match query.message {
                Some(message) => (
                    ChatId(message.chat.id),
                    Some(MessageId(message.message_id)),
                ),
                // Menu too old to be included; private chat id equals the user id
                None => (ChatId(query.from.id), None),
            };
            return Some(Event::Selection {
                chat,
                user: UserId(query.from.id),
                selection_id: query.id,
                menu,
                token,
            });
        }

        let message = update.message?;
        let text = message.text?;
        let chat = ChatId(message.chat.id);
        let user = UserId(message.from.map(|u| u.id).unwrap_or(message.chat.id));

        if let Some(command) = parse_command(&text) {
            return Some(Event::Command {
                chat,
                user,
                name: command.to_string(),
            });
        }

        if text == strings::CHANGE_LANGUAGE_BUTTON {
            return Some(Event::ButtonLabel {
                chat,
                user,
                label: text,
            });
        }

        Some(Event::Text { chat, user, text })
    }
}

/// Extract the command name from `/name`, `/name@bot` or `/name args`.
fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Maps each event kind to its handler.
#[derive(Clone)]
pub struct Router {
    handlers: CommandHandlers,
    translator: Translator,
}

impl Router {
    pub fn new(handlers: CommandHandlers, translator: Translator) -> Self {
        Self {
            handlers,
            translator,
        }
    }

    pub async fn route(&self, event: Event) -> Result<()> {
        match event {
            Event::Command { chat, user, name } => match name.as_str() {
                "start" => self.handlers.on_start(chat, user).await,
                "help" => self.handlers.on_help(chat, user).await,
                _ => {
                    debug!("Ignoring unknown command /{} from user {}", name, user);
                    Ok(())
                }
            },
            Event::ButtonLabel { chat, user, .. } => {
                self.handlers.on_change_language(chat, user).await
            }
            Event::Text { chat, user, text } => {
                self.translator
                    .translate(TranslationRequest { chat, user, text })
                    .await?;
                Ok(())
            }
            Event::Selection {
                chat,
                user,
                selection_id,
                menu,
                token,
            } => {
                self.handlers
                    .on_selection(chat, user, &selection_id, menu, &token)
                    .await
            }
        }
    }
}

/// Fans events out to one sequential worker per conversation.
///
/// A worker that sees no event for `idle_timeout` exits; the next event for
/// that chat starts a new one.
pub struct Dispatcher {
    router: Router,
    idle_timeout: Duration,
    workers: HashMap<ChatId, Worker>,
}

struct Worker {
    sender: mpsc::UnboundedSender<Event>,
    task: JoinHandle<()>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self::with_idle_timeout(router, WORKER_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(router: Router, idle_timeout: Duration) -> Self {
        Self {
            router,
            idle_timeout,
            workers: HashMap::new(),
        }
    }

    /// Queue `event` behind any earlier events of the same conversation.
    pub fn dispatch(&mut self, event: Event) {
        self.prune();
        let chat = event.chat();

        let (event, previous) = match self.workers.remove(&chat) {
            Some(worker) => match worker.sender.send(event) {
                Ok(()) => {
                    self.workers.insert(chat, worker);
                    return;
                }
                // Worker is shutting down after going idle; the new one waits for it
                Err(mpsc::error::SendError(event)) => (event, Some(worker.task)),
            },
            None => (event, None),
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        // A brand-new channel with a live receiver accepts the send
        let _ = sender.send(event);
        let task = spawn_worker(
            chat,
            self.router.clone(),
            receiver,
            self.idle_timeout,
            previous,
        );
        self.workers.insert(chat, Worker { sender, task });
    }

    /// Forget workers that have exited.
    fn prune(&mut self) {
        self.workers.retain(|_, worker| !worker.task.is_finished());
    }

    /// Number of conversations with a running worker
    pub fn conversations(&mut self) -> usize {
        self.prune();
        self.workers.len()
    }

    /// Stop accepting events and wait until every queued event is handled.
    pub async fn shutdown(self) {
        let tasks: Vec<_> = self
            .workers
            .into_values()
            .map(|worker| {
                drop(worker.sender);
                worker.task
            })
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                error!("Conversation worker panicked: {}", e);
            }
        }
    }
}

fn spawn_worker(
    chat: ChatId,
    router: Router,
    mut receiver: mpsc::UnboundedReceiver<Event>,
    idle_timeout: Duration,
    previous: Option<JoinHandle<()>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Events still draining from an idle predecessor come first
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                error!("Conversation worker for chat {} panicked: {}", chat, e);
            }
        }

        debug!("Started worker for chat {}", chat);
        loop {
            match tokio::time::timeout(idle_timeout, receiver.recv()).await {
                Ok(Some(event)) => handle(&router, chat, event).await,
                Ok(None) => break,
                Err(_) => {
                    // Refuse new sends, then finish whatever already got in
                    receiver.close();
                    while let Ok(event) = receiver.try_recv() {
                        handle(&router, chat, event).await;
                    }
                    debug!("Worker for chat {} idle, stopping", chat);
                    break;
                }
            }
        }
        debug!("Worker for chat {} finished", chat);
    })
}

async fn handle(router: &Router, chat: ChatId, event: Event) {
    if let Err(e) = router.route(event).await {
        error!("Failed to handle event for chat {}: {:#}", chat, e);
    }
}

/// Long-poll Telegram forever, dispatching every update.
pub async fn run_polling(client: TelegramClient, router: Router) -> Result<()> {
    let mut dispatcher = Dispatcher::new(router);
    let mut offset = 0;

    info!("Bot started polling");
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Polling failed: {:#}", e);
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            match Event::from_update(update) {
                Some(event) => dispatcher.dispatch(event),
                None => debug!("Skipping unsupported update"),
            }
        }
    }
}
