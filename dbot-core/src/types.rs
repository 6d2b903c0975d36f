//! Core types: user, chat, message (with entities), update, bot identity, and the Handler /
//! Callback / Middleware traits that the dispatcher drives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::CallbackContext;
use crate::data::DataPayload;

/// User identity (id, username, names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// A non-bot user with only an id and first name.
    pub fn new(id: i64, first_name: &str) -> Self {
        Self {
            id,
            is_bot: false,
            username: None,
            first_name: Some(first_name.to_string()),
            last_name: None,
        }
    }
}

/// Chat (private, group, supergroup or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_type: "private".to_string(),
        }
    }

    pub fn group(id: i64) -> Self {
        Self {
            id,
            chat_type: "group".to_string(),
        }
    }

    pub fn channel(id: i64) -> Self {
        Self {
            id,
            chat_type: "channel".to_string(),
        }
    }
}

/// The bot a message was received by. `username` resolves `/cmd@username` suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    pub username: String,
}

impl BotIdentity {
    pub fn new(id: i64, username: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
        }
    }
}

/// Kind of a message entity. Only the kinds routing cares about are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BotCommand,
    Mention,
    Hashtag,
    Url,
    TextLink,
    Other,
}

/// Platform-supplied annotation over a span of message text.
///
/// `offset` and `length` count characters of the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }

    pub fn bot_command(offset: usize, length: usize) -> Self {
        Self::new(EntityKind::BotCommand, offset, length)
    }
}

/// A single message with sender, chat, text, entities and the receiving bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub entities: Vec<MessageEntity>,
    pub bot: Option<BotIdentity>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A text message without entities, sender or bot binding.
    pub fn new(id: i32, chat: Chat, text: &str) -> Self {
        Self {
            id,
            from: None,
            chat,
            text: Some(text.to_string()),
            entities: Vec::new(),
            bot: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_from(mut self, user: User) -> Self {
        self.from = Some(user);
        self
    }

    pub fn with_entities(mut self, entities: Vec<MessageEntity>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_bot(mut self, bot: BotIdentity) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Text, or `None` when absent or empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// What an update carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    /// Any update kind the dispatcher does not route (polls, payments, ...).
    Other,
}

/// One incoming update from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

impl Update {
    pub fn new(id: i64, kind: UpdateKind) -> Self {
        Self { id, kind }
    }

    pub fn message(id: i64, message: Message) -> Self {
        Self::new(id, UpdateKind::Message(message))
    }

    /// The message of any message-like update kind.
    pub fn effective_message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            UpdateKind::Other => None,
        }
    }

    pub fn effective_user(&self) -> Option<&User> {
        self.effective_message().and_then(|m| m.from.as_ref())
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        self.effective_message().map(|m| &m.chat)
    }
}

/// Outcome of [`Handler::check_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// The update does not have the shape this handler listens for.
    NoMatch,
    /// The shape matched but the handler's filter rejected the update.
    Filtered,
    /// Matched: positional arguments plus any data the filter produced.
    Matched {
        args: Vec<String>,
        data: Option<DataPayload>,
    },
}

impl CheckResult {
    pub fn is_match(&self) -> bool {
        matches!(self, CheckResult::Matched { .. })
    }
}

/// Handler result for the chain. `Reply(text)` carries the response body so middleware can see it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Handled; let the next handler group run.
    Continue,
    /// Stop dispatching this update.
    Stop,
    /// Not handled after all; try the next handler in the same group.
    Ignore,
    /// Stop dispatching and attach reply text.
    Reply(String),
}

/// User code invoked once a handler matched an update.
#[async_trait]
pub trait Callback: Send + Sync {
    async fn call(
        &self,
        update: &Update,
        context: &mut CallbackContext,
    ) -> crate::error::Result<HandlerResponse>;
}

/// Routable handler: decides whether an update is for it, enriches the context, then handles it.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Decides whether this handler wants the update. Never fails.
    fn check_update(&self, update: &Update) -> CheckResult;

    /// Copies what `check_update` extracted into the context. Default: nothing.
    fn collect_additional_context(
        &self,
        _context: &mut CallbackContext,
        _update: &Update,
        _check: &CheckResult,
    ) {
    }

    /// Processes a matched update.
    async fn handle(
        &self,
        update: &Update,
        context: &mut CallbackContext,
    ) -> crate::error::Result<HandlerResponse>;
}

/// Runs around the handlers: `before` in registration order, `after` in reverse.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Return false to stop the chain before any handler runs.
    async fn before(
        &self,
        _update: &Update,
        _context: &mut CallbackContext,
    ) -> crate::error::Result<bool> {
        Ok(true)
    }

    async fn after(
        &self,
        _update: &Update,
        _context: &CallbackContext,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}
