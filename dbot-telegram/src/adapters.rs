//! Adapters from Telegram (teloxide) types to dbot_core types.
//! Depends only on teloxide and dbot_core type definitions.

use dbot_core::{BotIdentity, Chat, EntityKind, Message, MessageEntity, Update, UpdateKind, User};
use teloxide::types::MessageEntityKind;

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> TelegramUserWrapper<'a> {
    pub fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            is_bot: self.0.is_bot,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Chat for conversion to core [`Chat`].
pub struct TelegramChatWrapper<'a>(pub &'a teloxide::types::Chat);

impl<'a> TelegramChatWrapper<'a> {
    pub fn to_core(&self) -> Chat {
        let chat = self.0;
        let chat_type = if chat.is_private() {
            "private"
        } else if chat.is_group() {
            "group"
        } else if chat.is_supergroup() {
            "supergroup"
        } else {
            "channel"
        };
        Chat {
            id: chat.id.0,
            chat_type: chat_type.to_string(),
        }
    }
}

/// Maps Telegram entity kinds onto the ones command matching cares about.
pub fn entity_kind(kind: &MessageEntityKind) -> EntityKind {
    match kind {
        MessageEntityKind::BotCommand => EntityKind::BotCommand,
        MessageEntityKind::Mention => EntityKind::Mention,
        MessageEntityKind::Hashtag => EntityKind::Hashtag,
        MessageEntityKind::Url => EntityKind::Url,
        MessageEntityKind::TextLink { .. } => EntityKind::TextLink,
        _ => EntityKind::Other,
    }
}

/// Wraps a teloxide Message, plus the identity of the bot that received it.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message, pub Option<&'a BotIdentity>);

impl<'a> TelegramMessageWrapper<'a> {
    pub fn to_core(&self) -> Message {
        let msg = self.0;
        let entities = msg
            .entities()
            .unwrap_or_default()
            .iter()
            .map(|e| MessageEntity::new(entity_kind(&e.kind), e.offset, e.length))
            .collect();

        Message {
            id: msg.id.0,
            from: msg.from.as_ref().map(|u| TelegramUserWrapper(u).to_core()),
            chat: TelegramChatWrapper(&msg.chat).to_core(),
            text: msg.text().map(str::to_string),
            entities,
            bot: self.1.cloned(),
            created_at: msg.date,
        }
    }
}

/// Wraps a teloxide Update; message-like kinds keep their message, everything else is `Other`.
pub struct TelegramUpdateWrapper<'a>(pub &'a teloxide::types::Update, pub Option<&'a BotIdentity>);

impl<'a> TelegramUpdateWrapper<'a> {
    pub fn to_core(&self) -> Update {
        use teloxide::types::UpdateKind as Kind;

        let bot = self.1;
        let convert = |m: &teloxide::types::Message| TelegramMessageWrapper(m, bot).to_core();
        let kind = match &self.0.kind {
            Kind::Message(m) => UpdateKind::Message(convert(m)),
            Kind::EditedMessage(m) => UpdateKind::EditedMessage(convert(m)),
            Kind::ChannelPost(m) => UpdateKind::ChannelPost(convert(m)),
            Kind::EditedChannelPost(m) => UpdateKind::EditedChannelPost(convert(m)),
            _ => UpdateKind::Other,
        };
        Update::new(i64::from(self.0.id.0), kind)
    }
}
