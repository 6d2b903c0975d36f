//! Wraps teloxide::Bot and implements [`dbot_core::Bot`]. Production code sends messages via Telegram; tests can substitute another Bot impl.

use async_trait::async_trait;
use dbot_core::{Bot as CoreBot, BotIdentity, DbotError, Result};
use teloxide::{prelude::*, types::ChatId};

/// Thin wrapper around teloxide::Bot that implements dbot-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn get_me(&self) -> Result<BotIdentity> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(identity_of(&me.user))
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32> {
        let sent = self
            .bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(sent.id.0)
    }
}

/// Identity used for `@botname` resolution. Bot accounts always have a username.
pub(crate) fn identity_of(user: &teloxide::types::User) -> BotIdentity {
    BotIdentity::new(user.id.0 as i64, user.username.as_deref().unwrap_or_default())
}
