//! Bot abstraction used by callbacks to talk back to the platform.
//!
//! [`Bot`] is transport-agnostic; dbot-telegram implements it over teloxide. The identity it returns
//! from [`Bot::get_me`] is what command matching uses to resolve `@botname` suffixes.

use crate::error::Result;
use crate::types::{BotIdentity, Message};
use async_trait::async_trait;

/// Sending side of the bot plus identity lookup.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns the identity (id and username) of the bot behind the token.
    async fn get_me(&self) -> Result<BotIdentity>;
    /// Sends a text message to the given chat and returns the new message id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i32>;
    /// Sends a message to the chat the given message came from.
    async fn reply_to(&self, message: &Message, text: &str) -> Result<i32> {
        self.send_message(message.chat.id, text).await
    }
}
