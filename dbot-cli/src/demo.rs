//! The bot `dbot run` starts: deep-linked `/start`, `/count` backed by user data, `!help` / `#help`.

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{
    create_deep_linked_url, Callback, CallbackContext, DataKey, HandlerResponse, Result, Update,
};
use handler_chain::{CommandHandler, HandlerChain, PrefixHandler, RegexFilter};
use middleware::{LoggingMiddleware, PersistenceMiddleware};
use serde_json::Value;
use storage::DictPersistence;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Payload the demo deep link carries.
pub const DEEP_LINK_PAYLOAD: &str = "so-cool";

/// Callback that computes a reply and sends it to the update's chat.
struct ReplyCallback<F> {
    reply: F,
}

impl<F> ReplyCallback<F>
where
    F: Fn(&Update, &mut CallbackContext) -> String + Send + Sync + 'static,
{
    fn new(reply: F) -> Arc<dyn Callback> {
        Arc::new(Self { reply })
    }
}

#[async_trait]
impl<F> Callback for ReplyCallback<F>
where
    F: Fn(&Update, &mut CallbackContext) -> String + Send + Sync,
{
    async fn call(&self, update: &Update, context: &mut CallbackContext) -> Result<HandlerResponse> {
        let text = (self.reply)(update, context);
        match (&context.bot, update.effective_message()) {
            (Some(bot), Some(message)) => {
                bot.reply_to(message, &text).await?;
            }
            _ => warn!("No bot or message to reply to, reply dropped"),
        }
        Ok(HandlerResponse::Reply(text))
    }
}

fn start_reply(update: &Update, _context: &mut CallbackContext) -> String {
    let username = update
        .effective_message()
        .and_then(|m| m.bot.as_ref())
        .map(|b| b.username.as_str())
        .unwrap_or_default();
    match create_deep_linked_url(username, Some(DEEP_LINK_PAYLOAD), false) {
        Ok(url) => format!("Hello! Try the deep link: {}", url),
        Err(e) => {
            debug!(error = %e, "Deep link unavailable");
            "Hello!".to_string()
        }
    }
}

fn deep_link_reply(_update: &Update, context: &mut CallbackContext) -> String {
    let payload = context.matches().first().copied().unwrap_or_default().to_string();
    format!("You came in through a deep link with payload {:?}.", payload)
}

/// Increments `count` in the sender's user data.
fn count_reply(_update: &Update, context: &mut CallbackContext) -> String {
    let Some(user_data) = context.user_data.as_mut() else {
        return "I can only count for users.".to_string();
    };
    let key = DataKey::from("count");
    let count = user_data.get(&key).and_then(Value::as_i64).unwrap_or(0) + 1;
    user_data.insert(key, Value::from(count));
    format!("You have counted {} time(s).", count)
}

fn help_reply(_update: &Update, context: &mut CallbackContext) -> String {
    match context.args.as_deref() {
        Some([topic, ..]) => format!("No detailed help for {:?} yet. Commands: /start, /count.", topic),
        _ => "Commands: /start, /count, !help, #help.".to_string(),
    }
}

/// Handler chain for the demo bot over the given persistence.
///
/// The deep-linked `/start` is registered before the plain one in the same group: when its
/// filter rejects, the plain `/start` gets the update.
pub fn build_chain(persistence: Arc<Mutex<DictPersistence>>) -> anyhow::Result<HandlerChain> {
    let deep_link = CommandHandler::new(["start"], ReplyCallback::new(deep_link_reply))?
        .with_filter(RegexFilter::new(DEEP_LINK_PAYLOAD)?);
    let start = CommandHandler::new(["start"], ReplyCallback::new(start_reply))?;
    let count = CommandHandler::new(["count"], ReplyCallback::new(count_reply))?;
    let help = PrefixHandler::new(["!", "#"], ["help"], ReplyCallback::new(help_reply))?;

    Ok(HandlerChain::new()
        .add_middleware(Arc::new(LoggingMiddleware))
        .add_middleware(Arc::new(PersistenceMiddleware::new(persistence)))
        .add_handler(Arc::new(deep_link))
        .add_handler(Arc::new(start))
        .add_handler(Arc::new(count))
        .add_handler(Arc::new(help)))
}
