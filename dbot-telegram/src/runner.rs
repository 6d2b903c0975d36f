//! Dispatcher runner: converts teloxide updates to core updates and passes them to HandlerChain.
//! Calls get_me once so every converted message carries the bot identity for `@botname` checks.

use std::sync::Arc;

use anyhow::Result;
use dbot_core::Update as CoreUpdate;
use handler_chain::HandlerChain;
use teloxide::dispatching::Dispatcher;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{error, info, instrument};

use crate::adapters::TelegramUpdateWrapper;
use crate::bot_adapter::{identity_of, TelegramBotAdapter};

/// Runs long polling until Ctrl-C.
///
/// Each update is handled to completion before its endpoint returns, so the persistence
/// read/write-back around one update is never interleaved with another update of the same chat.
/// Other chats run concurrently; the persistence middleware writes back only what each update changed.
#[instrument(skip(bot, handler_chain))]
pub async fn run_dispatcher(bot: teloxide::Bot, handler_chain: HandlerChain) -> Result<()> {
    let me = bot.get_me().await?;
    let identity = identity_of(&me.user);
    info!(username = %identity.username, "Bot identity resolved before dispatch");

    let chain = Arc::new(handler_chain.with_bot(Arc::new(TelegramBotAdapter::new(bot.clone()))));
    let handler = dptree::endpoint(move |update: Update| {
        let chain = chain.clone();
        let identity = identity.clone();

        async move {
            let core_update: CoreUpdate = TelegramUpdateWrapper(&update, Some(&identity)).to_core();
            info!(
                update_id = core_update.id,
                user_id = ?core_update.effective_user().map(|u| u.id),
                chat_id = ?core_update.effective_chat().map(|c| c.id),
                "step: processing update (handler chain started)"
            );
            if let Err(e) = chain.handle(&core_update).await {
                error!(error = %e, update_id = core_update.id, "Handler chain failed");
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}
