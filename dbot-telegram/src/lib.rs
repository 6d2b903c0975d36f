//! # dbot-telegram
//!
//! Telegram bot framework layer: adapters, [`dbot_core::Bot`] implementation, minimal config, dispatcher runner.
//! Handles only Telegram connectivity and handler-chain execution; persistence is plugged in as middleware.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{
    entity_kind, TelegramChatWrapper, TelegramMessageWrapper, TelegramUpdateWrapper,
    TelegramUserWrapper,
};
pub use bot_adapter::TelegramBotAdapter;
pub use config::{TelegramConfig, DEFAULT_PERSISTENCE_DIR};
pub use runner::run_dispatcher;
