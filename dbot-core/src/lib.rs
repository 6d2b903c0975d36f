//! # dbot-core
//!
//! Core types and traits for the Telegram bot: [`Update`] / [`Message`] with entities, the
//! [`Handler`], [`Callback`] and [`Middleware`] traits driven by handler-chain, [`CallbackContext`],
//! the per-user / per-chat data shapes persisted by storage, and tracing initialization.

pub mod bot;
pub mod context;
pub mod data;
pub mod error;
pub mod helpers;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use context::{CallbackContext, LoadedData};
pub use data::{BotData, DataKey, DataMap, DataPayload, IdDataMap};
pub use error::{DbotError, HandlerError, Result};
pub use helpers::create_deep_linked_url;
pub use logger::init_tracing;
pub use types::{
    BotIdentity, Callback, Chat, CheckResult, EntityKind, Handler, HandlerResponse, Message,
    MessageEntity, Middleware, Update, UpdateKind, User,
};
