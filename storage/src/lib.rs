//! Storage crate: persistence of per-user, per-chat, bot-wide, callback and conversation data.
//!
//! ## Modules
//!
//! - [`error`] – StorageError and PayloadKind
//! - [`persistence`] – Persistence trait and PersistenceInput
//! - [`dict_persistence`] – DictPersistence (in memory, JSON in and out)
//! - [`cached`] – Cached value with its JSON encoding
//! - [`codec`] – JSON layout of each collection

mod cached;
mod codec;
mod dict_persistence;
mod error;
mod persistence;

#[cfg(test)]
mod dict_persistence_test;

pub use cached::Cached;
pub use codec::{
    CallbackData, CallbackEntry, ConversationKey, ConversationStates, Conversations,
};
pub use dict_persistence::{DictPersistence, JsonSnapshot};
pub use error::{PayloadKind, StorageError};
pub use persistence::{Persistence, PersistenceInput};
