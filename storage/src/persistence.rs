//! Persistence trait: where user, chat, bot, callback and conversation data live between updates.

use dbot_core::{BotData, DataMap, IdDataMap};
use serde_json::Value;

use crate::codec::{CallbackData, ConversationKey, ConversationStates};
use crate::error::StorageError;

/// Which categories a persistence stores. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceInput {
    pub user_data: bool,
    pub chat_data: bool,
    pub bot_data: bool,
    pub callback_data: bool,
}

impl Default for PersistenceInput {
    fn default() -> Self {
        Self {
            user_data: true,
            chat_data: true,
            bot_data: true,
            callback_data: true,
        }
    }
}

/// Storage for the data callbacks see in their context.
///
/// Accessors may materialize empty collections. Mutators compare against what is stored and do
/// nothing on deep equality. Implementations are not synchronized; callers serialize access.
pub trait Persistence: Send {
    fn store_data(&self) -> PersistenceInput;

    fn get_user_data(&mut self) -> &IdDataMap;
    fn get_chat_data(&mut self) -> &IdDataMap;
    fn get_bot_data(&mut self) -> &BotData;
    /// Copy of the callback data, if any was ever stored.
    fn get_callback_data(&self) -> Option<CallbackData>;
    /// Copy of the states of one conversation handler; empty when the handler is unknown.
    fn get_conversations(&mut self, name: &str) -> ConversationStates;

    fn update_user_data(&mut self, user_id: i64, data: DataMap);
    fn update_chat_data(&mut self, chat_id: i64, data: DataMap);
    fn update_bot_data(&mut self, data: BotData);
    fn update_callback_data(&mut self, data: CallbackData);
    fn update_conversation(&mut self, name: &str, key: ConversationKey, state: Option<Value>);

    /// Hook to refresh a user's data from an external source before it is handed to callbacks.
    fn refresh_user_data(&mut self, _user_id: i64, _data: &mut DataMap) {}
    fn refresh_chat_data(&mut self, _chat_id: i64, _data: &mut DataMap) {}
    fn refresh_bot_data(&mut self, _data: &mut BotData) {}

    /// Writes pending data to the backing store.
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}
