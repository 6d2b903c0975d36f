//! In-memory persistence seeded from, and readable as, JSON strings.
//!
//! Nothing here touches the filesystem. Callers load the five JSON payloads, build a
//! [`DictPersistence`] from them, and read the `*_json` getters back when they want to save.

use dbot_core::{BotData, DataMap, IdDataMap};
use serde_json::Value;
use tracing::{debug, info};

use crate::cached::Cached;
use crate::codec::{
    self, CallbackData, ConversationKey, ConversationStates, Conversations,
};
use crate::error::{PayloadKind, StorageError};
use crate::persistence::{Persistence, PersistenceInput};

/// The five serialized collections a [`DictPersistence`] starts from. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonSnapshot {
    pub user_data: Option<String>,
    pub chat_data: Option<String>,
    pub bot_data: Option<String>,
    pub callback_data: Option<String>,
    pub conversations: Option<String>,
}

impl JsonSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_data(mut self, json: impl Into<String>) -> Self {
        self.user_data = Some(json.into());
        self
    }

    pub fn with_chat_data(mut self, json: impl Into<String>) -> Self {
        self.chat_data = Some(json.into());
        self
    }

    pub fn with_bot_data(mut self, json: impl Into<String>) -> Self {
        self.bot_data = Some(json.into());
        self
    }

    pub fn with_callback_data(mut self, json: impl Into<String>) -> Self {
        self.callback_data = Some(json.into());
        self
    }

    pub fn with_conversations(mut self, json: impl Into<String>) -> Self {
        self.conversations = Some(json.into());
        self
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|raw| !raw.is_empty())
}

/// Dict-backed [`Persistence`] with a per-collection JSON cache.
#[derive(Debug, Clone, Default)]
pub struct DictPersistence {
    store_data: PersistenceInput,
    user_data: Cached<IdDataMap>,
    chat_data: Cached<IdDataMap>,
    bot_data: Cached<BotData>,
    callback_data: Cached<CallbackData>,
    conversations: Cached<Conversations>,
}

impl DictPersistence {
    /// Empty persistence: every collection absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every present payload. Fails on the first malformed one; the raw input of each
    /// decoded payload becomes its cached JSON.
    pub fn from_snapshot(snapshot: &JsonSnapshot) -> Result<Self, StorageError> {
        let mut persistence = Self::new();

        if let Some(raw) = present(&snapshot.user_data) {
            let data = codec::decode_id_map(raw, PayloadKind::UserData)?;
            persistence.user_data = Cached::decoded(Some(data), raw);
        }
        if let Some(raw) = present(&snapshot.chat_data) {
            let data = codec::decode_id_map(raw, PayloadKind::ChatData)?;
            persistence.chat_data = Cached::decoded(Some(data), raw);
        }
        if let Some(raw) = present(&snapshot.bot_data) {
            persistence.bot_data = Cached::decoded(Some(codec::decode_bot_data(raw)?), raw);
        }
        if let Some(raw) = present(&snapshot.callback_data) {
            persistence.callback_data = Cached::decoded(codec::decode_callback_data(raw)?, raw);
        }
        if let Some(raw) = present(&snapshot.conversations) {
            persistence.conversations = Cached::decoded(Some(codec::decode_conversations(raw)?), raw);
        }

        info!(
            users = persistence.user_data.value().map_or(0, IdDataMap::len),
            chats = persistence.chat_data.value().map_or(0, IdDataMap::len),
            "step: DictPersistence loaded from snapshot"
        );
        Ok(persistence)
    }

    pub fn with_store_data(mut self, store_data: PersistenceInput) -> Self {
        self.store_data = store_data;
        self
    }

    /// User data as JSON: the cached string, or a fresh encoding that is not cached.
    pub fn user_data_json(&self) -> Result<String, StorageError> {
        self.user_data.encode_with(codec::encode_id_map)
    }

    pub fn chat_data_json(&self) -> Result<String, StorageError> {
        self.chat_data.encode_with(codec::encode_id_map)
    }

    pub fn bot_data_json(&self) -> Result<String, StorageError> {
        self.bot_data.encode_with(codec::encode_bot_data)
    }

    pub fn callback_data_json(&self) -> Result<String, StorageError> {
        self.callback_data.encode_with(codec::encode_callback_data)
    }

    pub fn conversations_json(&self) -> Result<String, StorageError> {
        self.conversations.encode_with(codec::encode_conversations)
    }

    /// All five collections as JSON, in the shape [`DictPersistence::from_snapshot`] reads.
    pub fn to_snapshot(&self) -> Result<JsonSnapshot, StorageError> {
        Ok(JsonSnapshot {
            user_data: Some(self.user_data_json()?),
            chat_data: Some(self.chat_data_json()?),
            bot_data: Some(self.bot_data_json()?),
            callback_data: Some(self.callback_data_json()?),
            conversations: Some(self.conversations_json()?),
        })
    }

    #[cfg(test)]
    pub(crate) fn bot_data_cache(&self) -> Option<&str> {
        self.bot_data.cached_json()
    }

    #[cfg(test)]
    pub(crate) fn user_data_cache(&self) -> Option<&str> {
        self.user_data.cached_json()
    }

    #[cfg(test)]
    pub(crate) fn chat_data_cache(&self) -> Option<&str> {
        self.chat_data.cached_json()
    }

    #[cfg(test)]
    pub(crate) fn conversations_cache(&self) -> Option<&str> {
        self.conversations.cached_json()
    }
}

impl Persistence for DictPersistence {
    fn store_data(&self) -> PersistenceInput {
        self.store_data
    }

    fn get_user_data(&mut self) -> &IdDataMap {
        self.user_data.get_or_insert_default()
    }

    fn get_chat_data(&mut self) -> &IdDataMap {
        self.chat_data.get_or_insert_default()
    }

    fn get_bot_data(&mut self) -> &BotData {
        self.bot_data.get_or_insert_default()
    }

    fn get_callback_data(&self) -> Option<CallbackData> {
        self.callback_data.value().cloned()
    }

    fn get_conversations(&mut self, name: &str) -> ConversationStates {
        self.conversations
            .get_or_insert_default()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn update_user_data(&mut self, user_id: i64, data: DataMap) {
        if self.user_data.get_or_insert_default().get(user_id) == Some(&data) {
            return;
        }
        self.user_data.modify(|users| users.insert(user_id, data));
        debug!(user_id, "step: user_data updated, cache invalidated");
    }

    fn update_chat_data(&mut self, chat_id: i64, data: DataMap) {
        if self.chat_data.get_or_insert_default().get(chat_id) == Some(&data) {
            return;
        }
        self.chat_data.modify(|chats| chats.insert(chat_id, data));
        debug!(chat_id, "step: chat_data updated, cache invalidated");
    }

    fn update_bot_data(&mut self, data: BotData) {
        if self.bot_data.value() == Some(&data) {
            return;
        }
        self.bot_data.replace(data);
        debug!("step: bot_data updated, cache invalidated");
    }

    fn update_callback_data(&mut self, data: CallbackData) {
        if self.callback_data.value() == Some(&data) {
            return;
        }
        self.callback_data.replace(data);
        debug!("step: callback_data updated, cache invalidated");
    }

    fn update_conversation(&mut self, name: &str, key: ConversationKey, state: Option<Value>) {
        // The handler's sub-map exists afterwards even when nothing else changes.
        let states = self
            .conversations
            .get_or_insert_default()
            .entry(name.to_string())
            .or_default();
        if states.get(&key).and_then(Option::as_ref) == state.as_ref() {
            return;
        }
        debug!(handler = name, key = %key, "step: conversation updated, cache invalidated");
        self.conversations.modify(|conversations| {
            conversations
                .entry(name.to_string())
                .or_default()
                .insert(key, state)
        });
    }
}
