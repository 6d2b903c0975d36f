use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{
    BotData, CallbackContext, DataMap, DbotError, HandlerResponse, Middleware, Result, Update,
};
use storage::Persistence;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

/// Loads user, chat and bot data into the context before dispatch and writes it back after.
///
/// Which categories are touched follows the persistence's [`storage::PersistenceInput`].
///
/// Updates from different chats can be in flight at once, so write-back never stores the context's
/// copy wholesale: only keys the handlers set or removed since `before` are applied on top of the
/// store's current value. Writes go through the `update_*` mutators, so unchanged data costs nothing.
pub struct PersistenceMiddleware<P> {
    persistence: Arc<Mutex<P>>,
}

impl<P> Clone for PersistenceMiddleware<P> {
    fn clone(&self) -> Self {
        Self {
            persistence: self.persistence.clone(),
        }
    }
}

impl<P: Persistence> PersistenceMiddleware<P> {
    pub fn new(persistence: Arc<Mutex<P>>) -> Self {
        Self { persistence }
    }

    /// Shared handle to the underlying persistence (e.g. to save it on shutdown).
    pub fn persistence(&self) -> Arc<Mutex<P>> {
        self.persistence.clone()
    }
}

#[async_trait]
impl<P: Persistence + 'static> Middleware for PersistenceMiddleware<P> {
    #[instrument(skip(self, update, context), fields(update_id = update.id))]
    async fn before(&self, update: &Update, context: &mut CallbackContext) -> Result<bool> {
        let mut store = self.persistence.lock().await;
        let input = store.store_data();

        if input.user_data {
            if let Some(user) = update.effective_user() {
                let mut data = store.get_user_data().data_for(user.id);
                store.refresh_user_data(user.id, &mut data);
                context.loaded.user_data = Some(data.clone());
                context.user_data = Some(data);
            }
        }
        if input.chat_data {
            if let Some(chat) = update.effective_chat() {
                let mut data = store.get_chat_data().data_for(chat.id);
                store.refresh_chat_data(chat.id, &mut data);
                context.loaded.chat_data = Some(data.clone());
                context.chat_data = Some(data);
            }
        }
        if input.bot_data {
            let mut data = store.get_bot_data().clone();
            store.refresh_bot_data(&mut data);
            context.loaded.bot_data = Some(data.clone());
            context.bot_data = data;
        }

        debug!(
            user_data = context.user_data.is_some(),
            chat_data = context.chat_data.is_some(),
            "step: PersistenceMiddleware before, data loaded into context"
        );
        Ok(true)
    }

    #[instrument(skip(self, update, context, response), fields(update_id = update.id))]
    async fn after(
        &self,
        update: &Update,
        context: &CallbackContext,
        response: &HandlerResponse,
    ) -> Result<()> {
        let mut store = self.persistence.lock().await;
        let input = store.store_data();

        let loaded = &context.loaded;

        if input.user_data {
            if let (Some(user), Some(edited)) = (update.effective_user(), &context.user_data) {
                let mut data = store.get_user_data().data_for(user.id);
                apply_data_changes(&mut data, loaded.user_data.as_ref(), edited);
                store.update_user_data(user.id, data);
            }
        }
        if input.chat_data {
            if let (Some(chat), Some(edited)) = (update.effective_chat(), &context.chat_data) {
                let mut data = store.get_chat_data().data_for(chat.id);
                apply_data_changes(&mut data, loaded.chat_data.as_ref(), edited);
                store.update_chat_data(chat.id, data);
            }
        }
        if input.bot_data {
            let mut data = store.get_bot_data().clone();
            apply_bot_data_changes(&mut data, loaded.bot_data.as_ref(), &context.bot_data);
            store.update_bot_data(data);
        }

        store.flush().map_err(|e| {
            error!(error = %e, "Failed to flush persistence");
            DbotError::Storage(e.to_string())
        })?;

        info!(response = ?response, "step: PersistenceMiddleware after, data written back");
        Ok(())
    }
}

/// Applies to `current` every key that differs between `loaded` and `edited`: set or changed keys are
/// copied, keys missing from `edited` are removed. Nothing loaded means everything in `edited` is new.
fn apply_data_changes(current: &mut DataMap, loaded: Option<&DataMap>, edited: &DataMap) {
    for (key, value) in edited {
        if loaded.and_then(|l| l.get(key)) != Some(value) {
            current.insert(key.clone(), value.clone());
        }
    }
    for key in loaded.into_iter().flat_map(|l| l.keys()) {
        if !edited.contains_key(key) {
            current.remove(key);
        }
    }
}

/// Same as [`apply_data_changes`] for the string-keyed bot data.
fn apply_bot_data_changes(current: &mut BotData, loaded: Option<&BotData>, edited: &BotData) {
    for (key, value) in edited {
        if loaded.and_then(|l| l.get(key)) != Some(value) {
            current.insert(key.clone(), value.clone());
        }
    }
    for key in loaded.into_iter().flat_map(|l| l.keys()) {
        if !edited.contains_key(key) {
            current.remove(key);
        }
    }
}
