//! Per-update context handed to callbacks.

use std::sync::Arc;

use serde_json::Value;

use crate::bot::Bot;
use crate::data::{BotData, DataMap, DataPayload};
use crate::types::CheckResult;

/// Persisted data as it was handed to the handlers, kept so write-back can tell what they changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedData {
    pub user_data: Option<DataMap>,
    pub chat_data: Option<DataMap>,
    pub bot_data: Option<BotData>,
}

/// Context built once per update and shared by every handler that runs for it.
///
/// `user_data`, `chat_data` and `bot_data` are filled by middleware (e.g. persistence) and read
/// back after dispatch, so callbacks mutate them in place.
#[derive(Default)]
pub struct CallbackContext {
    /// Positional arguments extracted by a command-style handler.
    pub args: Option<Vec<String>>,
    /// Entries merged in from data-producing filters.
    pub extra: DataPayload,
    pub user_data: Option<DataMap>,
    pub chat_data: Option<DataMap>,
    pub bot_data: BotData,
    /// Set by the persistence middleware alongside the three data fields above.
    pub loaded: LoadedData,
    pub bot: Option<Arc<dyn Bot>>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bot(mut self, bot: Arc<dyn Bot>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Sets `args` from a matched check and merges the filter data into `extra`.
    /// `NoMatch` and `Filtered` leave the context untouched.
    pub fn apply_match(&mut self, check: &CheckResult) {
        if let CheckResult::Matched { args, data } = check {
            self.args = Some(args.clone());
            if let Some(data) = data {
                for (key, value) in data {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Regex matches left by a regex filter, if any.
    pub fn matches(&self) -> Vec<&str> {
        self.extra
            .get("matches")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}
