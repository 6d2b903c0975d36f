//! Per-user, per-chat and bot-wide data shapes shared by the dispatcher and persistence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Extra context entries a filter produces (e.g. `"matches"`).
pub type DataPayload = serde_json::Map<String, Value>;

/// Global bot data.
pub type BotData = serde_json::Map<String, Value>;

/// Key of a per-user / per-chat map. Keys that read as base-10 integers are stored as `Int`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKey {
    Int(i64),
    Str(String),
}

impl DataKey {
    /// Best-effort integer coercion; anything else is kept as a string key.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => DataKey::Int(n),
            Err(_) => DataKey::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKey::Int(n) => write!(f, "{}", n),
            DataKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DataKey {
    fn from(n: i64) -> Self {
        DataKey::Int(n)
    }
}

impl From<&str> for DataKey {
    fn from(s: &str) -> Self {
        DataKey::Str(s.to_string())
    }
}

impl From<String> for DataKey {
    fn from(s: String) -> Self {
        DataKey::Str(s)
    }
}

impl Serialize for DataKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataKey::Int(n) => serializer.serialize_i64(*n),
            DataKey::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// Data stored for one user or one chat.
pub type DataMap = BTreeMap<DataKey, Value>;

/// Per-id data (user_data or chat_data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IdDataMap(BTreeMap<i64, DataMap>);

impl IdDataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<&DataMap> {
        self.0.get(&id)
    }

    /// The stored data for `id`, or an empty map when there is none.
    pub fn data_for(&self, id: i64) -> DataMap {
        self.0.get(&id).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, id: i64, data: DataMap) -> Option<DataMap> {
        self.0.insert(id, data)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &DataMap)> {
        self.0.iter()
    }
}

impl FromIterator<(i64, DataMap)> for IdDataMap {
    fn from_iter<T: IntoIterator<Item = (i64, DataMap)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
