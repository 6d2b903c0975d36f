//! JSON layout of the persisted collections.
//!
//! - user/chat data: `{"<int-id>": {"<key>": <value>, ...}, ...}`
//! - bot data: `{"<key>": <value>, ...}`
//! - conversations: `{"<handler>": {"[1, 2]": <state or null>, ...}, ...}`
//! - callback data: `[[["<id>", <timestamp>, {...}], ...], {...}]` or `null`

use std::collections::BTreeMap;
use std::fmt;

use dbot_core::{BotData, DataKey, DataMap, DataPayload, IdDataMap};
use serde_json::{Map, Number, Value};

use crate::error::{PayloadKind, StorageError};

/// Key of one conversation inside a handler, e.g. `(chat_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationKey(Vec<i64>);

impl ConversationKey {
    pub fn new(parts: Vec<i64>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[i64] {
        &self.0
    }

    /// Encoded form used as a JSON object key: `[1, 2]`.
    pub fn encode(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(i64::to_string).collect();
        format!("[{}]", parts.join(", "))
    }

    /// Inverse of [`ConversationKey::encode`]; any JSON array of integers is accepted.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str::<Vec<i64>>(raw).ok().map(Self)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<Vec<i64>> for ConversationKey {
    fn from(parts: Vec<i64>) -> Self {
        Self(parts)
    }
}

impl<const N: usize> From<[i64; N]> for ConversationKey {
    fn from(parts: [i64; N]) -> Self {
        Self(parts.to_vec())
    }
}

/// States of one conversation handler. `None` is an ended or unset conversation.
pub type ConversationStates = BTreeMap<ConversationKey, Option<Value>>;

/// Conversation states of every handler, by handler name.
pub type Conversations = BTreeMap<String, ConversationStates>;

/// One cached callback button payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEntry {
    pub id: String,
    pub timestamp: f64,
    pub data: DataPayload,
}

/// Callback data cache: the stored entries plus the id mapping state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackData {
    pub entries: Vec<CallbackEntry>,
    pub state: DataPayload,
}

fn parse(raw: &str, payload: PayloadKind) -> Result<Value, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::InvalidJson { payload, source })
}

fn as_object(value: Value, payload: PayloadKind, what: &str) -> Result<Map<String, Value>, StorageError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::format(
            payload,
            format!("{} must be an object, got {}", what, type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes user or chat data. Top-level keys must be integers; inner keys are coerced with
/// [`DataKey::parse`].
pub fn decode_id_map(raw: &str, payload: PayloadKind) -> Result<IdDataMap, StorageError> {
    let outer = as_object(parse(raw, payload)?, payload, "top level")?;
    outer
        .into_iter()
        .map(|(id, data)| -> Result<(i64, DataMap), StorageError> {
            let id: i64 = id
                .parse()
                .map_err(|_| StorageError::format(payload, format!("key {:?} is not an integer id", id)))?;
            let inner = as_object(data, payload, &format!("data for {}", id))?;
            let data: DataMap = inner
                .into_iter()
                .map(|(key, value)| (DataKey::parse(&key), value))
                .collect();
            Ok((id, data))
        })
        .collect()
}

pub fn decode_bot_data(raw: &str) -> Result<BotData, StorageError> {
    let payload = PayloadKind::BotData;
    as_object(parse(raw, payload)?, payload, "top level")
}

/// `null` decodes to `None`; anything but `[entries, state]` is an error.
pub fn decode_callback_data(raw: &str) -> Result<Option<CallbackData>, StorageError> {
    let payload = PayloadKind::CallbackData;
    let items = match parse(raw, payload)? {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => {
            return Err(StorageError::format(
                payload,
                format!("expected a 2-element array, got {}", type_name(&other)),
            ))
        }
    };
    let [entries, state]: [Value; 2] = items
        .try_into()
        .map_err(|items: Vec<Value>| {
            StorageError::format(payload, format!("expected 2 elements, got {}", items.len()))
        })?;

    let Value::Array(entries) = entries else {
        return Err(StorageError::format(payload, "first element must be an array"));
    };
    let entries = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| decode_callback_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;
    let state = as_object(state, payload, "second element")?;

    Ok(Some(CallbackData { entries, state }))
}

fn decode_callback_entry(index: usize, entry: Value) -> Result<CallbackEntry, StorageError> {
    let payload = PayloadKind::CallbackData;
    let bad = |reason: &str| StorageError::format(payload, format!("entry {}: {}", index, reason));

    let Value::Array(parts) = entry else {
        return Err(bad("must be an array"));
    };
    let [id, timestamp, data]: [Value; 3] = parts
        .try_into()
        .map_err(|_| bad("must have exactly 3 elements"))?;

    let Value::String(id) = id else {
        return Err(bad("id must be a string"));
    };
    let timestamp = match &timestamp {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|t| t.is_finite())
    .ok_or_else(|| bad("timestamp must be a finite number"))?;
    let Value::Object(data) = data else {
        return Err(bad("data must be an object"));
    };

    Ok(CallbackEntry { id, timestamp, data })
}

/// Decodes conversations; inner keys are JSON arrays of integers encoded as strings.
pub fn decode_conversations(raw: &str) -> Result<Conversations, StorageError> {
    let payload = PayloadKind::Conversations;
    let outer = as_object(parse(raw, payload)?, payload, "top level")?;
    outer
        .into_iter()
        .map(|(name, states)| -> Result<(String, ConversationStates), StorageError> {
            let states = as_object(states, payload, &format!("handler {:?}", name))?;
            let states = states
                .into_iter()
                .map(|(key, state)| -> Result<(ConversationKey, Option<Value>), StorageError> {
                    let key = ConversationKey::decode(&key).ok_or_else(|| {
                        StorageError::format(
                            payload,
                            format!("key {:?} of handler {:?} is not an array of integers", key, name),
                        )
                    })?;
                    let state = match state {
                        Value::Null => None,
                        state => Some(state),
                    };
                    Ok((key, state))
                })
                .collect::<Result<ConversationStates, StorageError>>()?;
            Ok((name, states))
        })
        .collect()
}

/// Absent data encodes as `null`.
pub fn encode_id_map(data: Option<&IdDataMap>) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&data)?)
}

pub fn encode_bot_data(data: Option<&BotData>) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&data)?)
}

pub fn encode_callback_data(data: Option<&CallbackData>) -> Result<String, StorageError> {
    let Some(data) = data else {
        return Ok("null".to_string());
    };
    let entries = data
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<Value, StorageError> {
            // Non-finite floats would serialize as null and fail to load again.
            let timestamp = Number::from_f64(entry.timestamp).ok_or_else(|| {
                StorageError::format(
                    PayloadKind::CallbackData,
                    format!("entry {}: timestamp {} is not finite", index, entry.timestamp),
                )
            })?;
            Ok(Value::Array(vec![
                Value::String(entry.id.clone()),
                Value::Number(timestamp),
                Value::Object(entry.data.clone()),
            ]))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let value = Value::Array(vec![Value::Array(entries), Value::Object(data.state.clone())]);
    Ok(serde_json::to_string(&value)?)
}

/// Absent conversations encode as an empty object.
pub fn encode_conversations(data: Option<&Conversations>) -> Result<String, StorageError> {
    let mut outer = Map::new();
    for (name, states) in data.into_iter().flatten() {
        let inner: Map<String, Value> = states
            .iter()
            .map(|(key, state)| (key.encode(), state.clone().unwrap_or(Value::Null)))
            .collect();
        outer.insert(name.clone(), Value::Object(inner));
    }
    Ok(serde_json::to_string(&outer)?)
}
