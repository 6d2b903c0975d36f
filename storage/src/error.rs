//! Storage error types.
//!
//! Decoding a snapshot names the payload that failed; encoding only fails if serde_json does.

use std::fmt;

use thiserror::Error;

/// Which of the five serialized collections an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    UserData,
    ChatData,
    BotData,
    CallbackData,
    Conversations,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::UserData => "user_data_json",
            PayloadKind::ChatData => "chat_data_json",
            PayloadKind::BotData => "bot_data_json",
            PayloadKind::CallbackData => "callback_data_json",
            PayloadKind::Conversations => "conversations_json",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when building or encoding a persistence snapshot.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to deserialize {payload}. Not valid JSON: {source}")]
    InvalidJson {
        payload: PayloadKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to deserialize {payload}. Invalid format: {reason}")]
    InvalidFormat { payload: PayloadKind, reason: String },
    #[error("Failed to encode data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn format(payload: PayloadKind, reason: impl Into<String>) -> Self {
        StorageError::InvalidFormat {
            payload,
            reason: reason.into(),
        }
    }

    /// The payload a decode error refers to; `None` for encode errors.
    pub fn payload(&self) -> Option<PayloadKind> {
        match self {
            StorageError::InvalidJson { payload, .. } | StorageError::InvalidFormat { payload, .. } => {
                Some(*payload)
            }
            StorageError::Serialize(_) => None,
        }
    }
}
