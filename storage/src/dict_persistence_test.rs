//! Unit tests for DictPersistence.
//!
//! Covers snapshot decoding, accessors materializing defaults, no-op detection in the mutators
//! and the cache getters that never repopulate.

use dbot_core::{BotData, DataKey, DataMap};
use serde_json::json;

use crate::codec::{CallbackData, CallbackEntry, ConversationKey};
use crate::dict_persistence::{DictPersistence, JsonSnapshot};
use crate::error::{PayloadKind, StorageError};
use crate::persistence::{Persistence, PersistenceInput};

fn bot_data(value: serde_json::Value) -> BotData {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("bot data must be an object"),
    }
}

fn data_map(entries: &[(&str, serde_json::Value)]) -> DataMap {
    entries
        .iter()
        .map(|(key, value)| (DataKey::parse(key), value.clone()))
        .collect()
}

#[test]
fn test_user_data_round_trip_has_integer_keys() {
    let snapshot = JsonSnapshot::new().with_user_data(r#"{"1": {"a": 1}}"#);
    let mut persistence = DictPersistence::from_snapshot(&snapshot).expect("valid snapshot");

    let users = persistence.get_user_data();
    assert!(users.contains(1));
    assert_eq!(users.data_for(1), data_map(&[("a", json!(1))]));
    assert!(users.data_for(2).is_empty());

    // the raw input is the cached encoding
    assert_eq!(persistence.user_data_json().unwrap(), r#"{"1": {"a": 1}}"#);
}

#[test]
fn test_empty_snapshot_materializes_defaults() {
    let mut persistence = DictPersistence::from_snapshot(&JsonSnapshot::default()).unwrap();
    assert_eq!(persistence.user_data_json().unwrap(), "null");
    assert_eq!(persistence.conversations_json().unwrap(), "{}");

    assert!(persistence.get_user_data().is_empty());
    assert!(persistence.get_chat_data().is_empty());
    assert!(persistence.get_bot_data().is_empty());
    assert!(persistence.get_callback_data().is_none());
    assert!(persistence.get_conversations("h").is_empty());

    assert_eq!(persistence.user_data_json().unwrap(), "{}");
    assert_eq!(persistence.bot_data_json().unwrap(), "{}");
    assert_eq!(persistence.callback_data_json().unwrap(), "null");
}

#[test]
fn test_empty_strings_count_as_absent() {
    let snapshot = JsonSnapshot::new().with_bot_data("").with_callback_data("");
    let persistence = DictPersistence::from_snapshot(&snapshot).unwrap();
    assert_eq!(persistence.bot_data_json().unwrap(), "null");
}

#[test]
fn test_bot_data_update_is_idempotent() {
    let snapshot = JsonSnapshot::new().with_bot_data("{}");
    let mut persistence = DictPersistence::from_snapshot(&snapshot).unwrap();
    assert_eq!(persistence.bot_data_cache(), Some("{}"));

    persistence.update_bot_data(bot_data(json!({"x": 1})));
    assert_eq!(persistence.bot_data_cache(), None);
    assert_eq!(persistence.bot_data_json().unwrap(), r#"{"x":1}"#);

    // reading does not repopulate the cache
    assert_eq!(persistence.bot_data_cache(), None);

    persistence.update_bot_data(bot_data(json!({"x": 1})));
    assert_eq!(persistence.get_bot_data().get("x"), Some(&json!(1)));
}

#[test]
fn test_equal_update_keeps_decoded_cache() {
    let snapshot = JsonSnapshot::new()
        .with_bot_data(r#"{"x": 1}"#)
        .with_user_data(r#"{"7": {"n": 2}}"#)
        .with_chat_data(r#"{"-1": {}}"#);
    let mut persistence = DictPersistence::from_snapshot(&snapshot).unwrap();

    persistence.update_bot_data(bot_data(json!({"x": 1})));
    persistence.update_user_data(7, data_map(&[("n", json!(2))]));
    persistence.update_chat_data(-1, DataMap::new());

    assert_eq!(persistence.bot_data_cache(), Some(r#"{"x": 1}"#));
    assert_eq!(persistence.user_data_cache(), Some(r#"{"7": {"n": 2}}"#));
    assert_eq!(persistence.chat_data_cache(), Some(r#"{"-1": {}}"#));
}

#[test]
fn test_update_invalidates_only_its_collection() {
    let snapshot = JsonSnapshot::new()
        .with_user_data(r#"{"1": {}}"#)
        .with_chat_data(r#"{"2": {}}"#)
        .with_bot_data("{}");
    let mut persistence = DictPersistence::from_snapshot(&snapshot).unwrap();

    persistence.update_user_data(1, data_map(&[("k", json!("v"))]));

    assert_eq!(persistence.user_data_cache(), None);
    assert_eq!(persistence.chat_data_cache(), Some(r#"{"2": {}}"#));
    assert_eq!(persistence.bot_data_cache(), Some("{}"));
    assert_eq!(persistence.user_data_json().unwrap(), r#"{"1":{"k":"v"}}"#);
}

#[test]
fn test_empty_data_for_unknown_user_is_stored() {
    let mut persistence = DictPersistence::new();
    persistence.update_user_data(5, DataMap::new());
    assert!(persistence.get_user_data().contains(5));
    assert_eq!(persistence.user_data_json().unwrap(), r#"{"5":{}}"#);
}

#[test]
fn test_conversation_key_round_trip() {
    let mut persistence = DictPersistence::new();
    persistence.update_conversation("h", ConversationKey::from([1, 2]), Some(json!("STATE")));

    let json = persistence.conversations_json().unwrap();
    assert_eq!(json, r#"{"h":{"[1, 2]":"STATE"}}"#);

    let mut reloaded =
        DictPersistence::from_snapshot(&JsonSnapshot::new().with_conversations(json)).unwrap();
    let states = reloaded.get_conversations("h");
    assert_eq!(states.len(), 1);
    assert_eq!(states[&ConversationKey::from([1, 2])], Some(json!("STATE")));
}

#[test]
fn test_conversation_none_for_missing_key_is_noop() {
    let snapshot = JsonSnapshot::new().with_conversations("{}");
    let mut persistence = DictPersistence::from_snapshot(&snapshot).unwrap();

    persistence.update_conversation("h", ConversationKey::from([3]), None);

    // sub-map is created, but nothing was written and the cache is intact
    assert_eq!(persistence.conversations_cache(), Some("{}"));
    assert!(persistence.get_conversations("h").is_empty());

    persistence.update_conversation("h", ConversationKey::from([3]), Some(json!(1)));
    assert_eq!(persistence.conversations_cache(), None);
    persistence.update_conversation("h", ConversationKey::from([3]), None);
    assert_eq!(persistence.get_conversations("h")[&ConversationKey::from([3])], None);
}

#[test]
fn test_callback_data_round_trip_and_noop() {
    let raw = r#"[[["id1", 3.5, {"button": "a"}]], {"id1": "x"}]"#;
    let mut persistence =
        DictPersistence::from_snapshot(&JsonSnapshot::new().with_callback_data(raw)).unwrap();

    let data = persistence.get_callback_data().expect("callback data present");
    assert_eq!(data.entries[0].id, "id1");
    assert_eq!(data.entries[0].timestamp, 3.5);

    persistence.update_callback_data(data.clone());
    assert_eq!(persistence.callback_data_json().unwrap(), raw);

    let mut changed = data;
    changed.entries.push(CallbackEntry {
        id: "id2".into(),
        timestamp: 4.0,
        data: Default::default(),
    });
    persistence.update_callback_data(changed);
    assert_eq!(
        persistence.callback_data_json().unwrap(),
        r#"[[["id1",3.5,{"button":"a"}],["id2",4.0,{}]],{"id1":"x"}]"#
    );
}

#[test]
fn test_callback_data_null_and_empty_update() {
    let mut persistence =
        DictPersistence::from_snapshot(&JsonSnapshot::new().with_callback_data("null")).unwrap();
    assert!(persistence.get_callback_data().is_none());

    persistence.update_callback_data(CallbackData::default());
    assert_eq!(persistence.callback_data_json().unwrap(), "[[],{}]");
}

#[test]
fn test_malformed_callback_data_fails_construction() {
    let snapshot = JsonSnapshot::new().with_callback_data(r#"[[], ["not", "a", "map"]]"#);
    let err = DictPersistence::from_snapshot(&snapshot).unwrap_err();
    assert!(matches!(
        err,
        StorageError::InvalidFormat {
            payload: PayloadKind::CallbackData,
            ..
        }
    ));
}

#[test]
fn test_non_finite_callback_timestamp_never_reaches_disk() {
    let snapshot = JsonSnapshot::new().with_callback_data(r#"[[["a", "inf", {}]], {}]"#);
    let err = DictPersistence::from_snapshot(&snapshot).unwrap_err();
    assert_eq!(err.payload(), Some(PayloadKind::CallbackData));

    let mut persistence = DictPersistence::new();
    persistence.update_callback_data(CallbackData {
        entries: vec![CallbackEntry {
            id: "a".into(),
            timestamp: f64::NAN,
            data: Default::default(),
        }],
        state: Default::default(),
    });
    let err = persistence.callback_data_json().unwrap_err();
    assert!(matches!(
        err,
        StorageError::InvalidFormat {
            payload: PayloadKind::CallbackData,
            ..
        }
    ));
}

#[test]
fn test_each_payload_error_is_named() {
    let cases = [
        (JsonSnapshot::new().with_user_data("nope"), PayloadKind::UserData),
        (JsonSnapshot::new().with_chat_data("[]"), PayloadKind::ChatData),
        (JsonSnapshot::new().with_bot_data("1"), PayloadKind::BotData),
        (JsonSnapshot::new().with_conversations(r#"{"h": 1}"#), PayloadKind::Conversations),
    ];
    for (snapshot, kind) in cases {
        let err = DictPersistence::from_snapshot(&snapshot).unwrap_err();
        assert_eq!(err.payload(), Some(kind));
        assert!(err.to_string().contains(&kind.to_string()));
    }
}

#[test]
fn test_store_data_defaults_and_override() {
    assert_eq!(DictPersistence::new().store_data(), PersistenceInput::default());

    let input = PersistenceInput {
        bot_data: false,
        ..PersistenceInput::default()
    };
    let persistence = DictPersistence::new().with_store_data(input);
    assert!(!persistence.store_data().bot_data);
    assert!(persistence.store_data().user_data);
}

#[test]
fn test_snapshot_round_trip() {
    let mut persistence = DictPersistence::new();
    persistence.update_user_data(1, data_map(&[("2", json!("two"))]));
    persistence.update_bot_data(bot_data(json!({"b": true})));

    let snapshot = persistence.to_snapshot().unwrap();
    let mut reloaded = DictPersistence::from_snapshot(&snapshot).unwrap();

    assert_eq!(
        reloaded.get_user_data().data_for(1).get(&DataKey::Int(2)),
        Some(&json!("two"))
    );
    assert_eq!(reloaded.get_bot_data().get("b"), Some(&json!(true)));
    assert!(reloaded.get_callback_data().is_none());
    assert!(reloaded.flush().is_ok());
}
