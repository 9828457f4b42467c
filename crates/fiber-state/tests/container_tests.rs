//! Container behavior through the public API

use fiber_events::Event;
use fiber_state::{Collection, State, StateError, Synthetic};
use fiber_test_utils::{isolated_options, sample_attributes, EventRecorder};
use fiber_value::{AttrMap, KeyPath, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn sample_state() -> State {
    State::with_options(sample_attributes(), isolated_options())
}

#[test]
fn test_forget_list_element_keeps_positions() {
    let mut state = sample_state();
    let previous = state.forget("arr[1]").unwrap();

    assert_eq!(previous, Some(Value::from(2)));
    assert_eq!(state.get("arr[0]"), Some(&Value::from(1)));
    assert_eq!(state.get("arr[2]"), Some(&Value::from(3)));
    assert!(!state.has("arr[1]"));
    assert_eq!(state.get("key"), Some(&Value::from("value")));
}

#[test]
fn test_nested_paths() {
    let mut state = sample_state();
    assert_eq!(state.get("obj.nested.b"), Some(&Value::from(true)));
    assert_eq!(state.get(["obj", "a"]), Some(&Value::from(1)));
    assert_eq!(state.get_or("obj.missing", "fallback"), Value::from("fallback"));

    state.set("a.b.c", 5).unwrap();
    assert_eq!(state.get("a.b.c"), Some(&Value::from(5)));
    assert_eq!(
        state.get(KeyPath::parse("a.b")).map(Value::to_plain),
        Some(json!({"c": 5}))
    );
}

#[test]
fn test_oversized_list_index_is_bounded() {
    let mut state = sample_state();
    state.set("arr[5000000]", 1).unwrap();
    assert_eq!(state.get("arr").map(Value::to_plain), Some(json!([1, 2, 3])));

    state.set("arr[5]", 6).unwrap();
    assert_eq!(
        state.get("arr").map(Value::to_plain),
        Some(json!([1, 2, 3, null, null, 6]))
    );

    state.set("fresh[18446744073709551615]", true).unwrap();
    assert_eq!(
        state.get("fresh").map(Value::to_plain),
        Some(json!({"18446744073709551615": true}))
    );
}

#[test]
fn test_sort_with_nan_values() {
    let attributes: AttrMap = (0..64)
        .map(|i| {
            let value = if i % 3 == 0 {
                Value::Float(f64::NAN)
            } else {
                Value::from(64 - i)
            };
            (format!("k{i}"), value)
        })
        .collect();
    let state = State::with_options(attributes, isolated_options());

    let sorted = state.sort().unwrap();
    let values = sorted.values();
    assert_eq!(values.len(), 64);
    let first_nan = values
        .iter()
        .position(|v| v.as_f64().is_some_and(f64::is_nan))
        .unwrap();
    assert!(values[first_nan..]
        .iter()
        .all(|v| v.as_f64().is_some_and(f64::is_nan)));
    assert!(values[..first_nan]
        .windows(2)
        .all(|pair| pair[0].as_i64() < pair[1].as_i64()));
}

#[test]
fn test_event_sequence() {
    let mut state = sample_state();
    let recorder = EventRecorder::new();
    recorder.attach(state.emitter());

    state.set("key", "next").unwrap();

    assert_eq!(recorder.names(), vec!["setting", "changing", "changed", "set"]);
    assert_eq!(
        recorder.args("set"),
        Some(vec![Value::from("key"), Value::from("next")])
    );

    let changing = recorder.args("changing").unwrap();
    assert_eq!(changing[0].child("key"), Some(&Value::from("next")));
    assert_eq!(changing[1].child("key"), Some(&Value::from("value")));
}

#[test]
fn test_listener_sees_committed_state_on_changed() {
    let mut collection = Collection::with_options(AttrMap::new(), isolated_options());
    collection.emitter().on("changed", |event: &Event| {
        let current = event.arg(0).and_then(Value::as_map).unwrap();
        let previous = event.arg(1).and_then(Value::as_map).unwrap();
        assert_eq!(current.get("x"), Some(&Value::from(1)));
        assert!(previous.is_empty());
    });
    collection.set("x", 1).unwrap();
}

#[test]
fn test_old_snapshot_unchanged() {
    let mut state = sample_state();
    let before = state.snapshot();
    state.set("obj.a", 2).unwrap().forget("key").unwrap();

    assert_eq!(before.get_in(&KeyPath::parse("obj.a")), Some(&Value::from(1)));
    assert!(before.contains_key("key"));
}

#[test]
fn test_set_many_merges_deeply() {
    let mut state = sample_state();
    state
        .set_many(AttrMap::from_plain(json!({"obj": {"c": 3}})).unwrap())
        .unwrap();
    assert_eq!(
        state.get("obj").map(Value::to_plain),
        Some(json!({"a": 1, "nested": {"b": true}, "c": 3}))
    );

    state
        .merge(AttrMap::from_plain(json!({"obj": {"c": 4}})).unwrap())
        .unwrap();
    assert_eq!(state.get("obj").map(Value::to_plain), Some(json!({"c": 4})));
}

#[test]
fn test_mutate_commits_once() {
    let mut state = sample_state();
    let recorder = EventRecorder::new();
    recorder.attach(state.emitter());

    state
        .mutate(|draft| {
            draft.insert("one", 1);
            draft.insert("two", 2);
            draft.remove("arr");
        })
        .unwrap();

    assert_eq!(recorder.names(), vec!["mutating", "changing", "changed", "mutated"]);
    assert_eq!(state.keys(), vec!["key", "obj", "one", "two"]);
}

#[test]
fn test_update_receives_current_value() {
    let mut state = sample_state();
    state
        .update("obj.a", |current| {
            Value::from(current.and_then(Value::as_i64).unwrap_or(0) + 10)
        })
        .unwrap();
    assert_eq!(state.get("obj.a"), Some(&Value::from(11)));
}

#[test]
fn test_reset_and_flush() {
    let mut state = sample_state();
    state.reset(AttrMap::from([("only", 1)])).unwrap();
    assert_eq!(state.keys(), vec!["only"]);

    state.flush().unwrap();
    assert!(state.is_empty());
    assert_eq!(state.size(), 0);
}

#[test]
fn test_set_size_truncates() {
    let mut state = sample_state();
    state.set_size(2).unwrap();
    assert_eq!(state.keys(), vec!["key", "obj"]);
}

#[test]
fn test_queries() {
    let state = State::with_options(
        AttrMap::from([("a", 3), ("b", 1), ("c", 2)]),
        isolated_options(),
    );

    assert_eq!(state.join("-"), "3-1-2");
    assert_eq!(state.reduce(0, |acc, _, v| acc + v.as_i64().unwrap()), 6);
    assert!(state.every(|_, v| v.as_i64().is_some()));
    assert!(state.some(|k, _| k == "b"));
    assert_eq!(state.find(|_, v| v.as_i64() == Some(2)), Some(Value::from(2)));
    assert_eq!(state.find_key(|_, v| v.as_i64() == Some(1)), Some("b".to_string()));
    assert_eq!(state.key_of(&Value::from(3)), Some("a".to_string()));
    assert_eq!(state.for_each(|k, _| k != "b"), 2);
}

#[test]
fn test_bulk_transforms() {
    let state = State::with_options(
        AttrMap::from([("a", 3), ("b", 1), ("c", 2)]),
        isolated_options(),
    );

    assert_eq!(state.sort().unwrap().keys(), vec!["b", "c", "a"]);
    assert_eq!(state.reverse().unwrap().keys(), vec!["c", "b", "a"]);
    assert_eq!(state.rest().unwrap().keys(), vec!["b", "c"]);
    assert_eq!(state.but_last().unwrap().keys(), vec!["a", "b"]);
    assert_eq!(
        state
            .sort_by(|_, v| Value::from(-v.as_i64().unwrap()))
            .unwrap()
            .keys(),
        vec!["a", "c", "b"]
    );
    assert_eq!(
        state.map_keys(|k, _| k.to_uppercase()).unwrap().to_plain(),
        json!({"A": 3, "B": 1, "C": 2})
    );
    assert_eq!(
        state
            .group_by(|_, v| Value::from(v.as_i64().unwrap() % 2 == 0))
            .unwrap()
            .to_plain(),
        json!({"false": {"a": 3, "b": 1}, "true": {"c": 2}})
    );
    assert_eq!(state.size(), 3);
}

#[test]
fn test_flatten_lifts_nested_entries() {
    let state = sample_state();
    let flat = state.flatten(Some(1)).unwrap();
    assert_eq!(flat.keys(), vec!["key", "a", "nested", "0", "1", "2"]);
    assert_eq!(state.flatten(Some(0)).unwrap().keys(), state.keys());
}

#[test]
fn test_hidden_keys_skip_plain_output() {
    let mut state = sample_state();
    state.mark_as_hidden(["obj", "arr"]);
    assert_eq!(state.to_plain(), json!({"key": "value"}));
    assert!(state.has("obj"));

    state.mark_as_visible(["arr"]);
    assert_eq!(state.to_json().unwrap(), r#"{"key":"value","arr":[1,2,3]}"#);
}

#[test]
fn test_from_serialized() {
    let mut state = sample_state();
    state.from_serialized(r#"{"z": 1, "y": [true]}"#).unwrap();
    assert_eq!(state.keys(), vec!["z", "y"]);

    let err = state.from_serialized("[1]").unwrap_err();
    assert!(matches!(err, StateError::Value(_)));
    assert_eq!(state.keys(), vec!["z", "y"]);
}

#[test]
fn test_destroy_fires_destroying() {
    let mut state = sample_state();
    let recorder = EventRecorder::new();
    recorder.attach(state.emitter());

    state.destroy();
    state.emitter().fire("set", vec![]);

    assert_eq!(recorder.names(), vec!["destroying"]);
    assert!(state.is_empty());
}

proptest! {
    #[test]
    fn prop_get_after_set(key in "[a-z]{1,6}", value in any::<i64>()) {
        let mut collection = Collection::with_options(sample_attributes(), isolated_options());
        collection.set(key.as_str(), value).unwrap();
        prop_assert_eq!(collection.get(key.as_str()), Some(&Value::from(value)));
    }

    #[test]
    fn prop_forget_returns_previous(key in "[a-z]{1,6}", value in any::<bool>()) {
        let mut collection = Collection::with_options(AttrMap::new(), isolated_options());
        collection.set(key.as_str(), value).unwrap();
        prop_assert_eq!(collection.forget(key.as_str()).unwrap(), Some(Value::from(value)));
        prop_assert!(!collection.has(key.as_str()));
    }

    #[test]
    fn prop_filter_leaves_original(values in proptest::collection::vec(any::<i32>(), 0..16)) {
        let attributes: AttrMap = values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("k{i}"), *v))
            .collect();
        let collection = Collection::with_options(attributes.clone(), isolated_options());
        let positive = collection.filter(|_, v| v.as_i64().is_some_and(|n| n > 0)).unwrap();

        prop_assert!(positive.every(|_, v| v.as_i64().is_some_and(|n| n > 0)));
        prop_assert_eq!(collection.snapshot(), attributes);
    }
}
