//! Testing utilities for the Fiber workspace
//!
//! Shared fixtures and an event recorder.

#![allow(missing_docs)]

use fiber_events::{Broadcast, Emitter, Event, Listener};
use fiber_state::{Field, FieldType, Options, Schema};
use fiber_value::{AttrMap, Value};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// `{key, obj, arr}` fixture
pub fn sample_attributes() -> AttrMap {
    AttrMap::from_plain(json!({
        "key": "value",
        "obj": {"a": 1, "nested": {"b": true}},
        "arr": [1, 2, 3]
    }))
    .unwrap()
}

/// Options bound to a private bus so tests never touch the global one
pub fn isolated_options() -> Options {
    Options::new().with_broadcast(Broadcast::new())
}

pub fn person_schema() -> Schema {
    Schema::new()
        .field("name", Field::new(FieldType::Str).required())
        .field("age", Field::new(FieldType::Int).with_default(0))
        .field("email", Field::new(FieldType::Str))
        .field("tags", Field::new(FieldType::List))
}

/// Records every event delivered to its listener
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that appends to this recorder
    pub fn listener(&self) -> Listener {
        let events = Arc::clone(&self.events);
        Listener::new(move |event: &Event| {
            events
                .lock()
                .push((event.name().to_string(), event.args().to_vec()));
        })
    }

    /// Subscribe to every event on `emitter`
    pub fn attach(&self, emitter: &Emitter) -> Listener {
        emitter.on(fiber_events::ALL_EVENTS, self.listener())
    }

    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn args(&self, name: &str) -> Option<Vec<Value>> {
        self.events
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, args)| args.clone())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
