use fiber_events::{Broadcast, Catalog, Emitter, Event, Listener, Scope, Selector, ALL_EVENTS};
use fiber_value::Value;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn isolated() -> Emitter {
    Emitter::new().with_broadcast(Broadcast::new())
}

fn counting() -> (Arc<AtomicUsize>, Listener) {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let listener = Listener::new(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (hits, listener)
}

fn recording() -> (Arc<Mutex<Vec<Event>>>, Listener) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&events);
    let listener = Listener::new(move |e| log.lock().push(e.clone()));
    (events, listener)
}

#[test]
fn test_fire_uses_namespace_and_catalog() {
    let vent = isolated()
        .with_namespace("ns")
        .with_catalog(Catalog::new().with_alias("event", "cataloged:event"));
    let (events, listener) = recording();

    vent.on("event", listener);
    vent.fire("event", vec![Value::from("PAYLOAD")]);

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "ns:cataloged:event");
    assert_eq!(events[0].args(), &[Value::from("PAYLOAD")]);
    assert_eq!(events[0].source(), vent.id());
}

#[test]
fn test_trigger_is_literal() {
    let vent = isolated().with_namespace("ns");
    let (hits, listener) = counting();
    vent.on("event", listener);

    vent.trigger("event", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    vent.trigger("ns:event", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_catalog_alias_with_namespace() {
    let model = isolated()
        .with_namespace("app")
        .with_catalog(Catalog::new().with_alias("save", "model:saved"));

    assert_eq!(model.event("save"), "app:model:saved");
    assert_eq!(model.event("!save"), "save");
}

#[test]
fn test_on_and_off() {
    let vent = isolated();
    let (hits, listener) = counting();

    vent.on("event", listener.clone());
    assert_eq!(vent.listening_count(), 1);
    vent.off(&Selector::new().event("event"));
    assert_eq!(vent.listening_count(), 0);

    let (other_hits, other) = counting();
    vent.on("event", listener.clone());
    vent.on("event", other);
    assert_eq!(vent.listening_count(), 2);

    assert_eq!(vent.off(&Selector::new().event("event").listener(&listener)), 1);
    vent.fire("event", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(other_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_off_by_scope() {
    let vent = isolated();
    let scope = Scope::new();
    let (hits, listener) = counting();

    vent.on("a", listener.clone().scoped(scope));
    vent.on("b", listener.clone().scoped(scope));
    vent.on("c", listener);

    assert_eq!(vent.off(&Selector::new().scope(scope)), 2);
    vent.fire("a b c", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_selector_removes_everything() {
    let vent = isolated();
    let other = vent.channel("other");
    vent.on("a", |_: &Event| {});
    vent.when(&other, "b", |_: &Event| {});
    vent.when_broadcast("c", |_: &Event| {});

    assert_eq!(vent.off(&Selector::new()), 3);
    assert_eq!(vent.listening_count(), 0);
    assert_eq!(other.listener_count(None), 0);
    assert_eq!(vent.broadcast_bus().listener_count(), 0);
}

#[test]
fn test_listeners_run_in_registration_order() {
    let vent = isolated();
    let order = Arc::new(Mutex::new(Vec::new()));
    for index in 0..5 {
        let log = Arc::clone(&order);
        vent.on("event", move |_: &Event| log.lock().push(index));
    }

    vent.fire("event", vec![]);
    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_no_cross_talk_between_instances() {
    let a = isolated();
    let b = isolated();
    let (hits, listener) = counting();
    a.on("event", listener);

    b.fire("event", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    a.fire("event", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_space_separated_names() {
    let vent = isolated();
    let (events, listener) = recording();
    vent.on("first second", listener);
    assert_eq!(vent.listening_count(), 2);

    vent.fire("second first", vec![]);
    let names: Vec<_> = events.lock().iter().map(|e| e.name().to_string()).collect();
    assert_eq!(names, vec!["second", "first"]);
}

#[test]
fn test_once_fires_once_per_name() {
    let vent = isolated();
    let (hits, listener) = counting();
    vent.once("a b", listener);

    vent.fire("a", vec![]);
    vent.fire("a", vec![]);
    vent.fire("b", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(vent.listening_count(), 0);
}

#[test]
fn test_all_receives_every_event() {
    let vent = isolated().with_namespace("ns");
    let (events, listener) = recording();
    vent.on(ALL_EVENTS, listener);

    vent.fire("x", vec![]);
    vent.trigger("y", vec![Value::Int(1)]);

    let names: Vec<_> = events.lock().iter().map(|e| e.name().to_string()).collect();
    assert_eq!(names, vec!["ns:x", "y"]);
}

#[test]
fn test_after_on_other_emitter() {
    let source = isolated();
    let watcher = isolated();
    let (hits, listener) = counting();

    watcher.after(&source, "done", listener);
    source.fire("done", vec![]);
    source.fire("done", vec![]);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(watcher.listening_count(), 0);
}

#[test]
fn test_when_broadcast_and_broadcast() {
    let bus = Broadcast::new();
    let listener_side = Emitter::new().with_broadcast(bus.clone());
    let firing_side = Emitter::new().with_broadcast(bus);
    let (events, listener) = recording();

    listener_side.when_broadcast("global", listener);
    firing_side.broadcast("global", vec![Value::from("PAYLOAD")]);

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].arg(0), Some(&Value::from("PAYLOAD")));
}

#[test]
fn test_after_broadcast_fires_once() {
    let vent = isolated();
    let (hits, listener) = counting();
    vent.after_broadcast("global", listener);

    vent.broadcast("global", vec![]);
    vent.broadcast("global", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stop_broadcast() {
    let vent = isolated();
    let (hits, listener) = counting();
    vent.when_broadcast("global", listener.clone());
    vent.on("global", listener.clone());

    assert_eq!(vent.stop_broadcast(Selector::new().listener(&listener)), 1);
    vent.broadcast("global", vec![]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(vent.listening_count(), 1);
}

#[test]
fn test_destroy_broadcast_events() {
    let bus = Broadcast::new();
    let a = Emitter::new().with_broadcast(bus.clone());
    let b = Emitter::new().with_broadcast(bus.clone());
    a.when_broadcast("x", |_: &Event| {});
    b.when_broadcast("y", |_: &Event| {});

    assert_eq!(a.destroy_broadcast_events(), 2);
    assert_eq!(bus.listener_count(), 0);
    assert_eq!(a.listening_count(), 0);
    assert_eq!(b.listening_count(), 0);
}

#[test]
fn test_destroy_clears_own_and_tracked() {
    let vent = isolated();
    let other = isolated();
    let (hits, listener) = counting();

    vent.on("event", listener.clone());
    vent.on("new:event", listener.clone());
    vent.when_broadcast("global", listener.clone());
    other.when(&vent, "event", listener);

    vent.destroy();
    vent.trigger("event", vec![]);
    vent.broadcast("global", vec![]);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(vent.listening_count(), 0);
    assert_eq!(vent.listener_count(None), 0);
    assert_eq!(other.listening_count(), 0);

    vent.on("event", |_: &Event| {});
    assert_eq!(vent.listening_count(), 1);
}

#[test]
fn test_reset_naming() {
    let vent = isolated()
        .with_namespace("ns")
        .with_catalog(Catalog::new().with_alias("a", "b"));
    vent.reset_naming();
    assert_eq!(vent.namespace(), "");
    assert!(vent.catalog().is_empty());
    assert_eq!(vent.event("a"), "a");
}

#[test]
fn test_panicking_listener_propagates() {
    let vent = isolated();
    let (hits, listener) = counting();
    vent.on("event", |_: &Event| panic!("listener failed"));
    vent.on("event", listener);

    let handle = vent.clone();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        handle.fire("event", vec![]);
    }));
    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // registry is still usable
    assert_eq!(vent.listener_count(Some("event")), 2);
    vent.off(&Selector::new());
    vent.fire("event", vec![]);
}

proptest! {
    #[test]
    fn prop_on_off_balances(names in prop::collection::vec("[a-z]{1,4}", 1..10)) {
        let vent = isolated();
        let listener = Listener::new(|_| {});
        for name in &names {
            vent.on(name, listener.clone());
        }
        prop_assert_eq!(vent.listening_count(), names.len());
        prop_assert_eq!(vent.off(&Selector::new().listener(&listener)), names.len());
        prop_assert_eq!(vent.listener_count(None), 0);
    }
}
