//! Event channel
//!
//! Provides [`Emitter`]: synchronous, ordered dispatch with a namespace, an
//! alias [`Catalog`], inversion-of-control subscriptions and a broadcast bus.
//!
//! # Naming
//!
//! [`Emitter::event`] turns a short name into the emitted one:
//! - `""` stays empty (firing it is a no-op)
//! - `"!name"` is taken literally as `"name"`
//! - a catalog alias replaces the name, leading and trailing dots are trimmed
//! - a non-empty namespace is prefixed as `"ns:"`
//!
//! # Locking
//!
//! Registries sit behind `parking_lot` locks that are always released before
//! listeners run, so listeners may subscribe, fire or unsubscribe re-entrantly.

use crate::broadcast::Broadcast;
use crate::catalog::Catalog;
use crate::listener::{EmitterId, Event, IntoListener, Listener};
use crate::selector::Selector;
use fiber_value::Value;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Event name whose listeners receive every event
pub const ALL_EVENTS: &str = "all";

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// Listener registered on an emitter
struct Registration {
    id: u64,
    name: String,
    listener: Listener,
    once: bool,
    subscriber: Weak<Inner>,
}

/// Subscription an emitter holds on another (or itself)
struct Subscription {
    id: u64,
    target_id: EmitterId,
    target: Weak<Inner>,
    name: String,
    listener: Listener,
}

#[derive(Default)]
struct Naming {
    namespace: String,
    catalog: Catalog,
}

struct Inner {
    id: EmitterId,
    naming: RwLock<Naming>,
    broadcast: RwLock<Option<Broadcast>>,
    registry: Mutex<Vec<Registration>>,
    listening: Mutex<Vec<Subscription>>,
    channels: Mutex<HashMap<String, Emitter>>,
}

/// Event channel
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<Inner>,
}

impl Emitter {
    /// Create emitter attached to the global broadcast bus
    #[must_use]
    pub fn new() -> Self {
        Self::detached().with_broadcast(Broadcast::global().clone())
    }

    /// Emitter without a bus of its own; it acts as its own broadcast
    pub(crate) fn detached() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: EmitterId::next(),
                naming: RwLock::new(Naming::default()),
                broadcast: RwLock::new(None),
                registry: Mutex::new(Vec::new()),
                listening: Mutex::new(Vec::new()),
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Set namespace
    #[must_use]
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        self.set_namespace(namespace);
        self
    }

    /// Set catalog
    #[must_use]
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        self.set_catalog(catalog);
        self
    }

    /// Attach to a broadcast bus
    #[must_use]
    pub fn with_broadcast(self, broadcast: Broadcast) -> Self {
        *self.inner.broadcast.write() = Some(broadcast);
        self
    }

    /// Identity of this emitter
    #[inline]
    #[must_use]
    pub fn id(&self) -> EmitterId {
        self.inner.id
    }

    /// Current namespace
    #[must_use]
    pub fn namespace(&self) -> String {
        self.inner.naming.read().namespace.clone()
    }

    /// Current catalog
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.inner.naming.read().catalog.clone()
    }

    /// Replace namespace
    pub fn set_namespace(&self, namespace: impl Into<String>) {
        self.inner.naming.write().namespace = namespace.into();
    }

    /// Replace catalog
    pub fn set_catalog(&self, catalog: Catalog) {
        self.inner.naming.write().catalog = catalog;
    }

    /// Reset namespace and catalog to empty
    pub fn reset_naming(&self) {
        *self.inner.naming.write() = Naming::default();
    }

    /// Bus used by the broadcast methods
    #[must_use]
    pub fn broadcast_bus(&self) -> Broadcast {
        self.inner
            .broadcast
            .read()
            .clone()
            .unwrap_or_else(|| Broadcast::from_emitter(self.clone()))
    }

    /// Resolve a short event name through catalog and namespace
    #[must_use]
    pub fn event(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        if let Some(literal) = name.strip_prefix('!') {
            return literal.to_string();
        }
        if name == ALL_EVENTS {
            return name.to_string();
        }

        let naming = self.inner.naming.read();
        let resolved = naming.catalog.lookup(name).unwrap_or(name).trim_matches('.');
        if naming.namespace.is_empty() {
            resolved.to_string()
        } else {
            format!("{}:{}", naming.namespace, resolved)
        }
    }

    /// Resolve `name` with the naming of `source`
    #[inline]
    #[must_use]
    pub fn event_for(&self, name: &str, source: &Emitter) -> String {
        source.event(name)
    }

    fn resolve_names(&self, names: &str) -> Vec<String> {
        names
            .split_whitespace()
            .map(|name| self.event(name))
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Dispatch literal event name(s) to listeners
    ///
    /// Space-separated names dispatch each name in turn. A panicking
    /// listener propagates and skips the listeners after it.
    pub fn trigger(&self, name: &str, args: Vec<Value>) {
        for name in name.split_whitespace() {
            self.dispatch(name, &args);
        }
    }

    /// Dispatch event name(s) after resolving them with [`Emitter::event`]
    pub fn fire(&self, name: &str, args: Vec<Value>) {
        for name in self.resolve_names(name) {
            self.dispatch(&name, &args);
        }
    }

    fn dispatch(&self, name: &str, args: &[Value]) {
        let (listeners, expired) = {
            let mut registry = self.inner.registry.lock();
            let hit = |r: &Registration| r.name == name || r.name == ALL_EVENTS;

            let mut listeners: Vec<Listener> = registry
                .iter()
                .filter(|r| r.name == name)
                .map(|r| r.listener.clone())
                .collect();
            if name != ALL_EVENTS {
                listeners.extend(
                    registry
                        .iter()
                        .filter(|r| r.name == ALL_EVENTS)
                        .map(|r| r.listener.clone()),
                );
            }

            let mut expired = Vec::new();
            registry.retain(|r| {
                let done = r.once && hit(r);
                if done {
                    expired.push((r.id, r.subscriber.clone()));
                }
                !done
            });
            (listeners, expired)
        };

        forget_subscriptions(expired);

        if listeners.is_empty() {
            return;
        }

        tracing::trace!("{} dispatching {} to {} listeners", self.id(), name, listeners.len());
        let event = Event::new(name, args.to_vec(), self.id());
        for listener in &listeners {
            listener.call(&event);
        }
    }

    /// Listen to `name` on this emitter
    pub fn on(&self, name: &str, listener: impl IntoListener) -> Listener {
        self.when(self, name, listener)
    }

    /// Listen to `name` on this emitter for a single dispatch
    ///
    /// With several space-separated names the listener fires once per name.
    pub fn once(&self, name: &str, listener: impl IntoListener) -> Listener {
        self.after(self, name, listener)
    }

    /// Listen to `name` on `source`, tracking the subscription here
    pub fn when(&self, source: &Emitter, name: &str, listener: impl IntoListener) -> Listener {
        self.subscribe(source, name, listener.into_listener(), false)
    }

    /// Like [`Emitter::when`], for a single dispatch
    pub fn after(&self, source: &Emitter, name: &str, listener: impl IntoListener) -> Listener {
        self.subscribe(source, name, listener.into_listener(), true)
    }

    fn subscribe(&self, source: &Emitter, names: &str, listener: Listener, once: bool) -> Listener {
        for name in source.resolve_names(names) {
            let id = NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed);
            self.inner.listening.lock().push(Subscription {
                id,
                target_id: source.id(),
                target: Arc::downgrade(&source.inner),
                name: name.clone(),
                listener: listener.clone(),
            });
            source.inner.registry.lock().push(Registration {
                id,
                name,
                listener: listener.clone(),
                once,
                subscriber: Arc::downgrade(&self.inner),
            });
        }
        tracing::debug!("{} listening to {:?} on {}", self.id(), names, source.id());
        listener
    }

    /// Remove subscriptions this emitter holds that match `selector`
    ///
    /// Event names in the selector are resolved with the naming of the
    /// emitter each subscription targets. Returns the number removed.
    pub fn off(&self, selector: &Selector) -> usize {
        let removed: Vec<Subscription> = {
            let mut listening = self.inner.listening.lock();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *listening)
                .into_iter()
                .partition(|sub| selects(selector, sub));
            *listening = kept;
            removed
        };

        for sub in &removed {
            if let Some(target) = sub.target.upgrade() {
                target.registry.lock().retain(|r| r.id != sub.id);
            }
        }

        if !removed.is_empty() {
            tracing::debug!("{} stopped {} subscriptions", self.id(), removed.len());
        }
        removed.len()
    }

    /// Fire on the broadcast bus
    pub fn broadcast(&self, name: &str, args: Vec<Value>) {
        self.broadcast_bus().fire(name, args);
    }

    /// Listen to `name` on the broadcast bus
    pub fn when_broadcast(&self, name: &str, listener: impl IntoListener) -> Listener {
        let bus = self.broadcast_bus();
        self.when(bus.emitter(), name, listener)
    }

    /// Listen to `name` on the broadcast bus for a single dispatch
    pub fn after_broadcast(&self, name: &str, listener: impl IntoListener) -> Listener {
        let bus = self.broadcast_bus();
        self.after(bus.emitter(), name, listener)
    }

    /// Remove matching broadcast subscriptions held by this emitter
    pub fn stop_broadcast(&self, selector: Selector) -> usize {
        let bus = self.broadcast_bus();
        self.off(&selector.source(bus.emitter()))
    }

    /// Drop every listener on the broadcast bus, whoever registered it
    pub fn destroy_broadcast_events(&self) -> usize {
        self.broadcast_bus().clear()
    }

    /// Memoized child emitter for `name`
    ///
    /// Children share this emitter's broadcast bus but start with empty
    /// naming.
    #[must_use]
    pub fn channel(&self, name: &str) -> Emitter {
        let bus = self.broadcast_bus();
        self.inner
            .channels
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Emitter::detached().with_broadcast(bus))
            .clone()
    }

    /// Unsubscribe everything this emitter listens to and drop every
    /// listener registered on it
    ///
    /// The emitter stays usable; the broadcast bus itself is untouched.
    pub fn destroy(&self) {
        let stopped = self.off(&Selector::new());
        let dropped = self.clear_listeners();
        let channels = std::mem::take(&mut *self.inner.channels.lock());
        tracing::debug!(
            "{} destroyed: {} subscriptions, {} listeners, {} channels",
            self.id(),
            stopped,
            dropped,
            channels.len()
        );
    }

    pub(crate) fn clear_listeners(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.registry.lock());
        let count = drained.len();
        forget_subscriptions(drained.into_iter().map(|r| (r.id, r.subscriber)).collect());
        count
    }

    /// Number of listeners registered on this emitter, optionally for one
    /// literal event name
    #[must_use]
    pub fn listener_count(&self, name: Option<&str>) -> usize {
        let registry = self.inner.registry.lock();
        match name {
            Some(name) => registry.iter().filter(|r| r.name == name).count(),
            None => registry.len(),
        }
    }

    /// Number of subscriptions this emitter holds
    #[must_use]
    pub fn listening_count(&self) -> usize {
        self.inner.listening.lock().len()
    }
}

fn selects(selector: &Selector, sub: &Subscription) -> bool {
    if !selector.matches_source(sub.target_id) || !selector.matches_listener(&sub.listener) {
        return false;
    }
    match (&selector.event, sub.target.upgrade()) {
        (None, _) | (Some(_), None) => true,
        (Some(names), Some(target)) => Emitter::from_inner(target)
            .resolve_names(names)
            .contains(&sub.name),
    }
}

fn forget_subscriptions(expired: Vec<(u64, Weak<Inner>)>) {
    for (id, subscriber) in expired {
        if let Some(subscriber) = subscriber.upgrade() {
            subscriber.listening.lock().retain(|sub| sub.id != id);
        }
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Emitter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Emitter {}

impl Debug for Emitter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let naming = self.inner.naming.read();
        f.debug_struct("Emitter")
            .field("id", &self.inner.id)
            .field("namespace", &naming.namespace)
            .field("catalog", &naming.catalog)
            .finish_non_exhaustive()
    }
}
