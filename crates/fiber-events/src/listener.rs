//! Events and listeners
//!
//! Provides [`Event`], the payload handed to listeners, and [`Listener`], a
//! shareable callback with identity.

use fiber_value::Value;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u64);

impl EmitterId {
    pub(crate) fn next() -> Self {
        Self(NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for EmitterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "emitter#{}", self.0)
    }
}

/// Grouping token for listeners
///
/// Listeners registered with the same scope can be removed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope(u64);

impl Scope {
    /// Create a new unique scope
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// A dispatched event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    args: Vec<Value>,
    source: EmitterId,
}

impl Event {
    pub(crate) fn new(name: impl Into<String>, args: Vec<Value>, source: EmitterId) -> Self {
        Self {
            name: name.into(),
            args,
            source,
        }
    }

    /// Fully resolved event name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional arguments
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`
    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Emitter that dispatched the event
    #[inline]
    #[must_use]
    pub fn source(&self) -> EmitterId {
        self.source
    }
}

type Callback = dyn Fn(&Event) + Send + Sync;

/// Event listener
///
/// Clones share the same callback and compare equal under
/// [`Listener::same_callback`]; that identity is what `off` matches on.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<Callback>,
    scope: Option<Scope>,
}

impl Listener {
    /// Wrap a callback
    pub fn new(callback: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
            scope: None,
        }
    }

    /// Attach a scope, returning the updated listener
    #[must_use]
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Scope, if any
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    /// Whether both listeners wrap the same callback
    #[inline]
    #[must_use]
    pub fn same_callback(&self, other: &Listener) -> bool {
        Arc::as_ptr(&self.callback).cast::<()>() == Arc::as_ptr(&other.callback).cast::<()>()
    }

    pub(crate) fn call(&self, event: &Event) {
        (self.callback)(event);
    }
}

impl Debug for Listener {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Arc::as_ptr(&self.callback).cast::<()>())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Anything that can be registered as a listener
pub trait IntoListener {
    /// Convert into a [`Listener`]
    fn into_listener(self) -> Listener;
}

impl IntoListener for Listener {
    fn into_listener(self) -> Listener {
        self
    }
}

impl<F> IntoListener for F
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn into_listener(self) -> Listener {
        Listener::new(self)
    }
}
