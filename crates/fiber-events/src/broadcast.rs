//! Broadcast bus
//!
//! Lets emitters listen for events without knowing which object fires them.

use crate::emitter::Emitter;
use fiber_value::Value;
use once_cell::sync::Lazy;

static GLOBAL: Lazy<Broadcast> = Lazy::new(Broadcast::new);

/// Shared event bus
///
/// [`Broadcast::global`] is the process-wide default every [`Emitter::new`]
/// attaches to; [`Broadcast::new`] builds an isolated bus for injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    emitter: Emitter,
}

impl Broadcast {
    /// Create an isolated bus
    #[must_use]
    pub fn new() -> Self {
        Self {
            emitter: Emitter::detached(),
        }
    }

    /// Process-wide bus, created on first use
    #[must_use]
    pub fn global() -> &'static Broadcast {
        &GLOBAL
    }

    pub(crate) fn from_emitter(emitter: Emitter) -> Self {
        Self { emitter }
    }

    /// Emitter backing the bus
    #[inline]
    #[must_use]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Fire an event on the bus
    pub fn fire(&self, name: &str, args: Vec<Value>) {
        self.emitter.fire(name, args);
    }

    /// Drop every listener on the bus; returns how many were dropped
    pub fn clear(&self) -> usize {
        let dropped = self.emitter.clear_listeners();
        tracing::debug!("Broadcast {} cleared {} listeners", self.emitter.id(), dropped);
        dropped
    }

    /// Number of listeners on the bus
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count(None)
    }

    /// Whether both handles point to the same bus
    #[inline]
    #[must_use]
    pub fn same_bus(&self, other: &Broadcast) -> bool {
        self.emitter == other.emitter
    }
}

impl Default for Broadcast {
    fn default() -> Self {
        Self::new()
    }
}
