//! Subscription selectors for `off`

use crate::emitter::Emitter;
use crate::listener::{EmitterId, Listener, Scope};

/// Partial match over subscriptions
///
/// Every criterion left unset matches anything, so `Selector::new()` selects
/// every subscription the emitter holds.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub(crate) source: Option<Emitter>,
    pub(crate) event: Option<String>,
    pub(crate) listener: Option<Listener>,
    pub(crate) scope: Option<Scope>,
}

impl Selector {
    /// Select everything
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only subscriptions on `source`
    #[must_use]
    pub fn source(mut self, source: &Emitter) -> Self {
        self.source = Some(source.clone());
        self
    }

    /// Only subscriptions to `event` (resolved by the source's naming,
    /// space-separated names allowed)
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Only subscriptions with this listener's callback
    #[must_use]
    pub fn listener(mut self, listener: &Listener) -> Self {
        self.listener = Some(listener.clone());
        self
    }

    /// Only subscriptions in `scope`
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub(crate) fn matches_source(&self, id: EmitterId) -> bool {
        self.source.as_ref().map_or(true, |source| source.id() == id)
    }

    pub(crate) fn matches_listener(&self, listener: &Listener) -> bool {
        let same_callback = self
            .listener
            .as_ref()
            .map_or(true, |wanted| wanted.same_callback(listener));
        let same_scope = self
            .scope
            .map_or(true, |wanted| listener.scope() == Some(wanted));
        same_callback && same_scope
    }
}
