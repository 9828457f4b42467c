//! Guarded attribute container
//!
//! [`State`] has the same behavior as [`Collection`](crate::Collection)
//! but no raw access: every change goes through the [`Synthetic`] write
//! pipeline and is announced.
//!
//! ```compile_fail
//! use fiber_state::State;
//!
//! let mut state = State::new(fiber_value::AttrMap::new());
//! state.attributes_mut().insert("a", 1);
//! ```

use crate::collection::Collection;
use crate::error::StateError;
use crate::options::Options;
use crate::store::AttributeStore;
use crate::synthetic::{Replicate, Sealed, Synthetic};
use fiber_value::AttrMap;

/// Attribute container without raw write access
#[derive(Debug, Clone, Default)]
pub struct State {
    store: AttributeStore,
}

impl State {
    /// Create with default options
    #[must_use]
    pub fn new(attributes: impl Into<AttrMap>) -> Self {
        Self::with_options(attributes, Options::default())
    }

    /// Create with the given options
    #[must_use]
    pub fn with_options(attributes: impl Into<AttrMap>, options: Options) -> Self {
        Self::from_store(AttributeStore::new(attributes.into(), options))
    }

    pub(crate) fn from_store(store: AttributeStore) -> Self {
        Self { store }
    }

    /// Already guarded; returns itself
    #[inline]
    #[must_use]
    pub fn guard(self) -> Self {
        self
    }
}

impl Sealed for State {
    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }
}

impl Replicate for State {
    fn replicate(&self, attributes: AttrMap) -> Result<Self, StateError> {
        Ok(Self::from_store(self.store.derive(attributes)))
    }
}

impl Synthetic for State {
    const KIND: &'static str = "state";
}

impl From<Collection> for State {
    fn from(collection: Collection) -> Self {
        collection.guard()
    }
}

impl From<AttrMap> for State {
    fn from(attributes: AttrMap) -> Self {
        Self::new(attributes)
    }
}
