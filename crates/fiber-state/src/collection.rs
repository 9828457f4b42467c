//! Open attribute container
//!
//! A [`Collection`] accepts any keys. Besides the [`Synthetic`] API it
//! exposes its raw map so trusted code can edit attributes without
//! notifying listeners; [`Collection::guard`] turns it into a [`State`]
//! that cannot.

use crate::error::StateError;
use crate::options::Options;
use crate::state::State;
use crate::store::AttributeStore;
use crate::synthetic::{Replicate, Sealed, Synthetic};
use fiber_value::AttrMap;

/// Unvalidated attribute container
#[derive(Debug, Clone, Default)]
pub struct Collection {
    store: AttributeStore,
}

impl Collection {
    /// Create with default options
    #[must_use]
    pub fn new(attributes: impl Into<AttrMap>) -> Self {
        Self::with_options(attributes, Options::default())
    }

    /// Create with the given options
    #[must_use]
    pub fn with_options(attributes: impl Into<AttrMap>, options: Options) -> Self {
        Self {
            store: AttributeStore::new(attributes.into(), options),
        }
    }

    /// Raw attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &AttrMap {
        self.store.attributes()
    }

    /// Raw attributes, mutable; edits made here fire no events
    #[inline]
    pub fn attributes_mut(&mut self) -> &mut AttrMap {
        self.store.attributes_mut()
    }

    /// Convert into a [`State`], keeping attributes, options and listeners
    #[must_use]
    pub fn guard(self) -> State {
        State::from_store(self.store)
    }
}

impl Sealed for Collection {
    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }
}

impl Replicate for Collection {
    fn replicate(&self, attributes: AttrMap) -> Result<Self, StateError> {
        Ok(Self {
            store: self.store.derive(attributes),
        })
    }
}

impl Synthetic for Collection {
    const KIND: &'static str = "collection";
}

impl From<AttrMap> for Collection {
    fn from(attributes: AttrMap) -> Self {
        Self::new(attributes)
    }
}

impl TryFrom<serde_json::Value> for Collection {
    type Error = StateError;

    fn try_from(plain: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(Self::new(AttrMap::from_plain(plain)?))
    }
}
