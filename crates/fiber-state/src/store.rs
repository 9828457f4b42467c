//! Attribute storage shared by every container type

use crate::options::Options;
use fiber_events::Emitter;
use fiber_value::AttrMap;

/// Attributes, options and the event channel of one container
///
/// # Invariants
/// - `attributes` is only ever replaced wholesale, so snapshots handed out
///   earlier stay valid
/// - cloning gives an independent store: same attributes and options, a
///   fresh emitter with the same naming and bus but no listeners
#[derive(Debug)]
pub struct AttributeStore {
    attributes: AttrMap,
    options: Options,
    emitter: Emitter,
}

impl AttributeStore {
    /// Create store; the emitter is built from `options`
    #[must_use]
    pub fn new(attributes: AttrMap, options: Options) -> Self {
        let emitter = options.emitter();
        Self {
            attributes,
            options,
            emitter,
        }
    }

    /// Current attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    /// Options snapshot
    #[inline]
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Event channel
    #[inline]
    #[must_use]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Store holding `attributes` with this store's options and naming
    #[must_use]
    pub fn derive(&self, attributes: AttrMap) -> Self {
        let emitter = Emitter::new()
            .with_namespace(self.emitter.namespace())
            .with_catalog(self.emitter.catalog())
            .with_broadcast(self.emitter.broadcast_bus());
        Self {
            attributes,
            options: self.options.clone(),
            emitter,
        }
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttrMap {
        &mut self.attributes
    }

    pub(crate) fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Swap in new attributes, returning the previous ones
    pub(crate) fn replace(&mut self, attributes: AttrMap) -> AttrMap {
        std::mem::replace(&mut self.attributes, attributes)
    }

    /// Drop attributes and options
    pub(crate) fn clear(&mut self) {
        self.attributes = AttrMap::new();
        self.options = Options::default();
    }
}

impl Clone for AttributeStore {
    fn clone(&self) -> Self {
        self.derive(self.attributes.clone())
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new(AttrMap::new(), Options::default())
    }
}
