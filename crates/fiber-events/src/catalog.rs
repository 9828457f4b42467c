//! Event alias catalog
//!
//! Provides [`Catalog`] for mapping short event names to their emitted form.

use fiber_value::{AttrMap, Key, Value};
use serde::{Deserialize, Serialize};

/// Catalog of event aliases
///
/// Aliases may be nested; a nested alias is addressed by dotted path, so
/// `{"model": {"saved": "model:saved"}}` resolves `"model.saved"`.
/// Only non-empty string entries count as aliases.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    aliases: AttrMap,
}

impl Catalog {
    /// Create new empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias, returning the updated catalog
    ///
    /// `name` may be a dotted path to register a nested alias.
    #[must_use]
    pub fn with_alias(mut self, name: &str, alias: impl Into<String>) -> Self {
        self.register(name, alias);
        self
    }

    /// Register an alias in place
    pub fn register(&mut self, name: &str, alias: impl Into<String>) {
        self.aliases = self.aliases.with_key(&Key::from(name), alias.into());
    }

    /// Remove an alias
    pub fn remove(&mut self, name: &str) -> bool {
        let key = Key::from(name);
        let present = self.aliases.has_key(&key);
        self.aliases = self.aliases.without_key(&key);
        present
    }

    /// Look up the alias for `name`
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.aliases
            .get_key(&Key::from(name))
            .and_then(Value::as_str)
            .filter(|alias| !alias.is_empty())
    }

    /// Check if `name` has an alias
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Number of top-level entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Check if catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Underlying alias tree
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &AttrMap {
        &self.aliases
    }
}

impl From<AttrMap> for Catalog {
    fn from(aliases: AttrMap) -> Self {
        Self { aliases }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, alias) in iter {
            catalog.register(&name.into(), alias);
        }
        catalog
    }
}
