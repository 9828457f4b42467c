//! Persistent ordered attribute map
//!
//! Provides [`AttrMap`], an immutable `String -> Value` map with structural
//! sharing. Lookups go through an `im::HashMap`; iteration order (insertion
//! order, or whatever order a transform produced) is kept in an `im::Vector`.

use crate::error::ValueError;
use crate::path::{Key, KeyPath};
use crate::value::Value;
use im::{HashMap, Vector};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::{self, Debug, Formatter};

/// Immutable ordered map of attributes
///
/// # Invariants
/// - every key in `order` is present in `entries` exactly once, and the
///   reverse
/// - cloning is O(1); clones share structure until one of them is modified
#[derive(Clone, Default)]
pub struct AttrMap {
    entries: HashMap<String, Value>,
    order: Vector<String>,
}

impl AttrMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if map has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Flat lookup
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Flat presence check (independent of the stored value)
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert in place, keeping the position of an existing key
    ///
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let previous = self.entries.insert(key.clone(), value.into());
        if previous.is_none() {
            self.order.push_back(key);
        }
        previous
    }

    /// Remove in place, returning the previous value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let previous = self.entries.remove(key)?;
        if let Some(index) = self.order.iter().position(|k| k == key) {
            self.order.remove(index);
        }
        Some(previous)
    }

    /// New map with `key` set
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    /// New map without `key`
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.remove(key);
        next
    }

    /// Iterate entries in order
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            order: self.order.iter(),
            entries: &self.entries,
        }
    }

    /// Iterate keys in order
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Iterate values in order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Value> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Shallow merge: colliding keys take the value from `other`
    #[must_use]
    pub fn merge(&self, other: &AttrMap) -> Self {
        let mut next = self.clone();
        for (key, value) in other {
            next.insert(key, value.clone());
        }
        next
    }

    /// Deep merge: colliding maps merge recursively, anything else takes the
    /// value from `other`
    #[must_use]
    pub fn merge_deep(&self, other: &AttrMap) -> Self {
        let mut next = self.clone();
        for (key, value) in other {
            let merged = match next.get(key) {
                Some(current) => current.merge_deep(value),
                None => value.clone(),
            };
            next.insert(key, merged);
        }
        next
    }

    /// Nested lookup
    #[must_use]
    pub fn get_in(&self, path: &KeyPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.get(first)?, |current, segment| current.child(segment))
    }

    /// Nested presence check
    #[inline]
    #[must_use]
    pub fn contains_path(&self, path: &KeyPath) -> bool {
        self.get_in(path).is_some()
    }

    /// New map with a nested value set, creating intermediate maps or lists
    #[must_use]
    pub fn with_in(&self, path: &KeyPath, value: impl Into<Value>) -> Self {
        self.with_in_segments(path.segments(), value.into())
    }

    /// New map with a nested value removed
    #[must_use]
    pub fn without_in(&self, path: &KeyPath) -> Self {
        self.without_in_segments(path.segments())
    }

    /// New map with the nested value replaced by `f(current)`
    #[must_use]
    pub fn update_in(&self, path: &KeyPath, f: impl FnOnce(Option<&Value>) -> Value) -> Self {
        let next = f(self.get_in(path));
        self.with_in(path, next)
    }

    pub(crate) fn with_in_segments(&self, path: &[String], value: Value) -> Self {
        let Some((first, rest)) = path.split_first() else {
            return self.clone();
        };
        let current = self.get(first).cloned().unwrap_or_default();
        self.with(first.clone(), current.with_in(rest, value))
    }

    pub(crate) fn without_in_segments(&self, path: &[String]) -> Self {
        match path.split_first() {
            None => self.clone(),
            Some((first, [])) => self.without(first),
            Some((first, rest)) => match self.get(first) {
                Some(child) => self.with(first.clone(), child.without_in(rest)),
                None => self.clone(),
            },
        }
    }

    /// Lookup by flat-or-path key
    #[must_use]
    pub fn get_key(&self, key: &Key) -> Option<&Value> {
        match key {
            Key::Flat(key) => self.get(key),
            Key::Path(path) => self.get_in(path),
        }
    }

    /// Presence by flat-or-path key
    #[must_use]
    pub fn has_key(&self, key: &Key) -> bool {
        match key {
            Key::Flat(key) => self.contains_key(key),
            Key::Path(path) => self.contains_path(path),
        }
    }

    /// Assignment by flat-or-path key
    #[must_use]
    pub fn with_key(&self, key: &Key, value: impl Into<Value>) -> Self {
        match key {
            Key::Flat(key) => self.with(key.clone(), value),
            Key::Path(path) => self.with_in(path, value),
        }
    }

    /// Removal by flat-or-path key
    #[must_use]
    pub fn without_key(&self, key: &Key) -> Self {
        match key {
            Key::Flat(key) => self.without(key),
            Key::Path(path) => self.without_in(path),
        }
    }

    /// Same entries in reverse order
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            order: self.order.iter().rev().cloned().collect(),
        }
    }

    /// First `count` entries
    #[must_use]
    pub fn take(&self, count: usize) -> Self {
        self.iter()
            .take(count)
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    /// All entries except the first `count`
    #[must_use]
    pub fn skip(&self, count: usize) -> Self {
        self.iter()
            .skip(count)
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    /// Lift nested map and list entries into this level
    ///
    /// Nested maps contribute their keys, nested lists their indices; later
    /// keys overwrite earlier ones. `depth` limits how many levels are
    /// lifted (`None` flattens completely, `Some(0)` changes nothing).
    #[must_use]
    pub fn flatten(&self, depth: Option<usize>) -> Self {
        fn lift<'a>(
            out: &mut AttrMap,
            entries: &mut dyn Iterator<Item = (String, &'a Value)>,
            level: usize,
            depth: Option<usize>,
        ) {
            let descend = depth.map_or(true, |limit| level < limit);
            for (key, value) in entries {
                match value {
                    Value::Map(map) if descend => lift(
                        out,
                        &mut map.iter().map(|(k, v)| (k.to_string(), v)),
                        level + 1,
                        depth,
                    ),
                    Value::List(items) if descend => lift(
                        out,
                        &mut items.iter().enumerate().map(|(i, v)| (i.to_string(), v)),
                        level + 1,
                        depth,
                    ),
                    other => {
                        out.insert(key, other.clone());
                    }
                }
            }
        }

        let mut out = Self::new();
        lift(
            &mut out,
            &mut self.iter().map(|(k, v)| (k.to_string(), v)),
            0,
            depth,
        );
        out
    }

    /// Deep conversion to a plain JSON object
    #[must_use]
    pub fn to_plain(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_plain()))
                .collect(),
        )
    }

    /// Deep conversion from a plain JSON object
    ///
    /// # Errors
    /// Returns [`ValueError::NotAnObject`] if `plain` is not an object
    pub fn from_plain(plain: serde_json::Value) -> Result<Self, ValueError> {
        match Value::from_plain(plain) {
            Value::Map(map) => Ok(map),
            other => Err(ValueError::NotAnObject {
                found: other.kind(),
            }),
        }
    }

    /// Parse a JSON object string
    ///
    /// # Errors
    /// Returns error if the text is not valid JSON or not an object
    pub fn from_json_str(text: &str) -> Result<Self, ValueError> {
        let plain: serde_json::Value = serde_json::from_str(text)?;
        Self::from_plain(plain)
    }

    pub(crate) fn from_map_access<'de, A: MapAccess<'de>>(mut access: A) -> Result<Self, A::Error> {
        let mut map = Self::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl PartialEq for AttrMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Debug for AttrMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttrMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for AttrMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for AttrMap {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl TryFrom<serde_json::Value> for AttrMap {
    type Error = ValueError;

    fn try_from(plain: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_plain(plain)
    }
}

impl<'a> IntoIterator for &'a AttrMap {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered iterator over an [`AttrMap`]
pub struct Iter<'a> {
    order: im::vector::Iter<'a, String>,
    entries: &'a HashMap<String, Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.order.next()?;
        self.entries.get(key).map(|value| (key.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let key = self.order.next_back()?;
        self.entries.get(key).map(|value| (key.as_str(), value))
    }
}

impl Serialize for AttrMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct AttrMapVisitor;

impl<'de> Visitor<'de> for AttrMapVisitor {
    type Value = AttrMap;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a map of attributes")
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<AttrMap, A::Error> {
        AttrMap::from_map_access(access)
    }
}

impl<'de> Deserialize<'de> for AttrMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttrMapVisitor)
    }
}
