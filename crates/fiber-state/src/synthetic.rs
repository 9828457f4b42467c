//! Attribute container capability
//!
//! [`Synthetic`] provides the whole container API on top of an
//! [`AttributeStore`]: path-aware reads, notified writes, bulk transforms
//! that build siblings through [`Replicate`], and plain/JSON projection.
//!
//! # Write pipeline
//!
//! Every write computes the next map, passes it through the type's
//! `prepare` hook (validation for models), then fires in order:
//! `<op-before>`, `changing`, swap, `on_changed` hook, `changed`,
//! `<op-after>`. A rejected write fires nothing and changes nothing, and
//! so does a write that `prepare` filters down to the current attributes.
//!
//! This trait is **sealed**: it is implemented by [`Collection`], [`State`]
//! and [`Model`] only.
//!
//! [`Collection`]: crate::Collection
//! [`State`]: crate::State
//! [`Model`]: crate::Model

use crate::error::StateError;
use crate::options::Options;
use crate::store::AttributeStore;
use fiber_events::Emitter;
use fiber_value::{AttrMap, Key, Value};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

/// Builds a sibling of the same concrete type from derived attributes
///
/// Bulk transforms (`map`, `filter`, `sort`, ...) return `Self` through this
/// trait, so a filtered `Model` is still a `Model`.
pub trait Replicate: Sized {
    /// Create a sibling holding `attributes`
    ///
    /// # Errors
    /// Returns error if the attributes are not acceptable for this type
    fn replicate(&self, attributes: AttrMap) -> Result<Self, StateError>;
}

/// Write operation, named by its before/after event pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `set`, `set_many`
    Set,
    /// `forget`
    Forget,
    /// `merge`, `merge_deep`
    Merge,
    /// `update`
    Update,
    /// `mutate`
    Mutate,
    /// `reset`, `set_size`, `from_plain`
    Reset,
    /// `flush`
    Flush,
}

impl Operation {
    /// Event fired before the change
    #[must_use]
    pub fn before(self) -> &'static str {
        match self {
            Self::Set => "setting",
            Self::Forget => "forgetting",
            Self::Merge => "merging",
            Self::Update => "updating",
            Self::Mutate => "mutating",
            Self::Reset => "resetting",
            Self::Flush => "flushing",
        }
    }

    /// Event fired after the change
    #[must_use]
    pub fn after(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Forget => "forgot",
            Self::Merge => "merged",
            Self::Update => "updated",
            Self::Mutate => "mutated",
            Self::Reset => "reset",
            Self::Flush => "flushed",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.after())
    }
}

/// Event fired around every swap
pub const CHANGING: &str = "changing";
/// Event fired after every swap
pub const CHANGED: &str = "changed";
/// Event fired by `destroy`
pub const DESTROYING: &str = "destroying";

mod private {
    use super::{AttributeStore, StateError};
    use fiber_value::AttrMap;

    /// Sealed trait marker with the raw store access
    #[allow(unreachable_pub)]
    pub trait Sealed {
        fn store(&self) -> &AttributeStore;

        fn store_mut(&mut self) -> &mut AttributeStore;

        /// Filter or validate attributes before they are committed
        fn prepare(&self, attributes: AttrMap) -> Result<AttrMap, StateError> {
            Ok(attributes)
        }

        /// Runs after the swap, before `changed` fires
        fn on_changed(&mut self, _current: &AttrMap, _previous: &AttrMap) {}
    }
}

pub(crate) use private::Sealed;

fn commit<S: Synthetic>(
    this: &mut S,
    op: Operation,
    key: Value,
    value: Value,
    next: AttrMap,
) -> Result<(), StateError> {
    let prepared = this.prepare(next.clone())?;
    let previous = this.store().attributes().clone();
    if prepared != next && prepared == previous {
        tracing::debug!("{} {}: write filtered out", S::KIND, op);
        return Ok(());
    }
    let next = prepared;
    let emitter = this.emitter().clone();

    emitter.fire(op.before(), vec![key.clone(), value.clone()]);
    emitter.fire(
        CHANGING,
        vec![Value::Map(next.clone()), Value::Map(previous.clone())],
    );
    this.store_mut().replace(next);
    let current = this.store().attributes().clone();
    this.on_changed(&current, &previous);
    tracing::debug!(
        "{} {}: {} -> {} attributes",
        S::KIND,
        op,
        previous.len(),
        current.len()
    );
    emitter.fire(CHANGED, vec![Value::Map(current), Value::Map(previous)]);
    emitter.fire(op.after(), vec![key, value]);
    Ok(())
}

fn collect_entries(attributes: &AttrMap) -> Vec<(String, Value)> {
    attributes
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Attribute container
///
/// All writes take `&mut self` and return `Result<&mut Self, _>` so calls
/// can be chained with `?`. Reads never fail: missing keys and type
/// mismatches resolve to `None` or the given default.
pub trait Synthetic: Replicate + Sealed {
    /// Container kind, used in diagnostics
    const KIND: &'static str;

    /// Event channel of this container
    #[inline]
    fn emitter(&self) -> &Emitter {
        self.store().emitter()
    }

    /// Options snapshot
    #[inline]
    fn options(&self) -> &Options {
        self.store().options()
    }

    /// Whole attribute map (cheap, shares structure)
    #[inline]
    fn snapshot(&self) -> AttrMap {
        self.store().attributes().clone()
    }

    /// Value at a flat or path key
    fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.store().attributes().get_key(&key.into())
    }

    /// Value at a flat or path key, or `default`
    fn get_or(&self, key: impl Into<Key>, default: impl Into<Value>) -> Value {
        self.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Whether the key is present, whatever its value
    fn has(&self, key: impl Into<Key>) -> bool {
        self.store().attributes().has_key(&key.into())
    }

    /// Assign at a flat or path key, creating intermediates
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn set(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, StateError> {
        let key = key.into();
        let value = value.into();
        let next = self.store().attributes().with_key(&key, value.clone());
        commit(self, Operation::Set, Value::from(key.to_string()), value, next)?;
        Ok(self)
    }

    /// Deep-merge a partial map (single-argument `set`)
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn set_many(&mut self, partial: impl Into<AttrMap>) -> Result<&mut Self, StateError> {
        let partial = partial.into();
        let next = self.store().attributes().merge_deep(&partial);
        commit(self, Operation::Set, Value::Null, Value::Map(partial), next)?;
        Ok(self)
    }

    /// Remove a key, returning its previous value
    ///
    /// Removing a list element through a path leaves a hole so sibling
    /// indices keep their positions.
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn forget(&mut self, key: impl Into<Key>) -> Result<Option<Value>, StateError> {
        let key = key.into();
        let previous = self.store().attributes().get_key(&key).cloned();
        let next = self.store().attributes().without_key(&key);
        commit(
            self,
            Operation::Forget,
            Value::from(key.to_string()),
            previous.clone().unwrap_or_default(),
            next,
        )?;
        Ok(previous)
    }

    /// Shallow merge; colliding keys take the incoming value
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn merge(&mut self, other: impl Into<AttrMap>) -> Result<&mut Self, StateError> {
        let other = other.into();
        let next = self.store().attributes().merge(&other);
        commit(self, Operation::Merge, Value::Null, Value::Map(other), next)?;
        Ok(self)
    }

    /// Deep merge; colliding maps merge recursively
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn merge_deep(&mut self, other: impl Into<AttrMap>) -> Result<&mut Self, StateError> {
        let other = other.into();
        let next = self.store().attributes().merge_deep(&other);
        commit(self, Operation::Merge, Value::Null, Value::Map(other), next)?;
        Ok(self)
    }

    /// Replace the value at `key` with `f(current)`
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn update(
        &mut self,
        key: impl Into<Key>,
        f: impl FnOnce(Option<&Value>) -> Value,
    ) -> Result<&mut Self, StateError> {
        let key = key.into();
        let value = f(self.store().attributes().get_key(&key));
        let next = self.store().attributes().with_key(&key, value.clone());
        commit(self, Operation::Update, Value::from(key.to_string()), value, next)?;
        Ok(self)
    }

    /// Apply several edits to a working copy, committed once
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn mutate(&mut self, f: impl FnOnce(&mut AttrMap)) -> Result<&mut Self, StateError> {
        let mut draft = self.snapshot();
        f(&mut draft);
        commit(self, Operation::Mutate, Value::Null, Value::Null, draft)?;
        Ok(self)
    }

    /// Replace all attributes
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn reset(&mut self, attributes: impl Into<AttrMap>) -> Result<&mut Self, StateError> {
        let next = attributes.into();
        commit(self, Operation::Reset, Value::Null, Value::Map(next.clone()), next)?;
        Ok(self)
    }

    /// Remove all attributes
    ///
    /// # Errors
    /// Returns error if an empty map is rejected by the container type
    fn flush(&mut self) -> Result<&mut Self, StateError> {
        commit(self, Operation::Flush, Value::Null, Value::Null, AttrMap::new())?;
        Ok(self)
    }

    /// Number of top-level entries
    #[inline]
    fn size(&self) -> usize {
        self.store().attributes().len()
    }

    /// Keep only the first `size` entries
    ///
    /// # Errors
    /// Returns error if the result is rejected by the container type
    fn set_size(&mut self, size: usize) -> Result<&mut Self, StateError> {
        let next = self.store().attributes().take(size);
        commit(self, Operation::Reset, Value::Null, Value::from(size), next)?;
        Ok(self)
    }

    /// Whether there are no entries
    #[inline]
    fn is_empty(&self) -> bool {
        self.store().attributes().is_empty()
    }

    /// Top-level keys in order
    fn keys(&self) -> Vec<String> {
        self.store().attributes().keys().map(str::to_string).collect()
    }

    /// Top-level values in order
    fn values(&self) -> Vec<Value> {
        self.store().attributes().values().cloned().collect()
    }

    /// Top-level entries in order
    fn entries(&self) -> Vec<(String, Value)> {
        collect_entries(self.store().attributes())
    }

    /// Values joined with `separator`
    fn join(&self, separator: &str) -> String {
        self.store()
            .attributes()
            .values()
            .map(Value::to_key_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Visit entries until `f` returns `false`; returns how many were
    /// visited
    fn for_each(&self, mut f: impl FnMut(&str, &Value) -> bool) -> usize {
        let mut visited = 0;
        for (key, value) in self.store().attributes() {
            visited += 1;
            if !f(key, value) {
                break;
            }
        }
        visited
    }

    /// Sibling with every value mapped
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn map(&self, f: impl Fn(&str, &Value) -> Value) -> Result<Self, StateError> {
        self.replicate(
            self.store()
                .attributes()
                .iter()
                .map(|(k, v)| (k, f(k, v)))
                .collect(),
        )
    }

    /// Sibling with every key mapped
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn map_keys(&self, f: impl Fn(&str, &Value) -> String) -> Result<Self, StateError> {
        self.replicate(
            self.store()
                .attributes()
                .iter()
                .map(|(k, v)| (f(k, v), v.clone()))
                .collect(),
        )
    }

    /// Sibling with every entry mapped
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn map_entries(
        &self,
        f: impl Fn(&str, &Value) -> (String, Value),
    ) -> Result<Self, StateError> {
        self.replicate(self.store().attributes().iter().map(|(k, v)| f(k, v)).collect())
    }

    /// Sibling with the entries matching `predicate`
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn filter(&self, predicate: impl Fn(&str, &Value) -> bool) -> Result<Self, StateError> {
        self.replicate(
            self.store()
                .attributes()
                .iter()
                .filter(|(k, v)| predicate(k, v))
                .map(|(k, v)| (k, v.clone()))
                .collect(),
        )
    }

    /// Sibling without the entries matching `predicate`
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn filter_not(&self, predicate: impl Fn(&str, &Value) -> bool) -> Result<Self, StateError> {
        self.filter(|k, v| !predicate(k, v))
    }

    /// Sibling with entries in natural value order
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn sort(&self) -> Result<Self, StateError> {
        self.sort_with(Value::compare)
    }

    /// Sibling with entries ordered by `comparator` on values
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn sort_with(
        &self,
        mut comparator: impl FnMut(&Value, &Value) -> Ordering,
    ) -> Result<Self, StateError> {
        let mut entries = collect_entries(self.store().attributes());
        entries.sort_by(|(_, a), (_, b)| comparator(a, b));
        self.replicate(entries.into_iter().collect())
    }

    /// Sibling with entries ordered by a derived value
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn sort_by(&self, mapper: impl Fn(&str, &Value) -> Value) -> Result<Self, StateError> {
        let mut entries: Vec<_> = collect_entries(self.store().attributes())
            .into_iter()
            .map(|(k, v)| (mapper(&k, &v), k, v))
            .collect();
        entries.sort_by(|(a, _, _), (b, _, _)| a.compare(b));
        self.replicate(entries.into_iter().map(|(_, k, v)| (k, v)).collect())
    }

    /// Sibling mapping each group name to the entries in that group
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn group_by(&self, grouper: impl Fn(&str, &Value) -> Value) -> Result<Self, StateError> {
        let mut groups = AttrMap::new();
        for (key, value) in self.store().attributes() {
            let group = grouper(key, value).to_key_string();
            let members = match groups.get(&group) {
                Some(Value::Map(members)) => members.with(key, value.clone()),
                _ => AttrMap::from([(key, value.clone())]),
            };
            groups.insert(group, members);
        }
        self.replicate(groups)
    }

    /// Sibling with entries in reverse order
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn reverse(&self) -> Result<Self, StateError> {
        self.replicate(self.store().attributes().reversed())
    }

    /// Sibling without the first entry
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn rest(&self) -> Result<Self, StateError> {
        self.skip(1)
    }

    /// Sibling without the last entry
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn but_last(&self) -> Result<Self, StateError> {
        self.take(self.size().saturating_sub(1))
    }

    /// Sibling without the first `count` entries
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn skip(&self, count: usize) -> Result<Self, StateError> {
        self.replicate(self.store().attributes().skip(count))
    }

    /// Sibling with the first `count` entries
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn take(&self, count: usize) -> Result<Self, StateError> {
        self.replicate(self.store().attributes().take(count))
    }

    /// Sibling with nested entries lifted (see [`AttrMap::flatten`])
    ///
    /// # Errors
    /// Returns error if the sibling cannot be replicated
    fn flatten(&self, depth: Option<usize>) -> Result<Self, StateError> {
        self.replicate(self.store().attributes().flatten(depth))
    }

    /// Fold entries in order
    fn reduce<T>(&self, initial: T, mut f: impl FnMut(T, &str, &Value) -> T) -> T {
        self.store()
            .attributes()
            .iter()
            .fold(initial, |acc, (k, v)| f(acc, k, v))
    }

    /// Whether every entry matches
    fn every(&self, predicate: impl Fn(&str, &Value) -> bool) -> bool {
        self.store().attributes().iter().all(|(k, v)| predicate(k, v))
    }

    /// Whether any entry matches
    fn some(&self, predicate: impl Fn(&str, &Value) -> bool) -> bool {
        self.store().attributes().iter().any(|(k, v)| predicate(k, v))
    }

    /// First matching value
    fn find(&self, predicate: impl Fn(&str, &Value) -> bool) -> Option<Value> {
        self.find_entry(predicate).map(|(_, v)| v)
    }

    /// First matching entry
    fn find_entry(&self, predicate: impl Fn(&str, &Value) -> bool) -> Option<(String, Value)> {
        self.store()
            .attributes()
            .iter()
            .find(|(k, v)| predicate(k, v))
            .map(|(k, v)| (k.to_string(), v.clone()))
    }

    /// Key of the first matching entry
    fn find_key(&self, predicate: impl Fn(&str, &Value) -> bool) -> Option<String> {
        self.find_entry(predicate).map(|(k, _)| k)
    }

    /// Key of the first entry equal to `search`
    fn key_of(&self, search: &Value) -> Option<String> {
        self.find_key(|_, v| v == search)
    }

    /// Deep plain projection; hidden top-level keys are omitted
    fn to_plain(&self) -> serde_json::Value {
        let options = self.options();
        serde_json::Value::Object(
            self.store()
                .attributes()
                .iter()
                .filter(|(k, _)| !options.is_hidden(k))
                .map(|(k, v)| (k.to_string(), v.to_plain()))
                .collect(),
        )
    }

    /// Plain projection as JSON text
    ///
    /// # Errors
    /// Returns error if encoding fails
    fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string(&self.to_plain())?)
    }

    /// Reset from plain data
    ///
    /// # Errors
    /// Returns error if `plain` is not an object or is rejected
    fn from_plain(&mut self, plain: serde_json::Value) -> Result<&mut Self, StateError> {
        let attributes = AttrMap::from_plain(plain)?;
        self.reset(attributes)
    }

    /// Reset from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a JSON object or is rejected
    fn from_serialized(&mut self, text: &str) -> Result<&mut Self, StateError> {
        let attributes = AttrMap::from_json_str(text)?;
        self.reset(attributes)
    }

    /// Hide top-level keys from plain output
    fn mark_as_hidden<I, K>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let options = self.store_mut().options_mut();
        for key in keys {
            let key = key.into();
            if !options.hidden.contains(&key) {
                options.hidden.push(key);
            }
        }
        self
    }

    /// Show previously hidden keys again
    fn mark_as_visible<I, K>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let visible: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.store_mut()
            .options_mut()
            .hidden
            .retain(|key| !visible.contains(key));
        self
    }

    /// Value equality with another container
    fn same_as<O: Synthetic>(&self, other: &O) -> bool {
        self.store().attributes() == other.store().attributes()
    }

    /// Fire `destroying`, drop every subscription and listener, clear
    /// attributes and options
    ///
    /// The container stays usable afterwards, empty.
    fn destroy(&mut self) {
        let emitter = self.emitter().clone();
        emitter.fire(DESTROYING, vec![Value::Map(self.snapshot())]);
        emitter.destroy();
        self.store_mut().clear();
        tracing::debug!("{} destroyed", Self::KIND);
    }
}

/// Serialize as the plain projection, display as JSON text
macro_rules! impl_projection {
    ($($ty:ty),* $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serde::Serialize::serialize(&Synthetic::to_plain(self), serializer)
                }
            }

            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    let text = Synthetic::to_json(self).map_err(|_| fmt::Error)?;
                    f.write_str(&text)
                }
            }
        )*
    };
}

impl_projection!(crate::Collection, crate::State, crate::Model);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Collection;
    use serde_json::json;

    #[test]
    fn containers_serialize_as_plain() {
        let mut collection = Collection::new(AttrMap::from([("a", 1), ("b", 2)]));
        collection.mark_as_hidden(["b"]);
        assert_eq!(serde_json::to_value(&collection).unwrap(), json!({"a": 1}));
        assert_eq!(collection.to_string(), r#"{"a":1}"#);
    }

    #[test]
    fn operation_event_pairs() {
        let pairs: Vec<_> = [
            Operation::Set,
            Operation::Forget,
            Operation::Merge,
            Operation::Update,
            Operation::Mutate,
            Operation::Reset,
            Operation::Flush,
        ]
        .iter()
        .map(|op| (op.before(), op.after()))
        .collect();

        assert_eq!(
            pairs,
            vec![
                ("setting", "set"),
                ("forgetting", "forgot"),
                ("merging", "merged"),
                ("updating", "updated"),
                ("mutating", "mutated"),
                ("resetting", "reset"),
                ("flushing", "flushed"),
            ]
        );
    }

    #[test]
    fn operation_displays_after_name() {
        assert_eq!(Operation::Forget.to_string(), "forgot");
    }
}
