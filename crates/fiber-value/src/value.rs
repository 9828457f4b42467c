//! Attribute values
//!
//! Provides [`Value`], the closed set of data an [`AttrMap`] can hold, and its
//! deep conversion to and from plain `serde_json` data.

use crate::map::AttrMap;
use im::Vector;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

/// Largest number of `Null` slots a single write may pad a list with
pub const MAX_LIST_GAP: usize = 1024;

/// Segment as a list position writable on a list of length `len`
fn list_index(segment: &str, len: usize) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|index| index.saturating_sub(len) <= MAX_LIST_GAP)
}

/// Attribute value
///
/// Lists and maps are persistent collections: cloning a `Value` is cheap and
/// never copies nested data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing or explicit null; also marks a hole left in a list
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Persistent vector
    List(Vector<Value>),
    /// Nested attribute map
    Map(AttrMap),
}

impl Value {
    /// Short type name, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Check for null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean content
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content, integers widened
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String content
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// List content
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Map content
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Step one segment into a map or list
    ///
    /// A list segment must parse as an index; `Null` slots read as absent.
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(segment),
            Self::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .filter(|item| !item.is_null()),
            _ => None,
        }
    }

    /// Persistent nested assignment
    ///
    /// Missing or scalar intermediates become lists when the segment is an
    /// index within [`MAX_LIST_GAP`] of the start and maps otherwise. List
    /// indices past the end are padded with `Null`, at most
    /// [`MAX_LIST_GAP`] slots; a list write beyond that, or through a
    /// non-index segment, leaves the list as is.
    #[must_use]
    pub(crate) fn with_in(&self, path: &[String], value: Value) -> Value {
        let Some((first, rest)) = path.split_first() else {
            return value;
        };

        match self {
            Self::Map(map) => Self::Map(map.with_in_segments(path, value)),
            Self::List(items) => match list_index(first, items.len()) {
                Some(index) => {
                    let mut items = items.clone();
                    let current = items.get(index).cloned().unwrap_or_default();
                    let next = current.with_in(rest, value);
                    if index < items.len() {
                        items.set(index, next);
                    } else {
                        while items.len() < index {
                            items.push_back(Self::Null);
                        }
                        items.push_back(next);
                    }
                    Self::List(items)
                }
                None => self.clone(),
            },
            _ => match list_index(first, 0) {
                Some(_) => Self::List(Vector::new()).with_in(path, value),
                None => Self::Map(AttrMap::new().with_in_segments(path, value)),
            },
        }
    }

    /// Persistent nested removal
    ///
    /// Removing a list element leaves a `Null` hole so sibling indices keep
    /// their positions.
    #[must_use]
    pub(crate) fn without_in(&self, path: &[String]) -> Value {
        let Some((first, rest)) = path.split_first() else {
            return self.clone();
        };

        match self {
            Self::Map(map) => Self::Map(map.without_in_segments(path)),
            Self::List(items) => match first.parse::<usize>() {
                Ok(index) if index < items.len() => {
                    let mut items = items.clone();
                    let next = if rest.is_empty() {
                        Self::Null
                    } else {
                        items[index].without_in(rest)
                    };
                    items.set(index, next);
                    Self::List(items)
                }
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Deep merge: map+map recurses, anything else takes `other`
    #[must_use]
    pub fn merge_deep(&self, other: &Value) -> Value {
        match (self, other) {
            (Self::Map(left), Self::Map(right)) => Self::Map(left.merge_deep(right)),
            _ => other.clone(),
        }
    }

    /// Natural ordering used by default sorts
    ///
    /// `Null < Bool < numbers < Str < List < Map`; integers and floats are
    /// compared exactly, and NaN sorts after every other number.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::List(_) => 4,
                Value::Map(_) => 5,
            }
        }

        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Int(a), Self::Float(b)) => compare_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Self::Float(a), Self::Float(b)) => compare_floats(*a, *b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.compare(y))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Self::Map(a), Self::Map(b)) => a.len().cmp(&b.len()),
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Text used when a value becomes a key or is joined
    ///
    /// Strings are taken verbatim, everything else as compact JSON.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_plain().to_string(),
        }
    }

    /// Deep conversion to plain JSON data
    #[must_use]
    pub fn to_plain(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Str(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_plain).collect()),
            Self::Map(map) => map.to_plain(),
        }
    }

    /// Deep conversion from plain JSON data
    #[must_use]
    pub fn from_plain(plain: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match plain {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .unwrap_or_else(|| Self::Float(n.as_f64().unwrap_or_default())),
            Json::String(s) => Self::Str(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from_plain).collect()),
            Json::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_plain(v)))
                    .collect(),
            ),
        }
    }
}

/// NaN is equal to itself and greater than any other float
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison without widening `i` to `f64`
fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above `i64::MAX`
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() || f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    #[allow(clippy::cast_possible_truncation)]
    let truncated = whole as i64;
    i.cmp(&truncated)
        .then_with(|| 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal))
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Self::Int(i64::from(i))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or(Self::Float(i as f64), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or(Self::Float(i as f64), Self::Int)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Vector<Value>> for Value {
    fn from(items: Vector<Value>) -> Self {
        Self::List(items)
    }
}

impl From<AttrMap> for Value {
    fn from(map: AttrMap) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(plain: serde_json::Value) -> Self {
        Self::from_plain(plain)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items.iter()),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("any plain value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, i: u64) -> Result<Value, E> {
        Ok(Value::from(i))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Str(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Str(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vector::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push_back(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Value, A::Error> {
        AttrMap::from_map_access(access).map(Value::Map)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
