//! Key paths for addressing nested attributes
//!
//! Provides [`KeyPath`] for hierarchical addressing inside an [`AttrMap`] and
//! [`Key`], the flat-or-path key accepted by every container operation.
//!
//! [`AttrMap`]: crate::AttrMap

use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path into a nested attribute tree
///
/// Segments are plain strings; a segment applied to a list is read as an
/// index.
///
/// # Examples
/// - `"a.b.c"` → `["a", "b", "c"]`
/// - `"arr[1]"` → `["arr", "1"]`
/// - `"a[\"b.c\"].d"` → `["a", "b.c", "d"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Create path from a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted/bracketed string
    ///
    /// Never fails: empty segments between dots are kept as `""`, an
    /// unterminated bracket takes the rest of the input.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        if input.is_empty() {
            return Self::root();
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        // a slot was opened by a dot (or the start) and must be emitted
        let mut open = true;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if open {
                        segments.push(std::mem::take(&mut current));
                    }
                    open = true;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let quote = match chars.peek() {
                        Some('"' | '\'') => chars.next(),
                        _ => None,
                    };
                    let mut inner = String::new();
                    while let Some(ch) = chars.next() {
                        match (ch, quote) {
                            ('\\', Some(_)) => {
                                if let Some(escaped) = chars.next() {
                                    inner.push(escaped);
                                }
                            }
                            (q, Some(expected)) if q == expected && chars.peek() == Some(&']') => {
                                chars.next();
                                break;
                            }
                            (']', None) => break,
                            (other, _) => inner.push(other),
                        }
                    }
                    segments.push(inner);
                    open = false;
                }
                other => {
                    current.push(other);
                    open = true;
                }
            }
        }

        if open {
            segments.push(current);
        }
        Self(segments)
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Whether a string key addresses a nested location
///
/// True when the key has more than one dot-separated segment or uses
/// bracket syntax (`arr[1]`).
#[inline]
#[must_use]
pub fn is_path_like(key: &str) -> bool {
    key.contains('.') || key.contains('[')
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[String]> for KeyPath {
    fn from(segments: &[String]) -> Self {
        Self(segments.to_vec())
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Key accepted by container operations
///
/// Flat keys address a top-level entry directly; path keys traverse nested
/// maps and lists. Anything that is not path-like is coerced to a flat key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Direct top-level key
    Flat(String),
    /// Nested path
    Path(KeyPath),
}

impl Key {
    /// Classify a string key
    #[must_use]
    pub fn parse(key: &str) -> Self {
        if is_path_like(key) {
            Self::Path(KeyPath::parse(key))
        } else {
            Self::Flat(key.to_string())
        }
    }

    /// Whether this key traverses nested values
    #[inline]
    #[must_use]
    pub fn is_path(&self) -> bool {
        matches!(self, Self::Path(_))
    }

    /// Path form of the key (a flat key becomes a single segment)
    #[must_use]
    pub fn to_path(&self) -> KeyPath {
        match self {
            Self::Flat(key) => KeyPath::single(key.clone()),
            Self::Path(path) => path.clone(),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(key) => f.write_str(key),
            Self::Path(path) => Display::fmt(path, f),
        }
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        if is_path_like(&key) {
            Self::Path(KeyPath::parse(&key))
        } else {
            Self::Flat(key)
        }
    }
}

impl From<&String> for Key {
    fn from(key: &String) -> Self {
        Self::parse(key)
    }
}

impl From<KeyPath> for Key {
    fn from(path: KeyPath) -> Self {
        Self::Path(path)
    }
}

impl From<&KeyPath> for Key {
    fn from(path: &KeyPath) -> Self {
        Self::Path(path.clone())
    }
}

impl From<Vec<String>> for Key {
    fn from(segments: Vec<String>) -> Self {
        Self::Path(KeyPath::new(segments))
    }
}

impl From<Vec<&str>> for Key {
    fn from(segments: Vec<&str>) -> Self {
        Self::Path(KeyPath::from(segments.as_slice()))
    }
}

impl From<&[&str]> for Key {
    fn from(segments: &[&str]) -> Self {
        Self::Path(KeyPath::from(segments))
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(segments: [&str; N]) -> Self {
        Self::Path(KeyPath::from(&segments[..]))
    }
}

macro_rules! key_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(key: $ty) -> Self {
                    Self::Flat(key.to_string())
                }
            }
        )*
    };
}

key_from_integer!(i32, i64, u32, u64, usize);
