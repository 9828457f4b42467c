//! Fiber Values
//!
//! Persistent, path-addressable attribute data.
//!
//! # Core Concepts
//!
//! - [`Value`]: closed set of storable values (scalars, lists, maps)
//! - [`AttrMap`]: immutable ordered `String -> Value` map with structural sharing
//! - [`KeyPath`]: parsed nested address (`a.b[0]["c.d"]`)
//! - [`Key`]: flat-or-path key accepted by container operations
//!
//! # Example
//!
//! ```rust
//! use fiber_value::{AttrMap, KeyPath, Value};
//!
//! let before = AttrMap::from([("count", 1)]);
//! let after = before.with_in(&KeyPath::parse("meta.tags[0]"), "new");
//!
//! assert_eq!(before.len(), 1);
//! assert_eq!(
//!     after.get_in(&KeyPath::parse("meta.tags[0]")),
//!     Some(&Value::from("new"))
//! );
//! ```

#![warn(unreachable_pub)]

mod error;
mod map;
mod path;
mod value;

pub use error::ValueError;
pub use map::{AttrMap, Iter};
pub use path::{is_path_like, Key, KeyPath};
pub use value::{Value, MAX_LIST_GAP};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::{AttrMap, Key, KeyPath, Value};
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_drives_map_access() {
        let map = AttrMap::from_plain(json!({"a": {"b": 1}, "a.b": 2})).unwrap();

        assert_eq!(map.get_key(&Key::from("a.b")), Some(&Value::Int(1)));
        assert_eq!(map.get("a.b"), Some(&Value::Int(2)));
        assert!(map.has_key(&Key::from(["a", "b"])));
    }

    #[test]
    fn with_key_then_without_key() {
        let key = Key::from("list[2].name");
        let map = AttrMap::new().with_key(&key, "x");
        assert_eq!(map.to_plain(), json!({"list": [null, null, {"name": "x"}]}));

        let cleared = map.without_key(&key);
        assert_eq!(cleared.to_plain(), json!({"list": [null, null, {}]}));
        assert!(!cleared.has_key(&key));
    }

    #[test]
    fn nested_values_share_structure() {
        let inner = AttrMap::from([("x", 1)]);
        let outer = AttrMap::from([("inner", Value::from(inner.clone()))]);
        let changed = outer.with_in(&KeyPath::parse("inner.y"), 2);

        assert_eq!(outer.get("inner"), Some(&Value::Map(inner)));
        assert_eq!(changed.get_in(&KeyPath::parse("inner.x")), Some(&Value::Int(1)));
    }
}
