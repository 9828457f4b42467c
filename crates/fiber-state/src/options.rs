//! Container and logging configuration
//!
//! Both structs deserialize with every field optional, so partial JSON
//! configuration is accepted.

use crate::error::StateError;
use fiber_events::{Broadcast, Catalog, Emitter};
use fiber_value::{AttrMap, Value};
use serde::{Deserialize, Serialize};

/// Container options
///
/// Snapshotted at construction; only `destroy` clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Event namespace
    #[serde(alias = "namespace")]
    pub ns: String,
    /// Event alias catalog
    pub catalog: Catalog,
    /// Top-level keys omitted from plain output
    pub hidden: Vec<String>,
    /// Broadcast bus override; the global bus when unset
    #[serde(skip)]
    pub broadcast: Option<Broadcast>,
    /// Any other settings, kept as given
    #[serde(flatten)]
    pub extra: AttrMap,
}

impl Options {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With event namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.ns = ns.into();
        self
    }

    /// With event catalog
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// With an additional hidden key
    #[must_use]
    pub fn with_hidden(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.hidden.contains(&key) {
            self.hidden.push(key);
        }
        self
    }

    /// With a broadcast bus
    #[inline]
    #[must_use]
    pub fn with_broadcast(mut self, broadcast: Broadcast) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// With an extra setting
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key, value);
        self
    }

    /// Parse options from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a valid options object
    pub fn from_json(text: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check if a top-level key is hidden from plain output
    #[inline]
    #[must_use]
    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.iter().any(|hidden| hidden == key)
    }

    /// Build an emitter configured from these options
    #[must_use]
    pub fn emitter(&self) -> Emitter {
        let emitter = Emitter::new()
            .with_namespace(self.ns.clone())
            .with_catalog(self.catalog.clone());
        match &self.broadcast {
            Some(bus) => emitter.with_broadcast(bus.clone()),
            None => emitter,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `FIBER_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Include the event target (module path)
    pub with_target: bool,
}

impl LogConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With filter directive
    #[inline]
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// With JSON output
    #[inline]
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_accept_namespace_alias() {
        let options = Options::from_json(r#"{"namespace": "app"}"#).unwrap();
        assert_eq!(options.ns, "app");
        let options = Options::from_json(r#"{"ns": "other"}"#).unwrap();
        assert_eq!(options.ns, "other");
    }

    #[test]
    fn options_keep_unknown_settings() {
        let options =
            Options::from_json(r#"{"ns": "a", "catalog": {"save": "saved"}, "ttl": 30}"#).unwrap();
        assert_eq!(options.catalog.lookup("save"), Some("saved"));
        assert_eq!(options.extra.get("ttl"), Some(&Value::Int(30)));
        assert!(options.extra.get("ns").is_none());
    }

    #[test]
    fn options_default_when_empty() {
        assert_eq!(Options::from_json("{}").unwrap(), Options::default());
    }

    #[test]
    fn options_reject_bad_json() {
        assert!(matches!(Options::from_json("[1]"), Err(StateError::Json(_))));
    }

    #[test]
    fn with_hidden_is_unique() {
        let options = Options::new().with_hidden("a").with_hidden("a").with_hidden("b");
        assert_eq!(options.hidden, vec!["a".to_string(), "b".to_string()]);
        assert!(options.is_hidden("b"));
    }

    #[test]
    fn emitter_uses_naming_and_bus() {
        let bus = Broadcast::new();
        let emitter = Options::new()
            .with_namespace("ns")
            .with_broadcast(bus.clone())
            .emitter();
        assert_eq!(emitter.event("x"), "ns:x");
        assert!(emitter.broadcast_bus().same_bus(&bus));
    }

    #[test]
    fn log_config_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config.level, "info");
        assert!(config.json);
    }
}
