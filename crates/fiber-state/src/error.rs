//! Error types for attribute containers
//!
//! Absence and type mismatch on reads never error; these cover the
//! boundaries where data can actually be rejected.

use crate::schema::SchemaError;
use fiber_value::ValueError;

/// Main container error type
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Plain data could not be turned into attributes
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A model write violated its schema
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    /// A derived container could not be built
    #[error("cannot replicate {type_name}: {reason}")]
    Replication {
        /// Kind of container being replicated
        type_name: &'static str,
        /// Why replication failed
        reason: String,
    },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Subscriber installation failed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl StateError {
    /// Check if error comes from schema validation
    #[inline]
    #[must_use]
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}
