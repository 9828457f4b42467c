//! Error types for attribute values

/// Errors raised at the plain-data boundary
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Input text is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A map was expected at the root
    #[error("expected an object, found {found}")]
    NotAnObject {
        /// Kind of value that was found
        found: &'static str,
    },
}
