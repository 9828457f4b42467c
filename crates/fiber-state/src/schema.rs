//! Model schemas
//!
//! A [`Schema`] lists the fields a [`Model`](crate::Model) may hold, their
//! types, whether they are required and their defaults.
//!
//! # JSON form
//!
//! ```json
//! {
//!   "name": {"type": "str", "required": true},
//!   "age": {"type": "int", "default": 0},
//!   "tags": {"type": "list"}
//! }
//! ```

use fiber_value::{AttrMap, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Accepted value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Anything
    #[default]
    Any,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float (integers are accepted)
    Float,
    /// Integer or float
    Number,
    /// String
    Str,
    /// List
    List,
    /// Map
    Map,
}

impl FieldType {
    /// Whether `value` has this type
    ///
    /// `Null` is accepted by every type; required fields reject it
    /// separately.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::Any, _)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float | Self::Number, Value::Int(_) | Value::Float(_))
            | (Self::Str, Value::Str(_))
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            _ => false,
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::Str => "str",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// Field definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Field {
    /// Accepted type
    #[serde(rename = "type")]
    pub kind: FieldType,
    /// Must be present and non-null
    pub required: bool,
    /// Value used when the field is missing at construction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    /// Create optional field of `kind`
    #[inline]
    #[must_use]
    pub fn new(kind: FieldType) -> Self {
        Self {
            kind,
            required: false,
            default: None,
        }
    }

    /// Mark as required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// With default value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Schema validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Required field absent or null
    #[error("missing required field `{field}`")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Field value has the wrong type
    #[error("field `{field}` expects {expected}, found {found}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type
        expected: FieldType,
        /// Kind of value found
        found: &'static str,
    },
}

/// Ordered set of field definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: IndexMap<String, Field>,
}

impl Schema {
    /// Create empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, returning the updated schema
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Field definition by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Check if the schema declares `name`
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if schema has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Defaults of every field that has one, in declaration order
    #[must_use]
    pub fn defaults(&self) -> AttrMap {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.default.clone().map(|value| (name.as_str(), value)))
            .collect()
    }

    /// Drop keys the schema does not declare
    #[must_use]
    pub fn filter(&self, attributes: &AttrMap) -> AttrMap {
        attributes
            .iter()
            .filter(|(key, _)| self.contains(key))
            .map(|(key, value)| (key, value.clone()))
            .collect()
    }

    /// Check required fields and types
    ///
    /// # Errors
    /// Returns the first violation in declaration order
    pub fn validate(&self, attributes: &AttrMap) -> Result<(), SchemaError> {
        for (name, field) in &self.fields {
            let value = attributes.get(name).unwrap_or(&Value::Null);
            if field.required && value.is_null() {
                return Err(SchemaError::MissingField { field: name.clone() });
            }
            if !field.kind.accepts(value) {
                return Err(SchemaError::TypeMismatch {
                    field: name.clone(),
                    expected: field.kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Filter then validate
    ///
    /// # Errors
    /// Returns error if the filtered attributes violate the schema
    pub fn prepare(&self, attributes: &AttrMap) -> Result<AttrMap, SchemaError> {
        let filtered = self.filter(attributes);
        self.validate(&filtered)?;
        Ok(filtered)
    }
}

impl<K: Into<String>> FromIterator<(K, Field)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }
}
