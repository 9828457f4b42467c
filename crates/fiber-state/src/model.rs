//! Schema-constrained attribute container

use crate::error::StateError;
use crate::options::Options;
use crate::schema::Schema;
use crate::store::AttributeStore;
use crate::synthetic::{Replicate, Sealed, Synthetic};
use fiber_value::AttrMap;
use std::sync::Arc;

/// Prefix of the per-field event fired when a model field changes
pub const FIELD_CHANGE_PREFIX: &str = "change:";

/// Container whose attributes always satisfy a [`Schema`]
///
/// # Invariants
/// - only declared fields are stored
/// - every committed state passes [`Schema::validate`]
///
/// Each commit fires `change:<field>` for every field it changed, after the
/// swap and before `changed`.
///
/// # Example
///
/// ```rust
/// use fiber_state::{Field, FieldType, Model, Options, Schema, Synthetic};
/// use fiber_value::AttrMap;
///
/// let schema = Schema::new()
///     .field("name", Field::new(FieldType::Str).required())
///     .field("age", Field::new(FieldType::Int).with_default(0));
///
/// let mut person = Model::new(schema, AttrMap::from([("name", "Ada")]), Options::new())?;
/// assert_eq!(person.get_or("age", -1).as_i64(), Some(0));
/// assert!(person.set("age", "old").is_err());
/// # Ok::<(), fiber_state::StateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    store: AttributeStore,
    schema: Arc<Schema>,
}

impl Model {
    /// Create a model; defaults fill missing fields and undeclared keys are
    /// dropped
    ///
    /// # Errors
    /// Returns error if the resulting attributes violate the schema
    pub fn new(
        schema: impl Into<Arc<Schema>>,
        attributes: impl Into<AttrMap>,
        options: Options,
    ) -> Result<Self, StateError> {
        let schema = schema.into();
        let merged = schema.defaults().merge(&attributes.into());
        let attributes = schema.prepare(&merged).map_err(|e| {
            tracing::warn!("Rejected model construction: {}", e);
            StateError::from(e)
        })?;
        Ok(Self {
            store: AttributeStore::new(attributes, options),
            schema,
        })
    }

    /// Schema shared by this model and its replicas
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Sealed for Model {
    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    fn prepare(&self, attributes: AttrMap) -> Result<AttrMap, StateError> {
        self.schema.prepare(&attributes).map_err(|e| {
            tracing::warn!("Rejected {} write: {}", Self::KIND, e);
            StateError::from(e)
        })
    }

    /// Fire `change:<field>` with `[current, previous]` for every field
    /// whose value differs
    fn on_changed(&mut self, current: &AttrMap, previous: &AttrMap) {
        let emitter = self.store.emitter().clone();
        for name in self.schema.names() {
            let now = current.get(name);
            let before = previous.get(name);
            if now != before {
                emitter.fire(
                    &format!("{FIELD_CHANGE_PREFIX}{name}"),
                    vec![
                        now.cloned().unwrap_or_default(),
                        before.cloned().unwrap_or_default(),
                    ],
                );
            }
        }
    }
}

impl Replicate for Model {
    fn replicate(&self, attributes: AttrMap) -> Result<Self, StateError> {
        match self.schema.prepare(&attributes) {
            Ok(attributes) => Ok(Self {
                store: self.store.derive(attributes),
                schema: Arc::clone(&self.schema),
            }),
            Err(e) => {
                tracing::error!("Cannot replicate {}: {}", Self::KIND, e);
                Err(StateError::Replication {
                    type_name: Self::KIND,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl Synthetic for Model {
    const KIND: &'static str = "model";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, SchemaError};
    use fiber_events::Broadcast;
    use fiber_value::Value;
    use serde_json::json;

    fn person() -> Model {
        let schema = Schema::new()
            .field("name", Field::new(FieldType::Str).required())
            .field("age", Field::new(FieldType::Int).with_default(0))
            .field("tags", Field::new(FieldType::List));
        Model::new(
            schema,
            AttrMap::from([("name", Value::from("Ada")), ("nick", Value::from("a"))]),
            Options::new().with_broadcast(Broadcast::new()),
        )
        .unwrap()
    }

    #[test]
    fn construction_applies_defaults_and_drops_unknown() {
        let model = person();
        assert_eq!(model.to_plain(), json!({"age": 0, "name": "Ada"}));
    }

    #[test]
    fn construction_rejects_missing_required() {
        let schema = Schema::new().field("id", Field::new(FieldType::Int).required());
        let err = Model::new(schema, AttrMap::new(), Options::new()).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn rejected_write_changes_nothing() {
        let mut model = person();
        let before = model.snapshot();
        let err = model.set("age", "old").unwrap_err();
        assert!(matches!(
            err,
            StateError::Schema(SchemaError::TypeMismatch { .. })
        ));
        assert_eq!(model.snapshot(), before);
        assert!(model.forget("name").is_err());
        assert_eq!(model.get("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn undeclared_keys_are_filtered_on_write() {
        let mut model = person();
        model.set("extra", 1).unwrap();
        assert!(!model.has("extra"));
    }

    #[test]
    fn field_change_events_fire_for_changed_fields_only() {
        let mut model = person();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        model.emitter().on("change:age change:name", move |e: &fiber_events::Event| {
            log.lock().push((e.name().to_string(), e.args().to_vec()));
        });

        model.set("age", 36).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![("change:age".to_string(), vec![Value::from(36), Value::from(0)])]
        );
    }

    #[test]
    fn replication_failure_is_reported() {
        let model = person();
        let err = model.filter(|key, _| key != "name").unwrap_err();
        assert!(matches!(
            err,
            StateError::Replication { type_name: "model", .. }
        ));
        let kept = model.filter(|key, _| key == "name").unwrap();
        assert_eq!(kept.schema(), model.schema());
    }
}
