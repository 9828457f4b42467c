//! Fiber State
//!
//! Immutable attribute containers that announce every change.
//!
//! # Core Concepts
//!
//! - [`Synthetic`]: the container API (path reads, notified writes, bulk
//!   transforms, plain/JSON projection); sealed
//! - [`Collection`]: open container with raw access for trusted code
//! - [`State`]: guarded container; writes only through [`Synthetic`]
//! - [`Model`]: container constrained by a [`Schema`]
//! - [`Options`]: namespace, catalog, hidden keys, broadcast bus
//!
//! # Example
//!
//! ```rust
//! use fiber_events::{Broadcast, Event};
//! use fiber_state::{Collection, Options, Synthetic};
//! use fiber_value::AttrMap;
//!
//! let options = Options::new().with_namespace("todo").with_broadcast(Broadcast::new());
//! let mut todo = Collection::with_options(AttrMap::new(), options);
//!
//! todo.emitter().on("set", |event: &Event| {
//!     assert_eq!(event.name(), "todo:set");
//! });
//!
//! let before = todo.snapshot();
//! todo.set("meta.tags[0]", "urgent")?;
//! assert!(before.is_empty());
//! assert_eq!(todo.to_json()?, r#"{"meta":{"tags":["urgent"]}}"#);
//! # Ok::<(), fiber_state::StateError>(())
//! ```

#![warn(unreachable_pub)]

mod collection;
mod error;
mod model;
mod options;
mod schema;
mod state;
mod store;
mod synthetic;

pub mod logging;

pub use collection::Collection;
pub use error::StateError;
pub use model::{Model, FIELD_CHANGE_PREFIX};
pub use options::{LogConfig, Options};
pub use schema::{Field, FieldType, Schema, SchemaError};
pub use state::State;
pub use store::AttributeStore;
pub use synthetic::{Operation, Replicate, Synthetic, CHANGED, CHANGING, DESTROYING};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::{Collection, Model, Options, Schema, State, StateError, Synthetic};
    pub use fiber_value::prelude::*;
}
