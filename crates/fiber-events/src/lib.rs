//! Fiber Events
//!
//! Synchronous event channels with namespacing, alias catalogs and a
//! broadcast bus.
//!
//! # Core Concepts
//!
//! - [`Emitter`]: event channel; `on`/`once`/`when`/`after`/`off`, `fire`
//! - [`Catalog`]: alias table consulted when resolving event names
//! - [`Broadcast`]: shared bus, global by default or injected
//! - [`Listener`]: callback with identity, optionally grouped by [`Scope`]
//! - [`Selector`]: partial match used to unsubscribe
//!
//! # Example
//!
//! ```rust
//! use fiber_events::{Catalog, Emitter, Event};
//! use fiber_value::Value;
//!
//! let model = Emitter::new()
//!     .with_namespace("app")
//!     .with_catalog(Catalog::new().with_alias("save", "model:saved"));
//!
//! model.on("save", |event: &Event| {
//!     assert_eq!(event.name(), "app:model:saved");
//!     assert_eq!(event.arg(0), Some(&Value::from(1)));
//! });
//! model.fire("save", vec![Value::from(1)]);
//! ```

#![warn(unreachable_pub)]

mod broadcast;
mod catalog;
mod emitter;
mod listener;
mod selector;

pub use broadcast::Broadcast;
pub use catalog::Catalog;
pub use emitter::{Emitter, ALL_EVENTS};
pub use listener::{EmitterId, Event, IntoListener, Listener, Scope};
pub use selector::Selector;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::{Broadcast, Catalog, Emitter, Event, Listener, Scope, Selector};
}
