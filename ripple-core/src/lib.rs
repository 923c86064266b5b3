//! Ripple Core
//!
//! This crate provides the observation engine for the Ripple reactive UI
//! framework. It implements:
//!
//! - A host value model of keyed mappings and ordered sequences
//! - Observers that convert those containers into tracked state
//! - Dependency sets linking reactive reads to subscribers
//! - Interception of mutating sequence operations
//! - Structural `set`/`del` helpers for adding and removing keys
//!
//! Rendering, scheduling and component lifecycles live elsewhere; they
//! consume the notifications produced here.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: Host values with identity semantics
//! - `reactive`: Observers, Deps, the active-subscriber stack and helpers
//! - `config`: Per-thread engine switches
//! - `error`: Errors reported by the structural helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::reactive::{observable, set, Watcher};
//! use ripple_core::Value;
//! use serde_json::json;
//!
//! let state = observable(Value::from(json!({ "count": 0 })));
//! let obj = state.as_object().unwrap().clone();
//!
//! // Runs once, reading `count`
//! let watcher = Watcher::new(move || obj.get("count").unwrap_or_default());
//!
//! // Notifies the watcher
//! state.as_object().unwrap().set("count", 1);
//! assert_eq!(watcher.update_count(), 1);
//!
//! // Adds a new reactive key
//! set(&state, "step", 2).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod value;

pub use config::{toggle_observing, Config};
pub use error::{ObserveError, Result};
pub use value::{has_changed, Array, Container, Key, Object, Property, Value};
