//! Observation Engine
//!
//! This module turns plain containers into tracked state and connects reads
//! to the computations that performed them.
//!
//! # Concepts
//!
//! ## Observers
//!
//! An Observer is attached to a container the first time it is observed.
//! For a mapping it installs a reactive property on every key; for a
//! sequence it installs the intercepting method table. Nested containers are
//! observed recursively unless the Observer is shallow.
//!
//! ## Deps
//!
//! A Dep is a set of subscribers. Every reactive property has one, and every
//! Observer has one for structural changes. Reading registers the active
//! subscriber; writing notifies everyone registered.
//!
//! ## Subscribers
//!
//! A Subscriber is the host's evaluating computation. While it evaluates, it
//! sits on top of the active-subscriber stack, which is how reads know whom
//! to register. Notified subscribers are not re-run here; that is the
//! scheduler's call. [`Watcher`] is a ready-made subscriber for simple hosts
//! and tests.
//!
//! # Implementation Notes
//!
//! Everything is single-threaded and synchronous. The stack is thread-local,
//! Deps hold subscribers weakly, and containers own their Observer while the
//! Observer points back weakly.

mod array;
mod context;
mod dep;
mod observer;
mod property;
mod structural;
mod subscriber;
mod watcher;

pub use array::{InterceptedMethods, INTERCEPTED_METHODS};
pub use context::{
    current_subscriber, depth, is_tracking, pop_active_subscriber, push_active_subscriber, ActiveSubscriber,
};
pub use dep::{depend_array, ArrayOp, Dep, DepId, NotifyMeta, TriggerKind};
pub use observer::{bind_root_state, observable, observe, observe_with, ObserveOptions, Observer};
pub use property::{install_reactive_property, DiagnosticFn};
pub use structural::{del, set};
pub use subscriber::{Subscriber, SubscriberId};
pub use watcher::{Watcher, WatcherOptions};
