//! Subscriber types for the observation engine.
//!
//! A Subscriber is any computation that reads reactive state and wants to
//! hear about changes to what it read: render functions, watchers, computed
//! values. The engine only needs the two entry points below; when and how a
//! notified subscriber actually re-runs is up to the host's scheduler.

use std::sync::atomic::{AtomicU64, Ordering};

use super::dep::{Dep, NotifyMeta};

/// Unique identifier for a subscriber.
///
/// Deps key their subscriber sets by this ID, which is what makes
/// registration idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that depends on reactive state.
pub trait Subscriber {
    /// Stable identity of this subscriber.
    fn id(&self) -> SubscriberId;

    /// Called by `Dep::depend` while this subscriber is the active one.
    ///
    /// Implementations should deduplicate per evaluation.
    fn add_dependency(&self, dep: &Dep);

    /// Called by `Dep::notify` when something this subscriber read changed.
    fn schedule_update(&self, meta: &NotifyMeta);
}
