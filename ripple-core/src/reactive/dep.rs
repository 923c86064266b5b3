//! Dependency Sets
//!
//! A Dep is a broadcast point. Every reactive property owns one, and every
//! Observer owns one more for structural changes (keys added or removed,
//! sequence mutated). Reading through a property calls [`Dep::depend`];
//! writing calls [`Dep::notify`].
//!
//! Subscribers are held weakly: a Dep never keeps a computation alive.
//! Registration order is preserved, and notification follows it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::context;
use super::subscriber::{Subscriber, SubscriberId};
use crate::value::{Array, Key, Value};

/// Unique identifier for a Dep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A mutating sequence operation, as reported in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    Push,
    Pop,
    Shift,
    Unshift,
    Splice,
    Sort,
    Reverse,
}

/// What kind of change triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// An existing property was assigned a changed value.
    Set,
    /// A key was added through the structural `set` helper.
    Add,
    /// A key was removed through the structural `del` helper.
    Delete,
    /// An intercepted sequence operation ran.
    Array(ArrayOp),
}

/// Details handed to every subscriber on notification.
#[derive(Debug, Clone)]
pub struct NotifyMeta {
    pub kind: TriggerKind,
    pub key: Option<Key>,
    pub inserted: SmallVec<[Value; 4]>,
}

impl NotifyMeta {
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            key: None,
            inserted: SmallVec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_inserted(mut self, inserted: impl IntoIterator<Item = Value>) -> Self {
        self.inserted.extend(inserted);
        self
    }
}

struct DepInner {
    id: DepId,
    subs: RefCell<IndexMap<SubscriberId, Weak<dyn Subscriber>>>,
}

/// A set of subscribers interested in one piece of state.
///
/// Cloning yields another handle to the same set.
#[derive(Clone)]
pub struct Dep(Rc<DepInner>);

impl Dep {
    pub fn new() -> Self {
        Self(Rc::new(DepInner {
            id: DepId::next(),
            subs: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn id(&self) -> DepId {
        self.0.id
    }

    /// Register the active subscriber, if there is one.
    ///
    /// The subscriber records the Dep and the Dep records the subscriber;
    /// both sides ignore repeats.
    pub fn depend(&self) {
        if let Some(subscriber) = context::current_subscriber() {
            subscriber.add_dependency(self);
            self.add_sub(&subscriber);
        }
    }

    /// Add a subscriber directly. Adding one twice is a no-op.
    pub fn add_sub(&self, subscriber: &Rc<dyn Subscriber>) {
        self.0
            .subs
            .borrow_mut()
            .entry(subscriber.id())
            .or_insert_with(|| Rc::downgrade(subscriber));
    }

    /// Remove a subscriber, e.g. when it stopped reading this state.
    pub fn remove_sub(&self, id: SubscriberId) {
        self.0.subs.borrow_mut().shift_remove(&id);
    }

    /// Number of registered subscribers that are still alive.
    pub fn subscriber_count(&self) -> usize {
        self.0
            .subs
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn has_subscriber(&self, id: SubscriberId) -> bool {
        self.0.subs.borrow().contains_key(&id)
    }

    /// Tell every registered subscriber that the state changed.
    ///
    /// Works on a snapshot taken up front, so subscribers that register or
    /// unregister while being notified neither vanish from nor repeat in
    /// this round.
    pub fn notify(&self, meta: NotifyMeta) {
        let snapshot: SmallVec<[Rc<dyn Subscriber>; 8]> = {
            let mut subs = self.0.subs.borrow_mut();
            subs.retain(|_, weak| weak.strong_count() > 0);
            subs.values().filter_map(Weak::upgrade).collect()
        };

        tracing::trace!(
            dep = self.0.id.0,
            subscribers = snapshot.len(),
            kind = ?meta.kind,
            "notify"
        );

        for subscriber in &snapshot {
            subscriber.schedule_update(&meta);
        }
    }

    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.0.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Register the active subscriber with every observed container nested in
/// `array`.
///
/// Index writes bypass accessors entirely, so whoever reads a sequence has
/// to depend on each element's structural Dep as well.
pub fn depend_array(array: &Array) {
    for item in array.iter() {
        match &item {
            Value::Object(o) => {
                if let Some(observer) = o.observer() {
                    observer.dep().depend();
                }
            }
            Value::Array(a) => {
                if let Some(observer) = a.observer() {
                    observer.dep().depend();
                }
                depend_array(a);
            }
            _ => {}
        }
    }
}
