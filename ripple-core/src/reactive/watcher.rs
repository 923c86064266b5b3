//! Watcher Implementation
//!
//! A Watcher is a ready-made subscriber: it evaluates a getter while
//! registered as the active subscriber, remembers every Dep the getter read,
//! and records each notification it receives.
//!
//! # How Watchers Work
//!
//! 1. When created, the watcher runs its getter immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, `schedule_update` is called. By default
//!    the watcher only counts the update and runs the `on_update` hook;
//!    deciding when to re-run belongs to the host's scheduler, which calls
//!    [`Watcher::run`]. A `sync` watcher re-runs on the spot instead.
//!
//! 3. Each run collects a fresh dependency set. Deps that were read last
//!    time but not this time drop the watcher, so stale state no longer
//!    triggers it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::context::ActiveSubscriber;
use super::dep::{Dep, DepId, NotifyMeta};
use super::subscriber::{Subscriber, SubscriberId};
use crate::value::Value;

/// How a watcher reacts to notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Re-run the getter inside `schedule_update`.
    pub sync: bool,
}

struct WatcherInner {
    id: SubscriberId,
    this: Weak<WatcherInner>,
    getter: Box<dyn Fn() -> Value>,
    value: RefCell<Value>,
    /// Deps read by the last completed run.
    deps: RefCell<IndexMap<DepId, Dep>>,
    /// Deps read by the run in progress.
    new_deps: RefCell<IndexMap<DepId, Dep>>,
    on_update: RefCell<Option<Rc<dyn Fn(&NotifyMeta)>>>,
    options: WatcherOptions,
    active: Cell<bool>,
    update_count: Cell<usize>,
    run_count: Cell<usize>,
}

impl WatcherInner {
    fn evaluate(&self) -> Value {
        let Some(this) = self.this.upgrade() else {
            return Value::Null;
        };
        if !self.active.get() {
            return self.value.borrow().clone();
        }

        let value = {
            let _active = ActiveSubscriber::enter(this);
            (self.getter)()
        };
        self.cleanup_deps();

        *self.value.borrow_mut() = value.clone();
        self.run_count.set(self.run_count.get() + 1);
        value
    }

    fn cleanup_deps(&self) {
        let new_deps = std::mem::take(&mut *self.new_deps.borrow_mut());
        let old_deps = std::mem::replace(&mut *self.deps.borrow_mut(), new_deps);
        let deps = self.deps.borrow();
        for (id, dep) in old_deps {
            if !deps.contains_key(&id) {
                dep.remove_sub(self.id);
            }
        }
    }
}

impl Subscriber for WatcherInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dependency(&self, dep: &Dep) {
        self.new_deps
            .borrow_mut()
            .entry(dep.id())
            .or_insert_with(|| dep.clone());
    }

    fn schedule_update(&self, meta: &NotifyMeta) {
        if !self.active.get() {
            return;
        }
        self.update_count.set(self.update_count.get() + 1);

        let hook = self.on_update.borrow().clone();
        if let Some(hook) = hook {
            hook(meta);
        }
        if self.options.sync {
            self.evaluate();
        }
    }
}

/// A subscriber that evaluates a getter and tracks what it read.
///
/// # Example
///
/// ```rust,ignore
/// let state = observable(Value::from(json!({ "count": 0 })));
/// let obj = state.as_object().unwrap().clone();
///
/// let watcher = Watcher::new(move || obj.get("count").unwrap_or_default());
///
/// state.as_object().unwrap().set("count", 1);
/// assert_eq!(watcher.update_count(), 1);
/// ```
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    /// Create a watcher and run the getter once to collect dependencies.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Self::with_options(getter, WatcherOptions::default())
    }

    /// Create a watcher that re-runs as soon as it is notified.
    pub fn sync<F>(getter: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Self::with_options(getter, WatcherOptions { sync: true })
    }

    pub fn with_options<F>(getter: F, options: WatcherOptions) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        let inner = Rc::new_cyclic(|this| WatcherInner {
            id: SubscriberId::new(),
            this: this.clone(),
            getter: Box::new(getter),
            value: RefCell::new(Value::Null),
            deps: RefCell::new(IndexMap::new()),
            new_deps: RefCell::new(IndexMap::new()),
            on_update: RefCell::new(None),
            options,
            active: Cell::new(true),
            update_count: Cell::new(0),
            run_count: Cell::new(0),
        });
        inner.evaluate();
        Self { inner }
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Re-run the getter, refreshing the dependency set.
    pub fn run(&self) -> Value {
        self.inner.evaluate()
    }

    /// Value produced by the last run.
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Install a hook called on every notification.
    pub fn set_on_update<F>(&self, hook: F)
    where
        F: Fn(&NotifyMeta) + 'static,
    {
        *self.inner.on_update.borrow_mut() = Some(Rc::new(hook));
    }

    /// Number of notifications received while active.
    pub fn update_count(&self) -> usize {
        self.inner.update_count.get()
    }

    /// Number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of distinct Deps read by the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    /// Unsubscribe from every Dep and stop reacting.
    pub fn teardown(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        let deps = std::mem::take(&mut *self.inner.deps.borrow_mut());
        for dep in deps.values() {
            dep.remove_sub(self.inner.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// This watcher as a trait object, e.g. for `Dep::add_sub`.
    pub fn as_subscriber(&self) -> Rc<dyn Subscriber> {
        self.inner.clone()
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("update_count", &self.update_count())
            .field("dependency_count", &self.dependency_count())
            .field("active", &self.is_active())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::observe;
    use crate::value::Object;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn state() -> Object {
        let obj: Object = [("a", 1), ("b", 10)].into_iter().collect();
        observe(&Value::from(obj.clone()));
        obj
    }

    #[test]
    fn watcher_runs_on_creation() {
        let obj = state();
        let read = obj.clone();
        let watcher = Watcher::new(move || read.get("a").unwrap_or_default());

        assert_eq!(watcher.run_count(), 1);
        assert_eq!(watcher.value(), Value::from(1));
        assert_eq!(watcher.dependency_count(), 1);
    }

    #[test]
    fn watcher_counts_updates_without_rerunning() {
        let obj = state();
        let read = obj.clone();
        let watcher = Watcher::new(move || read.get("a").unwrap_or_default());

        obj.set("a", 2);
        obj.set("a", 3);
        assert_eq!(watcher.update_count(), 2);
        assert_eq!(watcher.run_count(), 1);
        assert_eq!(watcher.value(), Value::from(1));

        assert_eq!(watcher.run(), Value::from(3));
    }

    #[test]
    fn sync_watcher_reruns_immediately() {
        let obj = state();
        let read = obj.clone();
        let watcher = Watcher::sync(move || read.get("a").unwrap_or_default());

        obj.set("a", 5);
        assert_eq!(watcher.run_count(), 2);
        assert_eq!(watcher.value(), Value::from(5));
    }

    #[test]
    fn stale_dependencies_are_dropped() {
        let obj = state();
        let read = obj.clone();
        let flag = Rc::new(Cell::new(true));
        let flag_clone = flag.clone();
        let watcher = Watcher::new(move || {
            if flag_clone.get() {
                read.get("a").unwrap_or_default()
            } else {
                read.get("b").unwrap_or_default()
            }
        });

        flag.set(false);
        watcher.run();

        obj.set("a", 100);
        assert_eq!(watcher.update_count(), 0);
        obj.set("b", 100);
        assert_eq!(watcher.update_count(), 1);
    }

    #[test]
    fn teardown_stops_updates() {
        let obj = state();
        let read = obj.clone();
        let watcher = Watcher::new(move || read.get("a").unwrap_or_default());

        watcher.teardown();
        assert!(!watcher.is_active());
        assert_eq!(watcher.dependency_count(), 0);

        obj.set("a", 2);
        assert_eq!(watcher.update_count(), 0);
    }

    #[test]
    fn on_update_hook_receives_meta() {
        let obj = state();
        let read = obj.clone();
        let watcher = Watcher::new(move || read.get("a").unwrap_or_default());
        let keys = Rc::new(RefCell::new(Vec::new()));
        let keys_clone = keys.clone();
        watcher.set_on_update(move |meta| keys_clone.borrow_mut().push(meta.key.clone()));

        obj.set("a", 2);
        assert_eq!(*keys.borrow(), vec![Some(crate::value::Key::from("a"))]);
    }

    #[test]
    fn nested_watchers_track_separately() {
        let obj = state();
        let (outer_read, inner_read) = (obj.clone(), obj.clone());
        let inner_slot: Rc<RefCell<Option<Watcher>>> = Rc::new(RefCell::new(None));
        let slot = inner_slot.clone();

        let outer = Watcher::new(move || {
            let inner_read = inner_read.clone();
            *slot.borrow_mut() = Some(Watcher::new(move || inner_read.get("b").unwrap_or_default()));
            outer_read.get("a").unwrap_or_default()
        });
        let inner = inner_slot.borrow().clone().unwrap();

        obj.set("b", 11);
        assert_eq!(inner.update_count(), 1);
        assert_eq!(outer.update_count(), 0);
    }

    #[test]
    fn panicking_getter_leaves_stack_clean() {
        let result = catch_unwind(AssertUnwindSafe(|| {
            Watcher::new(|| panic!("render failed"));
        }));
        assert!(result.is_err());
        assert_eq!(crate::reactive::context::depth(), 0);
    }
}
