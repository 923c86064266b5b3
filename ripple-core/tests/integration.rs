//! Integration Tests for the Observation Engine
//!
//! These tests verify that observers, deps, the interceptor and the
//! structural helpers work together the way a rendering host uses them.

use std::cell::RefCell;
use std::rc::Rc;

use ripple_core::reactive::{
    bind_root_state, del, observable, observe, observe_with, set, ActiveSubscriber, Dep, NotifyMeta,
    ObserveOptions, Subscriber, SubscriberId, TriggerKind, Watcher,
};
use ripple_core::{ObserveError, Value};
use serde_json::json;

/// A host-side subscriber that only records what it was told.
struct Render {
    id: SubscriberId,
    deps: RefCell<Vec<Dep>>,
    scheduled: RefCell<Vec<TriggerKind>>,
}

impl Render {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            id: SubscriberId::new(),
            deps: RefCell::new(Vec::new()),
            scheduled: RefCell::new(Vec::new()),
        })
    }

    fn evaluate<T>(self: &Rc<Self>, f: impl FnOnce() -> T) -> T {
        let _active = ActiveSubscriber::enter(self.clone());
        f()
    }

    fn scheduled(&self) -> usize {
        self.scheduled.borrow().len()
    }
}

impl Subscriber for Render {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dependency(&self, dep: &Dep) {
        let mut deps = self.deps.borrow_mut();
        if !deps.iter().any(|d| d.ptr_eq(dep)) {
            deps.push(dep.clone());
        }
    }

    fn schedule_update(&self, meta: &NotifyMeta) {
        self.scheduled.borrow_mut().push(meta.kind);
    }
}

/// Writing a changed value schedules the reader once; an unchanged write
/// schedules nothing.
#[test]
fn property_write_schedules_reader_once() {
    let state = Value::from(json!({ "a": 1 }));
    observe(&state);
    let obj = state.as_object().unwrap();

    let render = Render::new();
    render.evaluate(|| obj.get("a"));

    obj.set("a", 2);
    assert_eq!(render.scheduled(), 1);

    obj.set("a", 2);
    assert_eq!(render.scheduled(), 1);
}

/// Appending to a sequence notifies its readers once and observes the
/// appended element.
#[test]
fn sequence_push_and_index_set() {
    let state = Value::from(json!({ "arr": [1, 2, 3] }));
    observe(&state);
    let obj = state.as_object().unwrap();

    let render = Render::new();
    let arr = render.evaluate(|| obj.get("arr").unwrap());

    let array = arr.as_array().unwrap();
    assert_eq!(array.push([Value::from(4)]), 4);
    assert_eq!(render.scheduled(), 1);

    set(&arr, 0, 9).unwrap();
    assert_eq!(render.scheduled(), 2);
    assert_eq!(array.get(0), Some(Value::from(9)));
    assert_eq!(
        *render.scheduled.borrow(),
        vec![
            TriggerKind::Array(ripple_core::reactive::ArrayOp::Push),
            TriggerKind::Array(ripple_core::reactive::ArrayOp::Splice),
        ]
    );
}

/// Reading the same property repeatedly in one evaluation registers once.
#[test]
fn repeated_reads_register_once() {
    let state = observable(Value::from(json!({ "a": 1 })));
    let obj = state.as_object().unwrap();

    let render = Render::new();
    render.evaluate(|| {
        obj.get("a");
        obj.get("a");
        obj.get("a");
    });

    assert_eq!(render.deps.borrow().len(), 1);
    obj.set("a", 5);
    assert_eq!(render.scheduled(), 1);
}

/// Keys added with `set` are reactive afterwards, and the addition itself
/// is one structural notification.
#[test]
fn added_keys_are_reactive() {
    let state = observable(Value::from(json!({})));
    let obj = state.as_object().unwrap().clone();

    let structure = {
        let obj = obj.clone();
        Watcher::new(move || {
            if let Some(observer) = obj.observer() {
                observer.dep().depend();
            }
            Value::from(obj.len())
        })
    };

    set(&state, "newKey", 5).unwrap();
    assert_eq!(structure.update_count(), 1);

    let reader = Watcher::new(move || obj.get("newKey").unwrap_or_default());
    state.as_object().unwrap().set("newKey", 6);
    assert_eq!(reader.update_count(), 1);
}

/// Deleting an existing key notifies once; deleting a missing key is silent.
#[test]
fn delete_existing_and_missing_keys() {
    let state = observable(Value::from(json!({ "key": true })));
    let render = Render::new();
    render.evaluate(|| {
        state.as_object().unwrap().observer().unwrap().dep().depend();
    });

    del(&state, "key").unwrap();
    assert_eq!(*render.scheduled.borrow(), vec![TriggerKind::Delete]);

    del(&state, "key").unwrap();
    assert_eq!(render.scheduled(), 1);
}

/// Observing twice yields the same observer.
#[test]
fn observe_is_idempotent() {
    let value = Value::from(json!([{ "a": 1 }]));
    let first = observe(&value).unwrap();
    let second = observe_with(&value, ObserveOptions::shallow()).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(!second.is_shallow());
}

/// A subscriber re-running from inside a notification can read and write
/// reactive state without disturbing the round in progress.
#[test]
fn reentrant_update_during_notify() {
    let state = observable(Value::from(json!({ "count": 0, "doubled": 0 })));
    let obj = state.as_object().unwrap().clone();

    let doubler = {
        let obj = obj.clone();
        Watcher::sync(move || {
            let count = obj.get("count").and_then(|v| v.as_f64()).unwrap_or_default();
            obj.set("doubled", count * 2.0);
            Value::Null
        })
    };
    let display = {
        let obj = obj.clone();
        Watcher::new(move || obj.get("doubled").unwrap_or_default())
    };

    obj.set("count", 4);
    assert_eq!(doubler.run_count(), 2);
    assert_eq!(obj.get("doubled"), Some(Value::from(8)));
    assert_eq!(display.update_count(), 1);
}

/// Nested containers notify readers of the outer sequence.
#[test]
fn nested_sequence_mutation_reaches_outer_reader() {
    let state = observable(Value::from(json!({ "grid": [[1, 2], [3]] })));
    let obj = state.as_object().unwrap();

    let render = Render::new();
    let grid = render.evaluate(|| obj.get("grid").unwrap());

    let row = grid.as_array().unwrap().get(1).unwrap();
    row.as_array().unwrap().push([Value::from(4)]);
    assert_eq!(render.scheduled(), 1);
}

/// Root state accepts writes to declared keys but refuses new ones.
#[test]
fn root_state_refuses_runtime_keys() {
    let data = Value::from(json!({ "title": "draft" }));
    let observer = bind_root_state(&data).unwrap();
    assert_eq!(observer.vm_count(), 1);

    assert!(matches!(
        set(&data, "subtitle", "x"),
        Err(ObserveError::UnsupportedRootMutation { .. })
    ));
    assert!(matches!(
        del(&data, "title"),
        Err(ObserveError::UnsupportedRootMutation { .. })
    ));
    assert_eq!(set(&data, "title", "final"), Ok(Value::from("final")));
}

/// Exporting observed state reads through the installed accessors.
#[test]
fn observed_state_round_trips_to_json() {
    let source = json!({ "items": [{ "done": false }], "name": "list" });
    let state = observable(Value::from(source.clone()));
    assert_eq!(state.to_json(), source);
}
