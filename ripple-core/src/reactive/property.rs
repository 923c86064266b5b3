//! Reactive Property Installer
//!
//! Replaces a key on a mapping with an accessor pair. The getter registers
//! the active subscriber with the property's Dep (and with the child
//! value's structural Dep); the setter stores the new value, re-observes it
//! and notifies.
//!
//! Accessors that were already on the key keep working: reads and writes are
//! routed through them, with tracking layered on top.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config;
use crate::value::{has_changed, Getter, Object, Property, Setter, Value};

use super::context;
use super::dep::{depend_array, Dep, NotifyMeta, TriggerKind};
use super::observer::{observe_with, ObserveOptions, Observer};

/// Hook run before a reactive property accepts a changed value. Receives the
/// key and the incoming value.
pub type DiagnosticFn = Rc<dyn Fn(&str, &Value)>;

struct ReactiveProperty {
    key: String,
    dep: Dep,
    value: RefCell<Value>,
    child: RefCell<Option<Rc<Observer>>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    on_set: Option<DiagnosticFn>,
    options: ObserveOptions,
}

impl ReactiveProperty {
    fn current(&self, obj: &Object) -> Value {
        match &self.getter {
            Some(getter) => getter(obj),
            None => self.value.borrow().clone(),
        }
    }

    fn observe_child(&self, value: &Value) -> Option<Rc<Observer>> {
        if self.options.shallow {
            return None;
        }
        observe_with(
            value,
            ObserveOptions {
                shallow: false,
                mock: self.options.mock,
            },
        )
    }

    fn get(&self, obj: &Object) -> Value {
        let value = self.current(obj);
        if context::is_tracking() {
            self.dep.depend();
            let child = self.child.borrow().clone();
            if let Some(child) = child {
                child.dep().depend();
            }
            if let Value::Array(array) = &value {
                depend_array(array);
            }
        }
        value
    }

    fn set(&self, obj: &Object, new_value: Value) {
        let value = self.current(obj);
        if !has_changed(&value, &new_value) {
            return;
        }
        if let Some(on_set) = &self.on_set {
            on_set(&self.key, &new_value);
        }

        if let Some(setter) = &self.setter {
            setter(obj, new_value.clone());
        } else if self.getter.is_some() {
            // Accessor without a setter: read-only, keep it that way.
            return;
        } else {
            *self.value.borrow_mut() = new_value.clone();
        }

        let child = self.observe_child(&new_value);
        *self.child.borrow_mut() = child;
        self.dep
            .notify(NotifyMeta::new(TriggerKind::Set).with_key(self.key.as_str()));
    }
}

/// Make `key` on `obj` reactive.
///
/// `initial` overrides the value currently stored under the key. Returns the
/// property's Dep, or `None` when the key is locked by a non-configurable
/// property (or cannot be added to a non-extensible object), in which case
/// nothing changes.
pub fn install_reactive_property(
    obj: &Object,
    key: &str,
    initial: Option<Value>,
    on_set: Option<DiagnosticFn>,
    options: ObserveOptions,
) -> Option<Dep> {
    let existing = obj.descriptor(key);
    if existing.as_ref().is_some_and(|prop| !prop.is_configurable()) {
        if config::is_verbose() {
            tracing::debug!(key, "non-configurable property left as is");
        }
        return None;
    }

    let getter = existing.as_ref().and_then(Property::getter);
    let setter = existing.as_ref().and_then(Property::setter);
    let value = match initial {
        Some(value) => value,
        None if getter.is_none() || setter.is_some() => obj.get(key).unwrap_or_default(),
        None => Value::Null,
    };

    let dep = Dep::new();
    let prop = Rc::new(ReactiveProperty {
        key: key.to_owned(),
        dep: dep.clone(),
        value: RefCell::new(Value::Null),
        child: RefCell::new(None),
        getter,
        setter,
        on_set,
        options,
    });
    *prop.child.borrow_mut() = prop.observe_child(&value);
    *prop.value.borrow_mut() = value;

    let read = prop.clone();
    let write = prop;
    let get: Getter = Rc::new(move |obj: &Object| read.get(obj));
    let set: Setter = Rc::new(move |obj: &Object, value: Value| write.set(obj, value));

    if !obj.define_property(key, Property::accessor(Some(get), Some(set))) {
        if config::is_verbose() {
            tracing::debug!(key, "cannot add reactive property to a non-extensible object");
        }
        return None;
    }
    Some(dep)
}
