//! Observers
//!
//! An Observer is attached to each observed container, at most one per
//! container. Attaching it converts the container in place: every key of a
//! mapping becomes a reactive property, and a sequence gets the
//! intercepting method table.
//!
//! The container owns its Observer through a hidden slot; the Observer
//! only points back weakly. So an Observer lives exactly as long as its
//! value and is never torn down on its own.

use std::cell::Cell;
use std::rc::Rc;

use crate::config;
use crate::value::{Container, Value, WeakContainer};

use super::array::INTERCEPTED_METHODS;
use super::dep::Dep;
use super::property::install_reactive_property;

/// Modes an Observer is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Do not observe nested values.
    pub shallow: bool,
    /// Bookkeeping only, for non-interactive rendering. Sequences keep their
    /// native methods unless `Config::mock_tracks_arrays` is set.
    pub mock: bool,
}

impl ObserveOptions {
    pub fn shallow() -> Self {
        Self {
            shallow: true,
            mock: false,
        }
    }

    pub fn mock() -> Self {
        Self {
            shallow: false,
            mock: true,
        }
    }
}

#[derive(Debug)]
pub struct Observer {
    value: WeakContainer,
    dep: Dep,
    /// Number of component instances using this value as root state.
    vm_count: Cell<usize>,
    shallow: bool,
    mock: bool,
}

impl Observer {
    fn attach(container: &Container, options: ObserveOptions) -> Rc<Observer> {
        let observer = Rc::new(Observer {
            value: container.downgrade(),
            dep: Dep::new(),
            vm_count: Cell::new(0),
            shallow: options.shallow,
            mock: options.mock,
        });
        container.meta().attach_observer(observer.clone());

        match container {
            Container::Array(array) => {
                if !options.mock || config::mock_tracks_arrays() {
                    array.install_methods(&INTERCEPTED_METHODS);
                }
                if !options.shallow {
                    observer.observe_array(&array.to_vec());
                }
            }
            Container::Object(object) => {
                for key in object.keys() {
                    install_reactive_property(object, &key, None, None, options);
                }
            }
        }

        tracing::trace!(
            dep = ?observer.dep.id(),
            shallow = options.shallow,
            mock = options.mock,
            "observer attached"
        );
        observer
    }

    /// The observed container, unless it has already been dropped.
    pub fn value(&self) -> Option<Container> {
        self.value.upgrade()
    }

    /// Structural Dep: notified when keys are added or removed, or when the
    /// sequence is mutated.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    pub fn is_shallow(&self) -> bool {
        self.shallow
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    pub fn options(&self) -> ObserveOptions {
        ObserveOptions {
            shallow: self.shallow,
            mock: self.mock,
        }
    }

    pub fn vm_count(&self) -> usize {
        self.vm_count.get()
    }

    /// Record that a component instance uses this value as its root state.
    pub fn bind_root(&self) {
        self.vm_count.set(self.vm_count.get() + 1);
    }

    pub fn unbind_root(&self) {
        self.vm_count.set(self.vm_count.get().saturating_sub(1));
    }

    /// Observe each element, one level deep. Deeper levels follow because
    /// observing an element converts it in turn.
    pub fn observe_array(&self, items: &[Value]) {
        let options = ObserveOptions {
            shallow: false,
            mock: self.mock,
        };
        for item in items {
            observe_with(item, options);
        }
    }
}

/// Observe `value` with default options.
pub fn observe(value: &Value) -> Option<Rc<Observer>> {
    observe_with(value, ObserveOptions::default())
}

/// Attach an Observer to `value`, or return the one already attached.
///
/// Returns `None` for primitives, and for containers that are not
/// observable right now: raw or non-extensible values, while observation is
/// toggled off, or during server rendering unless `mock` is set.
pub fn observe_with(value: &Value, options: ObserveOptions) -> Option<Rc<Observer>> {
    let container = value.as_container()?;
    if let Some(existing) = container.observer() {
        return Some(existing);
    }

    let eligible = config::should_observe()
        && (options.mock || !config::is_server_rendering())
        && container.is_extensible()
        && !container.is_raw();

    eligible.then(|| Observer::attach(&container, options))
}

/// Make `value` reactive and hand it back.
pub fn observable(value: Value) -> Value {
    observe(&value);
    value
}

/// Observe `value` as the root state of a component instance.
///
/// Root state refuses runtime key additions and removals through the
/// structural helpers.
pub fn bind_root_state(value: &Value) -> Option<Rc<Observer>> {
    let observer = observe(value)?;
    observer.bind_root();
    Some(observer)
}
