//! Keyed mappings.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{ContainerMeta, Value};
use crate::reactive::Observer;

/// Accessor read hook. Receives the object the property lives on.
pub type Getter = Rc<dyn Fn(&Object) -> Value>;

/// Accessor write hook.
pub type Setter = Rc<dyn Fn(&Object, Value)>;

/// An own property of an [`Object`].
#[derive(Clone)]
pub enum Property {
    Data {
        value: Value,
        configurable: bool,
    },
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
        configurable: bool,
    },
}

impl Property {
    /// A plain, configurable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Property::Data {
            value: value.into(),
            configurable: true,
        }
    }

    /// A configurable accessor property.
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        Property::Accessor {
            get,
            set,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Mark the property as non-configurable. It can then be neither
    /// redefined nor removed.
    pub fn sealed(mut self) -> Self {
        match &mut self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => {
                *configurable = false
            }
        }
        self
    }

    pub fn getter(&self) -> Option<Getter> {
        match self {
            Property::Accessor { get, .. } => get.clone(),
            Property::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<Setter> {
        match self {
            Property::Accessor { set, .. } => set.clone(),
            Property::Data { .. } => None,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Data { value, configurable } => f
                .debug_struct("Data")
                .field("value", value)
                .field("configurable", configurable)
                .finish(),
            Property::Accessor { get, set, configurable } => f
                .debug_struct("Accessor")
                .field("get", &get.is_some())
                .field("set", &set.is_some())
                .field("configurable", configurable)
                .finish(),
        }
    }
}

pub(crate) struct ObjectInner {
    props: RefCell<IndexMap<String, Property>>,
    meta: ContainerMeta,
}

/// A keyed mapping with identity semantics.
///
/// Property order is insertion order. Borrows of the property table never
/// outlive a single call, so accessors are free to read and write the same
/// object re-entrantly.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    pub fn new() -> Self {
        Self(Rc::new(ObjectInner {
            props: RefCell::new(IndexMap::new()),
            meta: ContainerMeta::new(),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<ObjectInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ObjectInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn meta(&self) -> &ContainerMeta {
        &self.0.meta
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Read a property, running its getter if it is an accessor.
    ///
    /// An accessor without a getter reads as `Null`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let prop = self.descriptor(key)?;
        Some(match prop {
            Property::Data { value, .. } => value,
            Property::Accessor { get: Some(get), .. } => get(self),
            Property::Accessor { get: None, .. } => Value::Null,
        })
    }

    /// Plain assignment.
    ///
    /// Runs the setter of an accessor, overwrites a data property, or adds a
    /// new data property if the object is extensible. Writes to accessors
    /// without a setter are dropped.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.descriptor(key) {
            Some(Property::Accessor { set: Some(set), .. }) => set(self, value),
            Some(Property::Accessor { set: None, .. }) => {}
            Some(Property::Data { .. }) => {
                if let Some(Property::Data { value: slot, .. }) = self.0.props.borrow_mut().get_mut(key) {
                    *slot = value;
                }
            }
            None => {
                if self.is_extensible() {
                    self.0.props.borrow_mut().insert(key.to_owned(), Property::data(value));
                }
            }
        }
    }

    /// Define or redefine an own property.
    ///
    /// Returns `false` without touching anything when the existing property
    /// is non-configurable, or when adding to a non-extensible object.
    pub fn define_property(&self, key: &str, prop: Property) -> bool {
        let mut props = self.0.props.borrow_mut();
        match props.get_mut(key) {
            Some(existing) if !existing.is_configurable() => false,
            Some(existing) => {
                *existing = prop;
                true
            }
            None if !self.meta().is_extensible() => false,
            None => {
                props.insert(key.to_owned(), prop);
                true
            }
        }
    }

    /// A copy of the own property stored under `key`.
    pub fn descriptor(&self, key: &str) -> Option<Property> {
        self.0.props.borrow().get(key).cloned()
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    /// Delete an own property. Non-configurable properties stay.
    pub fn remove(&self, key: &str) -> bool {
        let mut props = self.0.props.borrow_mut();
        match props.get(key) {
            Some(prop) if prop.is_configurable() => {
                props.shift_remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.props.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_extensible(&self) -> bool {
        self.meta().is_extensible()
    }

    /// Forbid adding new properties. Also makes the object ineligible for
    /// observation.
    pub fn prevent_extensions(&self) {
        self.meta().prevent_extensions();
    }

    pub fn is_readonly(&self) -> bool {
        self.meta().is_readonly()
    }

    /// Flag the object as read-only for the structural helpers.
    pub fn mark_readonly(&self) {
        self.meta().mark_readonly();
    }

    pub fn is_raw(&self) -> bool {
        self.meta().is_raw()
    }

    /// Exempt the object from observation.
    pub fn mark_raw(&self) {
        self.meta().mark_raw();
    }

    /// The observer attached to this object, if any.
    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.meta().observer()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut props = object.0.props.borrow_mut();
            for (key, value) in iter {
                props.insert(key.into(), Property::data(value));
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys only: values may be accessors or cycle back to this object.
        write!(f, "Object@{:p} ", Rc::as_ptr(&self.0))?;
        f.debug_set().entries(self.0.props.borrow().keys()).finish()
    }
}
