//! Host Value Model
//!
//! Plain containers the engine can observe. Rust cannot intercept field
//! access on arbitrary structs, so state lives in this small dynamic model
//! instead: keyed mappings (`Object`) and ordered sequences (`Array`) with
//! identity semantics, plus the usual primitives.
//!
//! Both container kinds are cheap `Rc` handles. Cloning a handle never
//! copies the contents; two handles are "the same value" exactly when they
//! point at the same allocation.

mod array;
mod json;
mod object;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::reactive::Observer;

pub use array::{Array, ArrayMethods, Comparator, Mutation, MutationOutput, NativeMethods, NATIVE_METHODS};
pub use object::{Getter, Object, Property, Setter};

pub(crate) use array::ArrayInner;
pub(crate) use object::ObjectInner;

/// A host value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
    Array(Array),
}

impl Value {
    /// Short name of the value's kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn as_container(&self) -> Option<Container> {
        match self {
            Value::Object(o) => Some(Container::Object(o.clone())),
            Value::Array(a) => Some(Container::Array(a.clone())),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// `Object.is` semantics: like `==`, except `NaN` equals itself and
    /// `0.0` differs from `-0.0`.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    a.is_nan() && b.is_nan()
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self == other,
        }
    }
}

/// Whether writing `new` over `old` counts as a change worth notifying.
///
/// Not deep equality: a container is only "unchanged" when it is the very
/// same container.
pub fn has_changed(old: &Value, new: &Value) -> bool {
    !old.same_value(new)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Array(a) => fmt::Debug::fmt(a, f),
        }
    }
}

/// String form, as used by the default sort order.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if *n == 0.0 => f.write_str("0"),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 => {
                write!(f, "{n:.0}")
            }
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Array(a) => {
                for (i, item) in a.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

/// A property key: a sequence index or a mapping field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The index this key addresses on a sequence, if it is a valid one.
    ///
    /// Names count only in canonical form, so `"3"` is an index and `"03"`
    /// is not.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => name
                .parse::<usize>()
                .ok()
                .filter(|i| i.to_string() == *name),
        }
    }

    /// The property name this key addresses on a mapping.
    pub fn to_name(&self) -> String {
        match self {
            Key::Index(i) => i.to_string(),
            Key::Name(name) => name.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// Negative numbers are never indices; they address a named key instead.
impl From<i32> for Key {
    fn from(index: i32) -> Self {
        match usize::try_from(index) {
            Ok(index) => Key::Index(index),
            Err(_) => Key::Name(index.to_string()),
        }
    }
}

/// An observable container: either kind of handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Object(Object),
    Array(Array),
}

impl Container {
    pub(crate) fn meta(&self) -> &ContainerMeta {
        match self {
            Container::Object(o) => o.meta(),
            Container::Array(a) => a.meta(),
        }
    }

    /// The observer attached to this container, if any.
    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.meta().observer()
    }

    pub fn is_extensible(&self) -> bool {
        self.meta().extensible.get()
    }

    pub fn is_readonly(&self) -> bool {
        self.meta().readonly.get()
    }

    pub fn is_raw(&self) -> bool {
        self.meta().raw.get()
    }

    pub fn to_value(&self) -> Value {
        match self {
            Container::Object(o) => Value::Object(o.clone()),
            Container::Array(a) => Value::Array(a.clone()),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        match self {
            Container::Object(o) => WeakContainer::Object(o.downgrade()),
            Container::Array(a) => WeakContainer::Array(a.downgrade()),
        }
    }
}

/// Non-owning counterpart of [`Container`], held by its observer.
#[derive(Debug, Clone)]
pub(crate) enum WeakContainer {
    Object(Weak<ObjectInner>),
    Array(Weak<ArrayInner>),
}

impl WeakContainer {
    pub(crate) fn upgrade(&self) -> Option<Container> {
        match self {
            WeakContainer::Object(w) => w.upgrade().map(|inner| Container::Object(Object::from_inner(inner))),
            WeakContainer::Array(w) => w.upgrade().map(|inner| Container::Array(Array::from_inner(inner))),
        }
    }
}

/// Bookkeeping shared by both container kinds.
///
/// The observer slot is the hidden back-reference: the container owns its
/// observer, the observer only points back weakly.
#[derive(Debug)]
pub(crate) struct ContainerMeta {
    observer: RefCell<Option<Rc<Observer>>>,
    extensible: Cell<bool>,
    readonly: Cell<bool>,
    raw: Cell<bool>,
}

impl ContainerMeta {
    pub(crate) fn new() -> Self {
        Self {
            observer: RefCell::new(None),
            extensible: Cell::new(true),
            readonly: Cell::new(false),
            raw: Cell::new(false),
        }
    }

    pub(crate) fn observer(&self) -> Option<Rc<Observer>> {
        self.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        *self.observer.borrow_mut() = Some(observer);
    }

    pub(crate) fn is_extensible(&self) -> bool {
        self.extensible.get()
    }

    pub(crate) fn prevent_extensions(&self) {
        self.extensible.set(false);
    }

    pub(crate) fn is_readonly(&self) -> bool {
        self.readonly.get()
    }

    pub(crate) fn mark_readonly(&self) {
        self.readonly.set(true);
    }

    pub(crate) fn is_raw(&self) -> bool {
        self.raw.get()
    }

    pub(crate) fn mark_raw(&self) {
        self.raw.set(true);
    }
}
