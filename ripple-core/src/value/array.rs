//! Ordered sequences.
//!
//! Every mutating operation is expressed as a [`Mutation`] and dispatched
//! through the array's installed method table. A fresh array uses
//! [`NATIVE_METHODS`]; observing it swaps in the intercepting table, which
//! still delegates to the native one for the actual work.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::TryReserveError;
use std::fmt;
use std::rc::{Rc, Weak};

use super::{ContainerMeta, Value};
use crate::reactive::Observer;

/// Ordering callback for [`Array::sort_by`].
pub type Comparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

/// A mutating sequence operation, with its arguments already normalized.
#[derive(Clone)]
pub enum Mutation {
    Push(Vec<Value>),
    Pop,
    Shift,
    Unshift(Vec<Value>),
    /// `start` is clamped to the length and `delete_count` to what follows it.
    Splice {
        start: usize,
        delete_count: usize,
        items: Vec<Value>,
    },
    Sort(Option<Comparator>),
    Reverse,
}

impl Mutation {
    /// Values this mutation adds to the sequence.
    pub fn inserted(&self) -> &[Value] {
        match self {
            Mutation::Push(items) | Mutation::Unshift(items) | Mutation::Splice { items, .. } => items.as_slice(),
            _ => &[],
        }
    }
}

/// What a mutation hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutput {
    /// New length, from `push` and `unshift`.
    Length(usize),
    /// The element taken off an end, from `pop` and `shift`.
    Removed(Option<Value>),
    /// Deleted elements, from `splice`.
    Spliced(Vec<Value>),
    /// `sort` and `reverse` reorder in place.
    Reordered,
}

/// A table of mutating sequence operations.
pub trait ArrayMethods {
    fn name(&self) -> &'static str;

    fn apply(&self, array: &Array, mutation: Mutation) -> MutationOutput;
}

/// The plain operations, with no side effects beyond the sequence itself.
pub struct NativeMethods;

pub static NATIVE_METHODS: NativeMethods = NativeMethods;

impl ArrayMethods for NativeMethods {
    fn name(&self) -> &'static str {
        "native"
    }

    fn apply(&self, array: &Array, mutation: Mutation) -> MutationOutput {
        match mutation {
            Mutation::Push(items) => {
                let mut data = array.0.items.borrow_mut();
                data.extend(items);
                MutationOutput::Length(data.len())
            }
            Mutation::Pop => MutationOutput::Removed(array.0.items.borrow_mut().pop()),
            Mutation::Shift => {
                let mut data = array.0.items.borrow_mut();
                MutationOutput::Removed(if data.is_empty() { None } else { Some(data.remove(0)) })
            }
            Mutation::Unshift(items) => {
                let mut data = array.0.items.borrow_mut();
                data.splice(0..0, items);
                MutationOutput::Length(data.len())
            }
            Mutation::Splice {
                start,
                delete_count,
                items,
            } => {
                let mut data = array.0.items.borrow_mut();
                let start = start.min(data.len());
                let end = start + delete_count.min(data.len() - start);
                MutationOutput::Spliced(data.splice(start..end, items).collect())
            }
            Mutation::Sort(compare) => {
                // The comparator may read the array or panic, so sort a copy
                // outside the borrow and write it back only once sorted.
                let mut data = array.0.items.borrow().clone();
                match compare {
                    Some(compare) => data.sort_by(|a, b| compare(a, b)),
                    None => data.sort_by_cached_key(|v| v.to_string()),
                }
                *array.0.items.borrow_mut() = data;
                MutationOutput::Reordered
            }
            Mutation::Reverse => {
                array.0.items.borrow_mut().reverse();
                MutationOutput::Reordered
            }
        }
    }
}

pub(crate) struct ArrayInner {
    items: RefCell<Vec<Value>>,
    methods: Cell<&'static dyn ArrayMethods>,
    meta: ContainerMeta,
}

/// An ordered sequence with identity semantics.
///
/// Element reads and index access are never intercepted; only the mutating
/// operations go through the method table.
#[derive(Clone)]
pub struct Array(Rc<ArrayInner>);

impl Array {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayInner {
            items: RefCell::new(items),
            methods: Cell::new(&NATIVE_METHODS),
            meta: ContainerMeta::new(),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<ArrayInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ArrayInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn meta(&self) -> &ContainerMeta {
        &self.0.meta
    }

    /// Swap the method table every mutating operation dispatches through.
    pub(crate) fn install_methods(&self, methods: &'static dyn ArrayMethods) {
        self.0.methods.set(methods);
    }

    /// Name of the installed method table.
    pub fn methods_name(&self) -> &'static str {
        self.0.methods.get().name()
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Iterate over a snapshot, so the array may be mutated meanwhile.
    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.to_vec().into_iter()
    }

    /// Truncate, or pad with `Null`, to exactly `len` elements.
    ///
    /// Like assigning `length`, this bypasses the method table.
    pub fn set_len(&self, len: usize) {
        self.0.items.borrow_mut().resize(len, Value::Null);
    }

    /// [`set_len`](Self::set_len), failing instead of aborting when the
    /// padding cannot be allocated. On failure the array is unchanged.
    pub fn try_set_len(&self, len: usize) -> Result<(), TryReserveError> {
        let mut items = self.0.items.borrow_mut();
        if let Some(extra) = len.checked_sub(items.len()) {
            items.try_reserve_exact(extra)?;
        }
        items.resize(len, Value::Null);
        Ok(())
    }

    fn dispatch(&self, mutation: Mutation) -> MutationOutput {
        let methods = self.0.methods.get();
        methods.apply(self, mutation)
    }

    pub fn push(&self, items: impl IntoIterator<Item = Value>) -> usize {
        match self.dispatch(Mutation::Push(items.into_iter().collect())) {
            MutationOutput::Length(len) => len,
            _ => self.len(),
        }
    }

    pub fn pop(&self) -> Option<Value> {
        match self.dispatch(Mutation::Pop) {
            MutationOutput::Removed(value) => value,
            _ => None,
        }
    }

    pub fn shift(&self) -> Option<Value> {
        match self.dispatch(Mutation::Shift) {
            MutationOutput::Removed(value) => value,
            _ => None,
        }
    }

    pub fn unshift(&self, items: impl IntoIterator<Item = Value>) -> usize {
        match self.dispatch(Mutation::Unshift(items.into_iter().collect())) {
            MutationOutput::Length(len) => len,
            _ => self.len(),
        }
    }

    /// Remove `delete_count` elements at `start` and insert `items` there.
    ///
    /// A negative `start` counts back from the end. `None` deletes everything
    /// from `start` on. Returns the deleted elements.
    pub fn splice(
        &self,
        start: isize,
        delete_count: Option<usize>,
        items: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let len = self.len();
        let start = if start < 0 {
            len.saturating_sub(start.unsigned_abs())
        } else {
            (start as usize).min(len)
        };
        let delete_count = delete_count.unwrap_or(len - start).min(len - start);
        let mutation = Mutation::Splice {
            start,
            delete_count,
            items: items.into_iter().collect(),
        };
        match self.dispatch(mutation) {
            MutationOutput::Spliced(removed) => removed,
            _ => Vec::new(),
        }
    }

    /// Sort by string form.
    pub fn sort(&self) {
        self.dispatch(Mutation::Sort(None));
    }

    pub fn sort_by(&self, compare: impl Fn(&Value, &Value) -> Ordering + 'static) {
        self.dispatch(Mutation::Sort(Some(Rc::new(compare))));
    }

    pub fn reverse(&self) {
        self.dispatch(Mutation::Reverse);
    }

    pub fn is_extensible(&self) -> bool {
        self.meta().is_extensible()
    }

    pub fn prevent_extensions(&self) {
        self.meta().prevent_extensions();
    }

    pub fn is_readonly(&self) -> bool {
        self.meta().is_readonly()
    }

    pub fn mark_readonly(&self) {
        self.meta().mark_readonly();
    }

    pub fn is_raw(&self) -> bool {
        self.meta().is_raw()
    }

    pub fn mark_raw(&self) {
        self.meta().mark_raw();
    }

    /// The observer attached to this array, if any.
    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.meta().observer()
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array@{:p}(len={})", Rc::as_ptr(&self.0), self.len())
    }
}
