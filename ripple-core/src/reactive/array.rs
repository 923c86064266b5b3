//! Sequence Mutation Interceptor
//!
//! Method table installed on observed arrays. Each mutation runs natively
//! first; afterwards any inserted elements are observed and the array's
//! structural Dep is notified. Callers get back exactly what the native
//! operation returned.

use crate::value::{Array, ArrayMethods, Mutation, MutationOutput, NATIVE_METHODS};

use super::dep::{ArrayOp, NotifyMeta, TriggerKind};

pub struct InterceptedMethods;

pub static INTERCEPTED_METHODS: InterceptedMethods = InterceptedMethods;

fn op_of(mutation: &Mutation) -> ArrayOp {
    match mutation {
        Mutation::Push(_) => ArrayOp::Push,
        Mutation::Pop => ArrayOp::Pop,
        Mutation::Shift => ArrayOp::Shift,
        Mutation::Unshift(_) => ArrayOp::Unshift,
        Mutation::Splice { .. } => ArrayOp::Splice,
        Mutation::Sort(_) => ArrayOp::Sort,
        Mutation::Reverse => ArrayOp::Reverse,
    }
}

impl ArrayMethods for InterceptedMethods {
    fn name(&self) -> &'static str {
        "intercepted"
    }

    fn apply(&self, array: &Array, mutation: Mutation) -> MutationOutput {
        let op = op_of(&mutation);
        let inserted = mutation.inserted().to_vec();
        let result = NATIVE_METHODS.apply(array, mutation);

        if let Some(observer) = array.observer() {
            if !inserted.is_empty() {
                observer.observe_array(&inserted);
            }
            observer
                .dep()
                .notify(NotifyMeta::new(TriggerKind::Array(op)).with_inserted(inserted));
        }
        result
    }
}
