//! Errors reported by the structural helpers.
//!
//! None of these are fatal. Every variant means the attempted mutation was
//! skipped; the value tree is left exactly as it was.

use thiserror::Error;

use crate::value::Key;

pub type Result<T> = std::result::Result<T, ObserveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    #[error("cannot {op} reactive property on null or primitive value: {kind}")]
    InvalidTargetKind { op: &'static str, kind: &'static str },

    #[error("operation on key \"{key}\" failed: target is readonly")]
    ReadonlyViolation { key: Key },

    #[error(
        "avoid adding or removing reactive property \"{key}\" on a root state object at runtime; declare it upfront"
    )]
    UnsupportedRootMutation { key: Key },

    #[error("key \"{key}\" is not a valid sequence index")]
    InvalidKey { key: Key },

    #[error("cannot add property \"{key}\": target is not extensible")]
    NotExtensible { key: Key },
}

impl ObserveError {
    /// Emit this error as a diagnostic (if verbose) and hand it back.
    pub(crate) fn reported(self) -> Self {
        crate::config::report(&self);
        self
    }
}
