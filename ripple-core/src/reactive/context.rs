//! Active-Subscriber Stack
//!
//! The stack tracks which subscriber is currently evaluating. Reactive
//! getters consult its top entry: if a subscriber is there, the property's
//! Dep is registered with it.
//!
//! # Implementation
//!
//! We use a thread-local stack. When a subscriber starts evaluating it is
//! pushed; when the evaluation ends it is popped. Nested evaluations (a
//! computed value read from inside a render) follow ordinary stack
//! discipline.
//!
//! An entry may also be empty. Pushing an empty entry opens an untracked
//! section: reads inside it register nothing, even when an outer
//! subscriber is evaluating.
//!
//! Prefer the [`ActiveSubscriber`] guard over the raw push/pop pair. The
//! guard pops on drop, which also happens while unwinding from a panic, so
//! the stack can never be left corrupted by a failing evaluation.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static SUBSCRIBER_STACK: RefCell<Vec<Option<Rc<dyn Subscriber>>>> = const { RefCell::new(Vec::new()) };
}

/// Push an entry onto the active-subscriber stack.
///
/// `None` opens an untracked section.
pub fn push_active_subscriber(subscriber: Option<Rc<dyn Subscriber>>) {
    SUBSCRIBER_STACK.with(|stack| stack.borrow_mut().push(subscriber));
}

/// Pop the top entry off the active-subscriber stack.
pub fn pop_active_subscriber() -> Option<Rc<dyn Subscriber>> {
    SUBSCRIBER_STACK.with(|stack| stack.borrow_mut().pop().flatten())
}

/// The subscriber currently evaluating, if any.
pub fn current_subscriber() -> Option<Rc<dyn Subscriber>> {
    SUBSCRIBER_STACK.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Whether reads right now would register a dependency.
pub fn is_tracking() -> bool {
    SUBSCRIBER_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
}

/// Depth of the stack, untracked entries included.
pub fn depth() -> usize {
    SUBSCRIBER_STACK.with(|stack| stack.borrow().len())
}

/// Guard that pops the stack when dropped.
pub struct ActiveSubscriber {
    subscriber_id: Option<SubscriberId>,
}

impl ActiveSubscriber {
    /// Make `subscriber` the active one until the guard is dropped.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.id());
        push_active_subscriber(Some(subscriber));
        Self { subscriber_id }
    }

    /// Suspend dependency collection until the guard is dropped.
    pub fn untracked() -> Self {
        push_active_subscriber(None);
        Self { subscriber_id: None }
    }
}

impl Drop for ActiveSubscriber {
    fn drop(&mut self) {
        let popped = SUBSCRIBER_STACK.with(|stack| stack.borrow_mut().pop());

        // Verify we're popping the right entry.
        // This helps catch raw pushes and pops that are not balanced.
        if let Some(entry) = popped {
            debug_assert_eq!(
                entry.map(|s| s.id()),
                self.subscriber_id,
                "ActiveSubscriber mismatch"
            );
        }
    }
}
