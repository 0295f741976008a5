//! Notification dispatch shared by every broadcasting collection.

use crate::change::Change;
use crate::listener::{Listener, ListenerRegistry};
use crate::transaction::TransactionCoordinator;
use alloc::rc::Rc;
use core::convert::Infallible;
use log::trace;

/// Owns the listeners and transaction depth of one collection and sends
/// notifications in the required order.
///
/// `Broadcaster` holds no collection state of its own. Callers pass the
/// mutation as a closure to [`Broadcaster::apply`], which runs it between the
/// `will_apply` and `did_apply` notifications.
pub struct Broadcaster<P, M = Infallible> {
    listeners: ListenerRegistry<P, M>,
    transactions: TransactionCoordinator,
}

impl<P, M> Default for Broadcaster<P, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, M> Broadcaster<P, M> {
    /// Creates a broadcaster with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            transactions: TransactionCoordinator::new(),
        }
    }

    #[inline]
    pub fn listeners(&self) -> &ListenerRegistry<P, M> {
        &self.listeners
    }

    #[inline]
    pub fn transactions(&self) -> &TransactionCoordinator {
        &self.transactions
    }

    pub fn add_listener(&self, listener: Rc<dyn Listener<P, M>>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &dyn Listener<P, M>) {
        self.listeners.remove(listener);
    }

    #[inline]
    pub fn has_listeners(&self) -> bool {
        self.listeners.has_listeners()
    }

    /// Returns the number of open transaction brackets.
    #[inline]
    pub fn ongoing_transactions(&self) -> usize {
        self.transactions.depth()
    }

    /// Opens a transaction bracket, notifying listeners if it is the
    /// outermost one.
    pub fn begin_transaction(&self) {
        if self.transactions.begin() {
            trace!("transaction opened");
            self.listeners.for_each(|l| l.will_begin_transactions());
        }
    }

    /// Closes a transaction bracket, notifying listeners if it was the
    /// outermost one.
    pub fn end_transaction(&self) {
        if self.transactions.end() {
            trace!("transaction closed");
            self.listeners.for_each(|l| l.did_end_transactions());
        }
    }

    /// Runs `body` inside a transaction bracket when `bracket` is true, or
    /// plainly otherwise.
    pub fn bracketed<R>(&self, bracket: bool, body: impl FnOnce() -> R) -> R {
        if bracket {
            self.begin_transaction();
        }
        let result = body();
        if bracket {
            self.end_transaction();
        }
        result
    }

    /// Announces `change`, applies it with `mutate`, then announces that it
    /// was applied.
    pub fn apply(&self, change: Change<P, M>, mutate: impl FnOnce(&Change<P, M>)) {
        self.listeners.for_each(|l| l.will_apply(&change));
        mutate(&change);
        self.listeners.for_each(|l| l.did_apply(&change));
    }

    /// Forwards an already-applied notification pair from another collection.
    pub fn will_apply(&self, change: &Change<P, M>) {
        self.listeners.for_each(|l| l.will_apply(change));
    }

    pub fn did_apply(&self, change: &Change<P, M>) {
        self.listeners.for_each(|l| l.did_apply(change));
    }
}
