//! Transaction nesting and suspension bookkeeping.
//!
//! A transaction here is a notification bracket, not an atomicity
//! mechanism: listeners are told that several changes belong to one logical
//! update. Brackets nest; only the outermost begin and end are observable.
//!
//! Suspension reasons are a counted set. Contents managers use them to stop
//! updating while anything (a missing target, a missing source, an explicit
//! stop) prevents them from running.

use crate::counted_set::CountedSet;
use core::cell::{Cell, RefCell};
use core::fmt;

/// A cause that keeps a contents manager from updating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuspensionReason {
    /// The manager is not attached to a managed collection.
    NoManagedContents,
    /// The manager has no source to derive contents from.
    NoContentsSource,
    /// Updating was stopped explicitly.
    Stopped,
    /// An application-defined reason.
    Custom(&'static str),
}

impl fmt::Display for SuspensionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspensionReason::NoManagedContents => write!(f, "no managed contents"),
            SuspensionReason::NoContentsSource => write!(f, "no contents source"),
            SuspensionReason::Stopped => write!(f, "stopped"),
            SuspensionReason::Custom(reason) => write!(f, "{}", reason),
        }
    }
}

/// Tracks open transaction brackets and suspension reasons.
#[derive(Debug, Default)]
pub struct TransactionCoordinator {
    depth: Cell<usize>,
    suspensions: RefCell<CountedSet<SuspensionReason>>,
}

impl TransactionCoordinator {
    /// Creates a coordinator with no open transaction and no suspension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coordinator that starts suspended for `reason`.
    pub fn suspended(reason: SuspensionReason) -> Self {
        let coordinator = Self::new();
        coordinator.suspend(reason);
        coordinator
    }

    /// Opens a transaction. Returns true if this is the outermost one.
    pub fn begin(&self) -> bool {
        let depth = self.depth.get();
        self.depth.set(depth + 1);
        depth == 0
    }

    /// Closes a transaction. Returns true if this closed the outermost one.
    ///
    /// # Panics
    ///
    /// Panics if no transaction is open.
    pub fn end(&self) -> bool {
        let depth = self.depth.get();
        assert!(depth > 0, "ending a transaction that was never begun");
        self.depth.set(depth - 1);
        depth == 1
    }

    /// Returns the number of open transaction brackets.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Returns true while a transaction is open.
    #[inline]
    pub fn in_transaction(&self) -> bool {
        self.depth.get() > 0
    }

    /// Adds a suspension reason. Returns true if this suspended a previously
    /// unsuspended coordinator.
    pub fn suspend(&self, reason: SuspensionReason) -> bool {
        let mut suspensions = self.suspensions.borrow_mut();
        let was_clear = suspensions.is_empty();
        suspensions.insert(reason);
        was_clear
    }

    /// Removes one occurrence of a suspension reason. Returns true if this
    /// lifted the last suspension.
    ///
    /// # Panics
    ///
    /// Panics if `reason` was not added.
    pub fn resume(&self, reason: SuspensionReason) -> bool {
        let mut suspensions = self.suspensions.borrow_mut();
        if suspensions.remove(&reason).is_none() {
            panic!("removing suspension reason `{}` that was never added", reason);
        }
        suspensions.is_empty()
    }

    /// Returns true if `reason` is currently counted.
    pub fn is_suspended_for(&self, reason: SuspensionReason) -> bool {
        self.suspensions.borrow().contains(&reason)
    }

    /// Returns true if at least one suspension reason is present.
    pub fn is_suspended(&self) -> bool {
        !self.suspensions.borrow().is_empty()
    }

    /// Returns true if updates are currently permitted.
    #[inline]
    pub fn updates_permitted(&self) -> bool {
        !self.is_suspended()
    }
}
