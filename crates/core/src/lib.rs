//! Herald Core - change descriptors, listeners and transactions.
//!
//! This crate holds the primitives every broadcasting collection is built
//! from. A collection announces each mutation as a [`Change`] to the
//! [`Listener`]s in its [`ListenerRegistry`], wrapping multi-part updates in
//! transaction brackets tracked by a [`TransactionCoordinator`].
//!
//! # Core Concepts
//!
//! - `Change<P, M>`: insertion, removal (optionally paired into a replacement) or move
//! - `Listener`: callback contract with `will_apply` / `did_apply` and kind-specific hooks
//! - `ListenerRegistry`: weakly held listeners, dispatched in registration order
//! - `TransactionCoordinator`: nested transaction depth and counted suspension reasons
//! - `Broadcaster`: registry + coordinator with the will/mutate/did dispatch sequence
//!
//! # Example
//!
//! ```
//! use herald_core::{Broadcaster, Change, FnListener, Notification};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let broadcaster: Broadcaster<u32> = Broadcaster::new();
//! let seen = Rc::new(Cell::new(0));
//! let seen_in_listener = seen.clone();
//! let listener = FnListener::new(move |n: Notification<'_, u32>| {
//!     if let Notification::DidApply(Change::Insertion { inserted, .. }) = n {
//!         seen_in_listener.set(*inserted);
//!     }
//! });
//! broadcaster.add_listener(listener.clone());
//!
//! broadcaster.apply(Change::insertion(42), |_| {});
//! assert_eq!(seen.get(), 42);
//! ```

#![no_std]

extern crate alloc;

pub mod broadcaster;
pub mod change;
pub mod collection;
pub mod counted_set;
mod error;
pub mod listener;
pub mod transaction;

pub use broadcaster::Broadcaster;
pub use change::{Change, ChangeKind, IndexedElements};
pub use collection::{BroadcastingCollection, EditableCollection, ManagerHandle, ManagerSlot};
pub use counted_set::CountedSet;
pub use error::{Error, Result};
pub use listener::{FnListener, Listener, ListenerId, ListenerRegistry, Notification};
pub use transaction::{SuspensionReason, TransactionCoordinator};
