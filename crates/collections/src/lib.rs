//! Herald Collections - observable sets, dictionaries and ordered sets.
//!
//! Every mutation of an editable collection is announced to its listeners
//! as a [`Change`](herald_core::Change): `will_apply` before the contents
//! change, `did_apply` after. Replacing the whole contents computes the
//! minimal difference and announces it group by group, inside one
//! transaction bracket when more than one group is involved.
//!
//! # Collections
//!
//! - `EditableSet` / `BroadcastingSet`: unordered unique elements
//! - `EditableDictionary` / `BroadcastingDictionary`: unique keys to values
//! - `EditableOrderedSet` / `BroadcastingOrderedSet`: unique elements with positions
//!
//! The `Broadcasting*` types are read-only handles onto the same state as
//! their editable counterpart.
//!
//! # Example
//!
//! ```
//! use herald_collections::{EditableSet, HashSet};
//! use herald_core::{BroadcastingCollection, FnListener, Notification};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let set: EditableSet<u32> = EditableSet::with_contents([1, 2, 3].into_iter().collect());
//! let brackets = Rc::new(Cell::new(0));
//! let counter = brackets.clone();
//! let listener = FnListener::new(move |n: Notification<'_, HashSet<u32>>| {
//!     if let Notification::WillBeginTransactions = n {
//!         counter.set(counter.get() + 1);
//!     }
//! });
//! set.add_listener(listener.clone());
//!
//! // One removal group and one insertion group: bracketed once.
//! set.set_contents([2, 3, 4].into_iter().collect());
//! assert_eq!(brackets.get(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod diff;
pub mod dictionary;
pub mod ordered_set;
pub mod set;

#[cfg(test)]
mod testing;

pub use diff::{dictionary_diff, ordered_diff, set_diff, DictionaryDiff, OrderedDiff, SetDiff};
pub use dictionary::{BroadcastingDictionary, DictionaryChange, EditableDictionary, WeakDictionary};
pub use ordered_set::{BroadcastingOrderedSet, EditableOrderedSet, OrderedSetChange, WeakOrderedSet};
pub use set::{BroadcastingSet, EditableSet, SetChange, WeakSet};

// Re-export the collection types used in payloads
pub use hashbrown::{HashMap, HashSet};
