//! Herald Incremental - collections kept up to date from other collections.
//!
//! A contents manager owns the logic that derives one editable collection
//! from its sources. It listens to the sources and applies each source
//! change to the managed collection incrementally, falling back to a full
//! recomputation (applied as a diff) when it is attached, resumed, or
//! reconfigured.
//!
//! # Managers
//!
//! - `SetFilter` / `DictionaryFilter`: entries passing a predicate
//! - `SortedProjection`: a set ordered by a comparator
//! - `SetMixer`: union or intersection of several sets
//!
//! # Views
//!
//! - `Republisher`: re-broadcasts another collection's notifications
//! - `SetFacade` / `OrderedSetFacade`: a collection seen through an element conversion
//!
//! # Example
//!
//! ```
//! use herald_collections::EditableSet;
//! use herald_incremental::{ContentsManager, SetMixer};
//!
//! let a: EditableSet<u32> = EditableSet::with_contents((1..=14).collect());
//! let b: EditableSet<u32> = EditableSet::new();
//! let both = EditableSet::new();
//! SetMixer::intersection([a.as_broadcasting(), b.as_broadcasting()]).manage(&both);
//! assert!(both.is_empty());
//!
//! b.add([1, 2, 3]);
//! assert_eq!(both.len(), 3);
//! ```

#![no_std]

extern crate alloc;

pub mod facade;
pub mod manager;
pub mod operators;
pub mod republish;

#[cfg(test)]
mod testing;

pub use facade::{Facade, OrderedSetFacade, SetFacade};
pub use manager::{ContentsManager, ManagerCore};
pub use operators::{DictionaryFilter, MixMode, SetFilter, SetMixer, SortedProjection};
pub use republish::Republisher;
