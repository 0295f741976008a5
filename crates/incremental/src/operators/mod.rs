//! Contents managers that derive one collection from others.
//!
//! - `SetFilter` / `DictionaryFilter`: keep the source entries passing a predicate
//! - `SortedProjection`: orders a set with a comparator
//! - `SetMixer`: union or intersection of any number of sets

mod filter;
mod mix;
mod sort;

pub use filter::{DictionaryFilter, SetFilter};
pub use mix::{MixMode, SetMixer};
pub use sort::SortedProjection;

use herald_core::EditableCollection;

/// Runs `body` inside one transaction bracket of `collection` when `bracket`
/// is true.
pub(crate) fn bracketed<C: EditableCollection>(collection: &C, bracket: bool, body: impl FnOnce()) {
    if bracket {
        collection.perform_transaction(body);
    } else {
        body();
    }
}
