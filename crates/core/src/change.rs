//! Change descriptors.
//!
//! A [`Change`] describes one atomic modification of a broadcasting
//! collection. Every collection kind uses the same three variants; only the
//! payload differs:
//!
//! - sets carry a `HashSet<T>` of the affected elements
//! - dictionaries carry a `HashMap<K, V>` of the affected entries
//! - ordered sets carry [`IndexedElements<T>`] and may also emit moves
//!
//! A replacement is expressed as two changes that point at each other: a
//! `Removal` whose `paired_insertion` is set, immediately followed by an
//! `Insertion` whose `paired_removal` is set.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::slice;

/// One atomic content change.
///
/// `M` is the type carried by a move. It defaults to [`Infallible`], which
/// makes `Change::Move` unconstructible for unordered collections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<P, M = Infallible> {
    /// Content was inserted.
    Insertion {
        inserted: P,
        /// Set when this insertion is the second half of a replacement.
        paired_removal: Option<P>,
    },
    /// Content was removed.
    Removal {
        removed: P,
        /// Set when this removal is the first half of a replacement.
        paired_insertion: Option<P>,
    },
    /// A single element changed position. Only ordered collections emit this.
    Move { element: M, from: usize, to: usize },
}

/// The kind of a [`Change`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insertion,
    Removal,
    Move,
}

impl<P, M> Change<P, M> {
    /// Creates a plain insertion.
    #[inline]
    pub fn insertion(inserted: P) -> Self {
        Change::Insertion {
            inserted,
            paired_removal: None,
        }
    }

    /// Creates a plain removal.
    #[inline]
    pub fn removal(removed: P) -> Self {
        Change::Removal {
            removed,
            paired_insertion: None,
        }
    }

    /// Creates a move of `element` from `from` to `to`.
    #[inline]
    pub fn moved(element: M, from: usize, to: usize) -> Self {
        Change::Move { element, from, to }
    }

    /// Returns the kind of this change.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Insertion { .. } => ChangeKind::Insertion,
            Change::Removal { .. } => ChangeKind::Removal,
            Change::Move { .. } => ChangeKind::Move,
        }
    }

    /// Returns true if this change is one half of a replacement.
    pub fn is_replacement(&self) -> bool {
        match self {
            Change::Insertion { paired_removal, .. } => paired_removal.is_some(),
            Change::Removal {
                paired_insertion, ..
            } => paired_insertion.is_some(),
            Change::Move { .. } => false,
        }
    }

    /// Returns the inserted or removed payload. Moves have none.
    pub fn payload(&self) -> Option<&P> {
        match self {
            Change::Insertion { inserted, .. } => Some(inserted),
            Change::Removal { removed, .. } => Some(removed),
            Change::Move { .. } => None,
        }
    }

    /// Converts the payload and the moved element, keeping the change's shape.
    pub fn map<Q, N>(&self, mut f: impl FnMut(&P) -> Q, g: impl FnOnce(&M) -> N) -> Change<Q, N> {
        match self {
            Change::Insertion {
                inserted,
                paired_removal,
            } => Change::Insertion {
                inserted: f(inserted),
                paired_removal: paired_removal.as_ref().map(&mut f),
            },
            Change::Removal {
                removed,
                paired_insertion,
            } => Change::Removal {
                removed: f(removed),
                paired_insertion: paired_insertion.as_ref().map(&mut f),
            },
            Change::Move { element, from, to } => Change::Move {
                element: g(element),
                from: *from,
                to: *to,
            },
        }
    }
}

/// Elements paired with their positions in an ordered collection.
///
/// Entries are kept sorted by ascending index. For insertions the indexes
/// refer to positions after the insertion; for removals they refer to
/// positions before the removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedElements<T> {
    entries: Vec<(usize, T)>,
}

impl<T> Default for IndexedElements<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedElements<T> {
    /// Creates an empty set of indexed elements.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates indexed elements from arbitrary `(index, element)` pairs.
    pub fn from_entries(mut entries: Vec<(usize, T)>) -> Self {
        entries.sort_by_key(|(index, _)| *index);
        Self { entries }
    }

    /// Adds an entry, keeping index order.
    pub fn push(&mut self, index: usize, element: T) {
        let position = self.entries.partition_point(|(i, _)| *i <= index);
        self.entries.insert(position, (index, element));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(index, element)` pairs in ascending index order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, (usize, T)> {
        self.entries.iter()
    }

    /// Returns the indexes in ascending order.
    pub fn indexes(&self) -> Vec<usize> {
        self.entries.iter().map(|(index, _)| *index).collect()
    }

    /// Returns the elements in ascending index order.
    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, element)| element)
    }

    /// Consumes self and returns the sorted entries.
    #[inline]
    pub fn into_entries(self) -> Vec<(usize, T)> {
        self.entries
    }

    /// Converts every element, keeping the indexes.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> IndexedElements<U> {
        IndexedElements {
            entries: self.entries.iter().map(|(i, e)| (*i, f(e))).collect(),
        }
    }
}

impl<T> FromIterator<(usize, T)> for IndexedElements<T> {
    fn from_iter<I: IntoIterator<Item = (usize, T)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a IndexedElements<T> {
    type Item = &'a (usize, T);
    type IntoIter = slice::Iter<'a, (usize, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
