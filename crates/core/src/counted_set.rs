//! A multiset that counts how many times each element was added.

use core::hash::Hash;
use hashbrown::HashMap;

/// Counts insertions per element. An element stays in the set until it has
/// been removed as many times as it was inserted.
#[derive(Clone, Debug)]
pub struct CountedSet<T> {
    counts: HashMap<T, usize>,
}

impl<T> Default for CountedSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CountedSet<T>
where
    T: Eq + Hash,
{
    /// Creates an empty counted set.
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Adds one occurrence of `element`. Returns the new count.
    pub fn insert(&mut self, element: T) -> usize {
        let count = self.counts.entry(element).or_insert(0);
        *count += 1;
        *count
    }

    /// Removes one occurrence of `element`. Returns the remaining count, or
    /// `None` if the element was not present.
    pub fn remove(&mut self, element: &T) -> Option<usize> {
        let count = self.counts.get_mut(element)?;
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(element);
        }
        Some(remaining)
    }

    /// Returns how many times `element` is currently counted.
    #[inline]
    pub fn count(&self, element: &T) -> usize {
        self.counts.get(element).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, element: &T) -> bool {
        self.counts.contains_key(element)
    }

    /// Returns the number of distinct elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over distinct elements and their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&T, usize)> {
        self.counts.iter().map(|(e, c)| (e, *c))
    }
}
