//! Bulk-replace diffing.
//!
//! Each function compares an old and a new snapshot and classifies the
//! difference into disjoint groups. Collections apply the groups in a fixed
//! order: removals, replacements, moves (ordered sets only), insertions.
//! Every group's indexes are valid at the moment that group is applied.

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::{HashMap, HashSet};
use herald_core::IndexedElements;

/// The difference between two sets.
#[derive(Clone, Debug)]
pub struct SetDiff<T> {
    pub removed: HashSet<T>,
    pub inserted: HashSet<T>,
}

impl<T: Eq + Hash> PartialEq for SetDiff<T> {
    fn eq(&self, other: &Self) -> bool {
        self.removed == other.removed && self.inserted == other.inserted
    }
}

impl<T: Eq + Hash> Eq for SetDiff<T> {}

impl<T> SetDiff<T> {
    /// Returns the number of non-empty groups.
    pub fn active_groups(&self) -> usize {
        usize::from(!self.removed.is_empty()) + usize::from(!self.inserted.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active_groups() == 0
    }
}

/// Compares two sets. Sets have no replacement group: a value is its own
/// identity.
pub fn set_diff<T>(old: &HashSet<T>, new: &HashSet<T>) -> SetDiff<T>
where
    T: Clone + Eq + Hash,
{
    SetDiff {
        removed: old.difference(new).cloned().collect(),
        inserted: new.difference(old).cloned().collect(),
    }
}

/// The difference between two dictionaries.
#[derive(Clone, Debug)]
pub struct DictionaryDiff<K, V> {
    pub removed: HashMap<K, V>,
    /// Old entries of keys whose value changed.
    pub replaced: HashMap<K, V>,
    /// New entries of keys whose value changed.
    pub replacements: HashMap<K, V>,
    pub inserted: HashMap<K, V>,
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for DictionaryDiff<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.removed == other.removed
            && self.replaced == other.replaced
            && self.replacements == other.replacements
            && self.inserted == other.inserted
    }
}

impl<K: Eq + Hash, V: Eq> Eq for DictionaryDiff<K, V> {}

impl<K, V> DictionaryDiff<K, V> {
    pub fn active_groups(&self) -> usize {
        usize::from(!self.removed.is_empty())
            + usize::from(!self.replaced.is_empty())
            + usize::from(!self.inserted.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active_groups() == 0
    }
}

impl<K, V> Default for DictionaryDiff<K, V> {
    fn default() -> Self {
        Self {
            removed: HashMap::new(),
            replaced: HashMap::new(),
            replacements: HashMap::new(),
            inserted: HashMap::new(),
        }
    }
}

/// Compares two dictionaries key by key.
pub fn dictionary_diff<K, V>(old: &HashMap<K, V>, new: &HashMap<K, V>) -> DictionaryDiff<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    let mut diff = DictionaryDiff::default();
    for (key, value) in old {
        if !new.contains_key(key) {
            diff.removed.insert(key.clone(), value.clone());
        }
    }
    diff.merge_entries(old, new.iter().map(|(k, v)| (k.clone(), v.clone())));
    diff
}

impl<K, V> DictionaryDiff<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    /// Classifies `entries` against `current` as insertions or replacements,
    /// skipping entries whose value is unchanged.
    pub fn merge_entries(&mut self, current: &HashMap<K, V>, entries: impl IntoIterator<Item = (K, V)>) {
        for (key, value) in entries {
            match current.get(&key) {
                None => {
                    self.inserted.insert(key, value);
                }
                Some(existing) if *existing != value => {
                    self.replaced.insert(key.clone(), existing.clone());
                    self.replacements.insert(key, value);
                }
                Some(_) => {}
            }
        }
    }
}

/// The difference between two ordered sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderedDiff<T> {
    /// Indexes refer to the old array.
    pub removed: IndexedElements<T>,
    /// Old elements replaced in place; indexes refer to the array after
    /// `removed` was applied.
    pub replaced: IndexedElements<T>,
    /// New elements taking the place of `replaced`, at the same indexes.
    pub replacements: IndexedElements<T>,
    /// `(element, from, to)` moves, each relative to the array left by the
    /// previous one.
    pub moves: Vec<(T, usize, usize)>,
    /// Indexes refer to the new array.
    pub inserted: IndexedElements<T>,
}

impl<T> OrderedDiff<T> {
    pub fn active_groups(&self) -> usize {
        usize::from(!self.removed.is_empty())
            + usize::from(!self.replaced.is_empty())
            + usize::from(!self.moves.is_empty())
            + usize::from(!self.inserted.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active_groups() == 0
    }
}

/// Compares two ordered sets.
///
/// A position holding an element that disappears in the old array and an
/// element that appears in the new array is treated as a replacement.
/// Surviving elements whose relative order changed are moved; the elements
/// on a longest increasing subsequence stay put, so the number of moves is
/// minimal.
pub fn ordered_diff<T>(old: &[T], new: &[T]) -> OrderedDiff<T>
where
    T: Clone + Eq + Hash,
{
    let old_set: HashSet<&T> = old.iter().collect();
    let new_set: HashSet<&T> = new.iter().collect();

    let mut paired: HashMap<&T, &T> = HashMap::new();
    for (o, n) in old.iter().zip(new.iter()) {
        if !new_set.contains(o) && !old_set.contains(n) {
            paired.insert(o, n);
        }
    }
    let paired_new: HashSet<&T> = paired.values().copied().collect();

    let mut removed = IndexedElements::new();
    let mut current: Vec<T> = Vec::with_capacity(old.len());
    for (index, element) in old.iter().enumerate() {
        if new_set.contains(element) || paired.contains_key(element) {
            current.push(element.clone());
        } else {
            removed.push(index, element.clone());
        }
    }

    let mut replaced = IndexedElements::new();
    let mut replacements = IndexedElements::new();
    for (index, slot) in current.iter_mut().enumerate() {
        if let Some(&replacement) = paired.get(&*slot) {
            replaced.push(index, slot.clone());
            replacements.push(index, replacement.clone());
            *slot = replacement.clone();
        }
    }

    let target: Vec<T> = new
        .iter()
        .filter(|e| old_set.contains(e) || paired_new.contains(e))
        .cloned()
        .collect();
    let moves = moves_between(current, &target);

    let mut inserted = IndexedElements::new();
    for (index, element) in new.iter().enumerate() {
        if !old_set.contains(element) && !paired_new.contains(element) {
            inserted.push(index, element.clone());
        }
    }

    OrderedDiff {
        removed,
        replaced,
        replacements,
        moves,
        inserted,
    }
}

/// Computes the moves turning `current` into `target`. Both must hold the
/// same elements.
fn moves_between<T>(mut current: Vec<T>, target: &[T]) -> Vec<(T, usize, usize)>
where
    T: Clone + Eq + Hash,
{
    let target_positions: HashMap<&T, usize> =
        target.iter().enumerate().map(|(i, e)| (e, i)).collect();
    let sequence: Vec<usize> = current.iter().map(|e| target_positions[e]).collect();
    let stable: HashSet<usize> = longest_increasing_subsequence(&sequence)
        .into_iter()
        .map(|i| sequence[i])
        .collect();

    let mut moves = Vec::new();
    for (t, element) in target.iter().enumerate() {
        if stable.contains(&t) {
            continue;
        }
        let from = position_of(&current, element);
        let moving = current.remove(from);
        let to = if t == 0 {
            0
        } else {
            position_of(&current, &target[t - 1]) + 1
        };
        current.insert(to, moving);
        if from != to {
            moves.push((element.clone(), from, to));
        }
    }
    moves
}

fn position_of<T: PartialEq>(elements: &[T], element: &T) -> usize {
    elements
        .iter()
        .position(|e| e == element)
        .unwrap_or_else(|| panic!("element vanished while computing moves"))
}

/// Returns the positions in `sequence` of one longest strictly increasing
/// subsequence.
fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
    // tails[k] is the position of the smallest tail of an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = alloc::vec![None; sequence.len()];
    for (i, &value) in sequence.iter().enumerate() {
        let k = tails.partition_point(|&t| sequence[t] < value);
        if k > 0 {
            previous[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }
    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(i);
        cursor = previous[i];
    }
    result.reverse();
    result
}

/// Applies an ordered diff to a plain array. Collections do the same thing
/// step by step between notifications.
pub fn apply_ordered_diff<T: Clone>(elements: &mut Vec<T>, diff: &OrderedDiff<T>) {
    for (index, _) in diff.removed.iter().rev() {
        elements.remove(*index);
    }
    for (index, element) in diff.replacements.iter() {
        elements[*index] = element.clone();
    }
    for (_, from, to) in &diff.moves {
        let moving = elements.remove(*from);
        elements.insert(*to, moving);
    }
    for (index, element) in diff.inserted.iter() {
        elements.insert(*index, element.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn set(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_set_diff_groups() {
        let diff = set_diff(&set(&[1, 2, 3]), &set(&[2, 3, 4]));
        assert_eq!(diff.removed, set(&[1]));
        assert_eq!(diff.inserted, set(&[4]));
        assert_eq!(diff.active_groups(), 2);

        let same = set_diff(&set(&[1, 2]), &set(&[2, 1]));
        assert!(same.is_empty());
    }

    #[test]
    fn test_dictionary_diff_groups() {
        let old: HashMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let new: HashMap<&str, i32> = [("b", 2), ("c", 30), ("d", 4)].into_iter().collect();

        let diff = dictionary_diff(&old, &new);
        assert_eq!(diff.removed.get("a"), Some(&1));
        assert_eq!(diff.replaced.get("c"), Some(&3));
        assert_eq!(diff.replacements.get("c"), Some(&30));
        assert_eq!(diff.inserted.get("d"), Some(&4));
        assert!(!diff.inserted.contains_key("b"));
        assert_eq!(diff.active_groups(), 3);
    }

    #[test]
    fn test_diffs_compare_by_groups() {
        assert_eq!(set_diff(&set(&[1, 2]), &set(&[2, 3])), set_diff(&set(&[1, 5]), &set(&[5, 3])));
        assert_ne!(set_diff(&set(&[1]), &set(&[])), set_diff(&set(&[]), &set(&[1])));

        let old: HashMap<char, u8> = [('a', 1), ('b', 2)].into_iter().collect();
        let new: HashMap<char, u8> = [('a', 1), ('b', 3)].into_iter().collect();
        let mut expected = DictionaryDiff::default();
        expected.replaced.insert('b', 2);
        expected.replacements.insert('b', 3);
        assert_eq!(dictionary_diff(&old, &new), expected);
    }

    #[test]
    fn test_ordered_diff_single_group() {
        let diff = ordered_diff(&[1, 2, 3], &[1, 2, 3, 4]);
        assert_eq!(diff.active_groups(), 1);
        assert_eq!(diff.inserted.indexes(), vec![3]);

        let diff = ordered_diff(&[1, 2, 3], &[1, 3]);
        assert_eq!(diff.active_groups(), 1);
        assert_eq!(diff.removed.indexes(), vec![1]);
    }

    #[test]
    fn test_ordered_diff_replacement_in_place() {
        let diff = ordered_diff(&['a', 'b', 'c'], &['a', 'x', 'c']);
        assert!(diff.removed.is_empty());
        assert!(diff.inserted.is_empty());
        assert_eq!(diff.replaced.iter().cloned().collect::<Vec<_>>(), vec![(1, 'b')]);
        assert_eq!(diff.replacements.iter().cloned().collect::<Vec<_>>(), vec![(1, 'x')]);
    }

    #[test]
    fn test_ordered_diff_moves_are_minimal() {
        let diff = ordered_diff(&[1, 2, 3, 4, 5], &[2, 3, 4, 5, 1]);
        assert_eq!(diff.moves, vec![(1, 0, 4)]);

        let diff = ordered_diff(&[1, 2, 3, 4], &[4, 3, 2, 1]);
        assert_eq!(diff.moves.len(), 3);
    }

    #[test]
    fn test_apply_ordered_diff_reaches_target() {
        let cases: [(&[u32], &[u32]); 4] = [
            (&[1, 2, 3, 4, 5], &[5, 9, 3, 1, 8]),
            (&[], &[1, 2]),
            (&[4, 3], &[]),
            (&[1, 2, 3, 4, 5, 6], &[6, 2, 7, 4, 1]),
        ];
        for (old, new) in cases {
            let diff = ordered_diff(old, new);
            let mut working = old.to_vec();
            apply_ordered_diff(&mut working, &diff);
            assert_eq!(working, new.to_vec());
        }
    }

    #[test]
    fn test_lis() {
        assert_eq!(longest_increasing_subsequence(&[3, 0, 1, 4, 2]).len(), 3);
        assert!(longest_increasing_subsequence(&[]).is_empty());
    }
}
