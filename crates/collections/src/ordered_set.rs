//! Broadcasting ordered sets.
//!
//! An ordered set holds unique elements at defined positions. Its changes
//! carry [`IndexedElements`]: insertion indexes are positions after the
//! insertion, removal indexes are positions before the removal. Moving a
//! single element is its own change kind.

use crate::diff::{ordered_diff, OrderedDiff};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::hash::Hash;
use hashbrown::HashSet;
use herald_core::{
    Broadcaster, BroadcastingCollection, Change, EditableCollection, Error, IndexedElements,
    Listener, ManagerHandle, ManagerSlot, Result,
};
use log::trace;

/// A change to an ordered set.
pub type OrderedSetChange<T> = Change<IndexedElements<T>, T>;

struct Elements<T> {
    order: Vec<T>,
    members: HashSet<T>,
}

impl<T> Elements<T>
where
    T: Clone + Eq + Hash,
{
    fn new(order: Vec<T>) -> Self {
        let mut members = HashSet::with_capacity(order.len());
        let order: Vec<T> = order
            .into_iter()
            .filter(|e| members.insert(e.clone()))
            .collect();
        Self { order, members }
    }

    fn index_of(&self, element: &T) -> Option<usize> {
        if !self.members.contains(element) {
            return None;
        }
        self.order.iter().position(|e| e == element)
    }
}

struct OrderedSetState<T> {
    elements: RefCell<Elements<T>>,
    broadcaster: Broadcaster<IndexedElements<T>, T>,
    manager: ManagerSlot,
}

impl<T> OrderedSetState<T>
where
    T: Clone + Eq + Hash,
{
    fn apply(&self, change: OrderedSetChange<T>) {
        self.broadcaster.apply(change, |change| {
            let mut elements = self.elements.borrow_mut();
            let Elements { order, members } = &mut *elements;
            match change {
                Change::Insertion { inserted, .. } => {
                    for (index, element) in inserted {
                        order.insert(*index, element.clone());
                        members.insert(element.clone());
                    }
                }
                Change::Removal { removed, .. } => {
                    for (index, element) in removed.iter().rev() {
                        order.remove(*index);
                        members.remove(element);
                    }
                }
                Change::Move { from, to, .. } => {
                    let moving = order.remove(*from);
                    order.insert(*to, moving);
                }
            }
        });
    }

    fn apply_diff(&self, diff: OrderedDiff<T>) {
        if diff.is_empty() {
            return;
        }
        trace!(
            "ordered set update: {} removed, {} replaced, {} moved, {} inserted",
            diff.removed.len(),
            diff.replaced.len(),
            diff.moves.len(),
            diff.inserted.len()
        );
        let bracket = diff.active_groups() > 1;
        let OrderedDiff {
            removed,
            replaced,
            replacements,
            moves,
            inserted,
        } = diff;
        self.broadcaster.bracketed(bracket, || {
            if !removed.is_empty() {
                self.apply(Change::removal(removed));
            }
            if !replaced.is_empty() {
                self.apply(Change::Removal {
                    removed: replaced.clone(),
                    paired_insertion: Some(replacements.clone()),
                });
                self.apply(Change::Insertion {
                    inserted: replacements,
                    paired_removal: Some(replaced),
                });
            }
            for (element, from, to) in moves {
                self.apply(Change::moved(element, from, to));
            }
            if !inserted.is_empty() {
                self.apply(Change::insertion(inserted));
            }
        });
    }

    fn append(&self, new: impl IntoIterator<Item = T>) {
        let inserted = {
            let elements = self.elements.borrow();
            let mut seen = HashSet::new();
            let mut inserted = IndexedElements::new();
            let mut index = elements.order.len();
            for element in new {
                if elements.members.contains(&element) || !seen.insert(element.clone()) {
                    continue;
                }
                inserted.push(index, element);
                index += 1;
            }
            inserted
        };
        if !inserted.is_empty() {
            self.apply(Change::insertion(inserted));
        }
    }

    fn insert(&self, inserted: IndexedElements<T>) -> Result<()> {
        if inserted.is_empty() {
            return Ok(());
        }
        {
            let elements = self.elements.borrow();
            let final_len = elements.order.len() + inserted.len();
            let mut seen = HashSet::new();
            let mut previous: Option<usize> = None;
            for (index, element) in &inserted {
                if *index >= final_len || previous == Some(*index) {
                    return Err(Error::index_out_of_bounds(*index, final_len));
                }
                if elements.members.contains(element) || !seen.insert(element) {
                    return Err(Error::duplicate_element());
                }
                previous = Some(*index);
            }
        }
        self.apply(Change::insertion(inserted));
        Ok(())
    }

    fn remove(&self, gone: impl IntoIterator<Item = T>) {
        let removed: IndexedElements<T> = {
            let elements = self.elements.borrow();
            let gone: HashSet<T> = gone
                .into_iter()
                .filter(|e| elements.members.contains(e))
                .collect();
            elements
                .order
                .iter()
                .enumerate()
                .filter(|(_, e)| gone.contains(*e))
                .map(|(i, e)| (i, e.clone()))
                .collect()
        };
        if !removed.is_empty() {
            self.apply(Change::removal(removed));
        }
    }

    fn remove_at(&self, indexes: impl IntoIterator<Item = usize>) -> Result<()> {
        let removed: IndexedElements<T> = {
            let elements = self.elements.borrow();
            let len = elements.order.len();
            let mut unique: Vec<usize> = indexes.into_iter().collect();
            unique.sort_unstable();
            unique.dedup();
            if let Some(&index) = unique.iter().find(|&&i| i >= len) {
                return Err(Error::index_out_of_bounds(index, len));
            }
            unique
                .into_iter()
                .map(|i| (i, elements.order[i].clone()))
                .collect()
        };
        if !removed.is_empty() {
            self.apply(Change::removal(removed));
        }
        Ok(())
    }

    fn move_element(&self, from: usize, to: usize) -> Result<()> {
        let element = {
            let elements = self.elements.borrow();
            let len = elements.order.len();
            if from >= len || to >= len {
                return Err(Error::invalid_move(from, to, len));
            }
            elements.order[from].clone()
        };
        if from != to {
            self.apply(Change::moved(element, from, to));
        }
        Ok(())
    }

    fn set_contents(&self, new: Vec<T>) {
        let new = Elements::new(new).order;
        let diff = ordered_diff(&self.elements.borrow().order, &new);
        self.apply_diff(diff);
    }
}

/// A read-only handle onto a broadcasting ordered set.
pub struct BroadcastingOrderedSet<T> {
    state: Rc<OrderedSetState<T>>,
}

impl<T> Clone for BroadcastingOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> BroadcastingOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    pub fn contains(&self, element: &T) -> bool {
        self.state.elements.borrow().members.contains(element)
    }

    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.state.elements.borrow().index_of(element)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.state.elements.borrow().order.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.elements.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.elements.borrow().order.is_empty()
    }

    /// Runs `f` against the current order without copying it.
    pub fn inspect<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state.elements.borrow().order)
    }
}

impl<T> BroadcastingCollection for BroadcastingOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    type Contents = Vec<T>;
    type Payload = IndexedElements<T>;
    type Moved = T;

    fn contents(&self) -> Vec<T> {
        self.state.elements.borrow().order.clone()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<IndexedElements<T>, T>>) {
        self.state.broadcaster.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<IndexedElements<T>, T>) {
        self.state.broadcaster.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.state.broadcaster.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.state.broadcaster.ongoing_transactions()
    }
}

/// A mutable broadcasting ordered set.
///
/// # Example
///
/// ```
/// use herald_collections::EditableOrderedSet;
/// use herald_core::BroadcastingCollection;
///
/// let list = EditableOrderedSet::with_contents(vec!['a', 'b', 'c']);
/// list.move_element(0, 2).unwrap();
/// assert_eq!(list.contents(), vec!['b', 'c', 'a']);
///
/// list.set_contents(vec!['c', 'x', 'b']);
/// assert_eq!(list.contents(), vec!['c', 'x', 'b']);
/// ```
pub struct EditableOrderedSet<T> {
    set: BroadcastingOrderedSet<T>,
}

impl<T> Clone for EditableOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
        }
    }
}

impl<T> Default for EditableOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EditableOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_contents(Vec::new())
    }

    /// Creates an ordered set with initial contents. Later duplicates are
    /// dropped. No notification is sent.
    pub fn with_contents(contents: Vec<T>) -> Self {
        Self {
            set: BroadcastingOrderedSet {
                state: Rc::new(OrderedSetState {
                    elements: RefCell::new(Elements::new(contents)),
                    broadcaster: Broadcaster::new(),
                    manager: ManagerSlot::new(),
                }),
            },
        }
    }

    pub fn as_broadcasting(&self) -> BroadcastingOrderedSet<T> {
        self.set.clone()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.set.contains(element)
    }

    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.set.index_of(element)
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.set.get(index)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Appends the elements not already present, as one insertion.
    pub fn add(&self, elements: impl IntoIterator<Item = T>) {
        self.set.state.append(elements);
    }

    /// Inserts elements at explicit positions (positions after insertion).
    pub fn insert(&self, elements: IndexedElements<T>) -> Result<()> {
        self.set.state.insert(elements)
    }

    pub fn insert_at(&self, index: usize, element: T) -> Result<()> {
        self.insert(IndexedElements::from_entries(alloc::vec![(index, element)]))
    }

    /// Removes the elements that are present, as one removal.
    pub fn remove(&self, elements: impl IntoIterator<Item = T>) {
        self.set.state.remove(elements);
    }

    /// Removes the elements at `indexes` (positions before removal).
    pub fn remove_at(&self, indexes: impl IntoIterator<Item = usize>) -> Result<()> {
        self.set.state.remove_at(indexes)
    }

    /// Moves one element. Moving an element onto its own position is a no-op.
    pub fn move_element(&self, from: usize, to: usize) -> Result<()> {
        self.set.state.move_element(from, to)
    }

    /// Replaces the whole contents. Later duplicates in `contents` are dropped.
    pub fn set_contents(&self, contents: Vec<T>) {
        self.set.state.set_contents(contents);
    }

    pub fn contents_manager_attached(&self) -> bool {
        self.set.state.manager.is_attached()
    }
}

impl<T> From<&EditableOrderedSet<T>> for BroadcastingOrderedSet<T> {
    fn from(set: &EditableOrderedSet<T>) -> Self {
        set.set.clone()
    }
}

impl<T> BroadcastingCollection for EditableOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    type Contents = Vec<T>;
    type Payload = IndexedElements<T>;
    type Moved = T;

    fn contents(&self) -> Vec<T> {
        self.set.contents()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<IndexedElements<T>, T>>) {
        self.set.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<IndexedElements<T>, T>) {
        self.set.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.set.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.set.ongoing_transactions()
    }
}

/// A non-owning handle to an [`EditableOrderedSet`].
pub struct WeakOrderedSet<T> {
    state: Weak<OrderedSetState<T>>,
}

impl<T> Clone for WeakOrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> EditableCollection for EditableOrderedSet<T>
where
    T: Clone + Eq + Hash,
{
    type WeakHandle = WeakOrderedSet<T>;

    fn downgrade(&self) -> WeakOrderedSet<T> {
        WeakOrderedSet {
            state: Rc::downgrade(&self.set.state),
        }
    }

    fn upgrade(handle: &WeakOrderedSet<T>) -> Option<Self> {
        handle.state.upgrade().map(|state| Self {
            set: BroadcastingOrderedSet { state },
        })
    }

    fn set_contents(&self, contents: Vec<T>) {
        EditableOrderedSet::set_contents(self, contents);
    }

    fn begin_transaction(&self) {
        self.set.state.broadcaster.begin_transaction();
    }

    fn end_transaction(&self) {
        self.set.state.broadcaster.end_transaction();
    }

    fn set_contents_manager(&self, manager: Option<Rc<dyn ManagerHandle>>) {
        self.set.state.manager.replace(manager);
    }

    fn contents_manager(&self) -> Option<Rc<dyn ManagerHandle>> {
        self.set.state.manager.get()
    }
}
