//! Broadcasting sets.
//!
//! [`EditableSet`] is the mutable, owning side; [`BroadcastingSet`] is a
//! read-only handle onto the same set that can be given to observers and
//! contents managers. Both are cheap to clone and share one state.

use crate::diff::set_diff;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::hash::Hash;
use hashbrown::HashSet;
use herald_core::{
    Broadcaster, BroadcastingCollection, Change, EditableCollection, Listener, ManagerHandle,
    ManagerSlot,
};
use log::trace;

/// A change to a set.
pub type SetChange<T> = Change<HashSet<T>>;

struct SetState<T> {
    contents: RefCell<HashSet<T>>,
    broadcaster: Broadcaster<HashSet<T>>,
    manager: ManagerSlot,
}

impl<T> SetState<T>
where
    T: Clone + Eq + Hash,
{
    fn new(contents: HashSet<T>) -> Self {
        Self {
            contents: RefCell::new(contents),
            broadcaster: Broadcaster::new(),
            manager: ManagerSlot::new(),
        }
    }

    fn apply(&self, change: SetChange<T>) {
        self.broadcaster.apply(change, |change| {
            let mut contents = self.contents.borrow_mut();
            match change {
                Change::Insertion { inserted, .. } => {
                    contents.extend(inserted.iter().cloned());
                }
                Change::Removal { removed, .. } => {
                    for element in removed {
                        contents.remove(element);
                    }
                }
                Change::Move { element, .. } => match *element {},
            }
        });
    }

    fn add(&self, elements: impl IntoIterator<Item = T>) {
        let inserted: HashSet<T> = {
            let contents = self.contents.borrow();
            elements
                .into_iter()
                .filter(|e| !contents.contains(e))
                .collect()
        };
        if !inserted.is_empty() {
            self.apply(Change::insertion(inserted));
        }
    }

    fn remove(&self, elements: impl IntoIterator<Item = T>) {
        let removed: HashSet<T> = {
            let contents = self.contents.borrow();
            elements
                .into_iter()
                .filter(|e| contents.contains(e))
                .collect()
        };
        if !removed.is_empty() {
            self.apply(Change::removal(removed));
        }
    }

    fn set_contents(&self, new: HashSet<T>) {
        let diff = set_diff(&self.contents.borrow(), &new);
        if diff.is_empty() {
            return;
        }
        trace!(
            "set contents: {} removed, {} inserted",
            diff.removed.len(),
            diff.inserted.len()
        );
        self.broadcaster.bracketed(diff.active_groups() > 1, || {
            if !diff.removed.is_empty() {
                self.apply(Change::removal(diff.removed));
            }
            if !diff.inserted.is_empty() {
                self.apply(Change::insertion(diff.inserted));
            }
        });
    }
}

/// A read-only handle onto a broadcasting set.
pub struct BroadcastingSet<T> {
    state: Rc<SetState<T>>,
}

impl<T> Clone for BroadcastingSet<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> BroadcastingSet<T>
where
    T: Clone + Eq + Hash,
{
    #[inline]
    pub fn contains(&self, element: &T) -> bool {
        self.state.contents.borrow().contains(element)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.state.contents.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.contents.borrow().is_empty()
    }

    /// Runs `f` against the current contents without copying them.
    ///
    /// The set must not be mutated from inside `f`.
    pub fn inspect<R>(&self, f: impl FnOnce(&HashSet<T>) -> R) -> R {
        f(&self.state.contents.borrow())
    }

    /// Returns true if both handles refer to the same set.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<T> BroadcastingCollection for BroadcastingSet<T>
where
    T: Clone + Eq + Hash,
{
    type Contents = HashSet<T>;
    type Payload = HashSet<T>;
    type Moved = core::convert::Infallible;

    fn contents(&self) -> HashSet<T> {
        self.state.contents.borrow().clone()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<HashSet<T>>>) {
        self.state.broadcaster.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<HashSet<T>>) {
        self.state.broadcaster.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.state.broadcaster.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.state.broadcaster.ongoing_transactions()
    }
}

/// A mutable broadcasting set.
///
/// # Example
///
/// ```
/// use herald_collections::EditableSet;
/// use herald_core::BroadcastingCollection;
///
/// let set = EditableSet::new();
/// set.add([1, 2, 3]);
/// set.remove([2]);
/// assert_eq!(set.len(), 2);
/// assert!(set.contents().contains(&3));
/// ```
pub struct EditableSet<T> {
    set: BroadcastingSet<T>,
}

impl<T> Clone for EditableSet<T> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
        }
    }
}

impl<T> Default for EditableSet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EditableSet<T>
where
    T: Clone + Eq + Hash,
{
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::with_contents(HashSet::new())
    }

    /// Creates a set with initial contents. No notification is sent.
    pub fn with_contents(contents: HashSet<T>) -> Self {
        Self {
            set: BroadcastingSet {
                state: Rc::new(SetState::new(contents)),
            },
        }
    }

    /// Returns a read-only handle onto this set.
    #[inline]
    pub fn as_broadcasting(&self) -> BroadcastingSet<T> {
        self.set.clone()
    }

    #[inline]
    pub fn contains(&self, element: &T) -> bool {
        self.set.contains(element)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Adds the elements not already present, as one insertion.
    pub fn add(&self, elements: impl IntoIterator<Item = T>) {
        self.set.state.add(elements);
    }

    /// Removes the elements that are present, as one removal.
    pub fn remove(&self, elements: impl IntoIterator<Item = T>) {
        self.set.state.remove(elements);
    }

    pub fn insert(&self, element: T) {
        self.add(core::iter::once(element));
    }

    pub fn remove_one(&self, element: &T) {
        self.remove(core::iter::once(element.clone()));
    }

    /// Replaces the contents, announcing the removals and insertions needed.
    pub fn set_contents(&self, contents: HashSet<T>) {
        self.set.state.set_contents(contents);
    }

    /// Returns true if a contents manager drives this set.
    pub fn contents_manager_attached(&self) -> bool {
        self.set.state.manager.is_attached()
    }
}

impl<T> From<&EditableSet<T>> for BroadcastingSet<T> {
    fn from(set: &EditableSet<T>) -> Self {
        set.set.clone()
    }
}

impl<T> BroadcastingCollection for EditableSet<T>
where
    T: Clone + Eq + Hash,
{
    type Contents = HashSet<T>;
    type Payload = HashSet<T>;
    type Moved = core::convert::Infallible;

    fn contents(&self) -> HashSet<T> {
        self.set.contents()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<HashSet<T>>>) {
        self.set.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<HashSet<T>>) {
        self.set.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.set.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.set.ongoing_transactions()
    }
}

/// A non-owning handle to an [`EditableSet`].
pub struct WeakSet<T> {
    state: Weak<SetState<T>>,
}

impl<T> Clone for WeakSet<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> EditableCollection for EditableSet<T>
where
    T: Clone + Eq + Hash,
{
    type WeakHandle = WeakSet<T>;

    fn downgrade(&self) -> WeakSet<T> {
        WeakSet {
            state: Rc::downgrade(&self.set.state),
        }
    }

    fn upgrade(handle: &WeakSet<T>) -> Option<Self> {
        handle.state.upgrade().map(|state| Self {
            set: BroadcastingSet { state },
        })
    }

    fn set_contents(&self, contents: HashSet<T>) {
        EditableSet::set_contents(self, contents);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use alloc::string::{String, ToString};
    use alloc::vec;

    fn set(items: &[u32]) -> HashSet<u32> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_add_emits_single_insertion() {
        let s = EditableSet::new();
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.add([1, 2, 3]);

        assert_eq!(s.contents(), set(&[1, 2, 3]));
        assert_eq!(
            recorder.events(),
            vec![
                "will_insert [1, 2, 3]".to_string(),
                "did_insert [1, 2, 3]".to_string()
            ]
        );
    }

    #[test]
    fn test_add_present_elements_is_silent() {
        let s = EditableSet::with_contents(set(&[1, 2]));
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.add([1, 2]);
        s.remove([7]);

        assert!(recorder.events().is_empty());
        assert_eq!(s.contents(), set(&[1, 2]));
    }

    #[test]
    fn test_add_only_announces_new_elements() {
        let s = EditableSet::with_contents(set(&[1, 2]));
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.add([2, 3]);

        assert_eq!(recorder.events()[1], "did_insert [3]");
    }

    #[test]
    fn test_set_contents_brackets_mixed_update() {
        let s = EditableSet::with_contents(set(&[1, 2, 3]));
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.set_contents(set(&[2, 3, 4]));

        assert_eq!(s.contents(), set(&[2, 3, 4]));
        assert_eq!(
            recorder.events(),
            vec![
                "begin".to_string(),
                "will_remove [1]".to_string(),
                "did_remove [1]".to_string(),
                "will_insert [4]".to_string(),
                "did_insert [4]".to_string(),
                "end".to_string(),
            ]
        );
    }

    #[test]
    fn test_set_contents_single_group_not_bracketed() {
        let s = EditableSet::with_contents(set(&[1, 2, 3]));
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.set_contents(set(&[1]));

        assert_eq!(
            recorder.events(),
            vec!["will_remove [2, 3]".to_string(), "did_remove [2, 3]".to_string()]
        );
    }

    #[test]
    fn test_will_sees_old_contents_did_sees_new() {
        let s = EditableSet::new();
        let seen = Rc::new(RefCell::new(vec![]));
        let handle = s.as_broadcasting();
        let seen_in_listener = seen.clone();
        let listener = herald_core::FnListener::new(move |n: herald_core::Notification<'_, HashSet<u32>>| {
            match n {
                herald_core::Notification::WillApply(_) => seen_in_listener.borrow_mut().push(handle.len()),
                herald_core::Notification::DidApply(_) => seen_in_listener.borrow_mut().push(handle.len()),
                _ => {}
            }
        });
        s.add_listener(listener.clone());

        s.add([5, 6]);

        assert_eq!(*seen.borrow(), vec![0, 2]);
    }

    #[test]
    fn test_listener_may_mutate_from_callback() {
        let s: EditableSet<u32> = EditableSet::new();
        let writer = s.clone();
        let listener = herald_core::FnListener::new(move |n: herald_core::Notification<'_, HashSet<u32>>| {
            if let herald_core::Notification::DidApply(Change::Insertion { inserted, .. }) = n {
                if inserted.contains(&1) {
                    writer.insert(100);
                }
            }
        });
        s.add_listener(listener.clone());

        s.insert(1);

        assert_eq!(s.contents(), set(&[1, 100]));
    }

    #[test]
    fn test_manual_transactions_nest() {
        let s: EditableSet<u32> = EditableSet::new();
        let recorder = Recorder::new();
        s.add_listener(recorder.clone());

        s.perform_transaction(|| {
            s.perform_transaction(|| s.insert(1));
            assert_eq!(s.ongoing_transactions(), 1);
            s.remove_one(&1);
        });

        assert_eq!(s.ongoing_transactions(), 0);
        let events = recorder.events();
        assert_eq!(events.first().map(String::as_str), Some("begin"));
        assert_eq!(events.last().map(String::as_str), Some("end"));
        assert_eq!(events.iter().filter(|e| e.as_str() == "begin").count(), 1);
    }

    #[test]
    fn test_weak_handle_does_not_keep_set_alive() {
        let s: EditableSet<u32> = EditableSet::new();
        let weak = s.downgrade();
        assert!(EditableSet::upgrade(&weak).is_some());
        drop(s);
        assert!(EditableSet::upgrade(&weak).is_none());
    }
}
