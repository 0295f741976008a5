//! Broadcasting dictionaries.
//!
//! Changes carry the affected entries. Assigning a new value to an existing
//! key is a replacement: a removal of the old entry paired with an insertion
//! of the new one.

use crate::diff::{dictionary_diff, DictionaryDiff};
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::hash::Hash;
use hashbrown::HashMap;
use herald_core::{
    Broadcaster, BroadcastingCollection, Change, EditableCollection, Listener, ManagerHandle,
    ManagerSlot,
};
use log::trace;

/// A change to a dictionary.
pub type DictionaryChange<K, V> = Change<HashMap<K, V>>;

struct DictionaryState<K, V> {
    contents: RefCell<HashMap<K, V>>,
    broadcaster: Broadcaster<HashMap<K, V>>,
    manager: ManagerSlot,
}

impl<K, V> DictionaryState<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    fn apply(&self, change: DictionaryChange<K, V>) {
        self.broadcaster.apply(change, |change| {
            let mut contents = self.contents.borrow_mut();
            match change {
                Change::Insertion { inserted, .. } => {
                    contents.extend(inserted.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                Change::Removal { removed, .. } => {
                    for key in removed.keys() {
                        contents.remove(key);
                    }
                }
                Change::Move { element, .. } => match *element {},
            }
        });
    }

    /// Applies the groups of `diff` in order, bracketing when more than one
    /// group is active.
    fn apply_diff(&self, diff: DictionaryDiff<K, V>) {
        if diff.is_empty() {
            return;
        }
        trace!(
            "dictionary update: {} removed, {} replaced, {} inserted",
            diff.removed.len(),
            diff.replaced.len(),
            diff.inserted.len()
        );
        let DictionaryDiff {
            removed,
            replaced,
            replacements,
            inserted,
        } = diff;
        let bracket = usize::from(!removed.is_empty())
            + usize::from(!replaced.is_empty())
            + usize::from(!inserted.is_empty())
            > 1;
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
            if !inserted.is_empty() {
                self.apply(Change::insertion(inserted));
            }
        });
    }

    fn merge(&self, entries: impl IntoIterator<Item = (K, V)>) {
        let mut diff = DictionaryDiff::default();
        diff.merge_entries(&self.contents.borrow(), entries);
        self.apply_diff(diff);
    }

    fn remove(&self, keys: impl IntoIterator<Item = K>) {
        let removed: HashMap<K, V> = {
            let contents = self.contents.borrow();
            keys.into_iter()
                .filter_map(|k| contents.get(&k).cloned().map(|v| (k, v)))
                .collect()
        };
        if !removed.is_empty() {
            self.apply(Change::removal(removed));
        }
    }

    fn set_contents(&self, new: HashMap<K, V>) {
        let diff = dictionary_diff(&self.contents.borrow(), &new);
        self.apply_diff(diff);
    }
}

/// A read-only handle onto a broadcasting dictionary.
pub struct BroadcastingDictionary<K, V> {
    state: Rc<DictionaryState<K, V>>,
}

impl<K, V> Clone for BroadcastingDictionary<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, V> BroadcastingDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    pub fn get(&self, key: &K) -> Option<V> {
        self.state.contents.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.state.contents.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.contents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.contents.borrow().is_empty()
    }

    /// Runs `f` against the current contents without copying them.
    pub fn inspect<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.state.contents.borrow())
    }
}

impl<K, V> BroadcastingCollection for BroadcastingDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    type Contents = HashMap<K, V>;
    type Payload = HashMap<K, V>;
    type Moved = core::convert::Infallible;

    fn contents(&self) -> HashMap<K, V> {
        self.state.contents.borrow().clone()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<HashMap<K, V>>>) {
        self.state.broadcaster.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<HashMap<K, V>>) {
        self.state.broadcaster.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.state.broadcaster.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.state.broadcaster.ongoing_transactions()
    }
}

/// A mutable broadcasting dictionary.
pub struct EditableDictionary<K, V> {
    dictionary: BroadcastingDictionary<K, V>,
}

impl<K, V> Clone for EditableDictionary<K, V> {
    fn clone(&self) -> Self {
        Self {
            dictionary: self.dictionary.clone(),
        }
    }
}

impl<K, V> Default for EditableDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EditableDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self::with_contents(HashMap::new())
    }

    /// Creates a dictionary with initial contents. No notification is sent.
    pub fn with_contents(contents: HashMap<K, V>) -> Self {
        Self {
            dictionary: BroadcastingDictionary {
                state: Rc::new(DictionaryState {
                    contents: RefCell::new(contents),
                    broadcaster: Broadcaster::new(),
                    manager: ManagerSlot::new(),
                }),
            },
        }
    }

    pub fn as_broadcasting(&self) -> BroadcastingDictionary<K, V> {
        self.dictionary.clone()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.dictionary.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.dictionary.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// Merges `entries` in. New keys are inserted; keys whose value differs
    /// are replaced; identical entries are ignored.
    pub fn add(&self, entries: impl IntoIterator<Item = (K, V)>) {
        self.dictionary.state.merge(entries);
    }

    /// Sets a single entry.
    pub fn insert(&self, key: K, value: V) {
        self.add(core::iter::once((key, value)));
    }

    /// Removes the entries for the keys that are present, as one removal.
    pub fn remove(&self, keys: impl IntoIterator<Item = K>) {
        self.dictionary.state.remove(keys);
    }

    /// Replaces the whole contents.
    pub fn set_contents(&self, contents: HashMap<K, V>) {
        self.dictionary.state.set_contents(contents);
    }

    pub fn contents_manager_attached(&self) -> bool {
        self.dictionary.state.manager.is_attached()
    }
}

impl<K, V> From<&EditableDictionary<K, V>> for BroadcastingDictionary<K, V> {
    fn from(dictionary: &EditableDictionary<K, V>) -> Self {
        dictionary.dictionary.clone()
    }
}

impl<K, V> BroadcastingCollection for EditableDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    type Contents = HashMap<K, V>;
    type Payload = HashMap<K, V>;
    type Moved = core::convert::Infallible;

    fn contents(&self) -> HashMap<K, V> {
        self.dictionary.contents()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<HashMap<K, V>>>) {
        self.dictionary.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<HashMap<K, V>>) {
        self.dictionary.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.dictionary.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.dictionary.ongoing_transactions()
    }
}

/// A non-owning handle to an [`EditableDictionary`].
pub struct WeakDictionary<K, V> {
    state: Weak<DictionaryState<K, V>>,
}

impl<K, V> Clone for WeakDictionary<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K, V> EditableCollection for EditableDictionary<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    type WeakHandle = WeakDictionary<K, V>;

    fn downgrade(&self) -> WeakDictionary<K, V> {
        WeakDictionary {
            state: Rc::downgrade(&self.dictionary.state),
        }
    }

    fn upgrade(handle: &WeakDictionary<K, V>) -> Option<Self> {
        handle.state.upgrade().map(|state| Self {
            dictionary: BroadcastingDictionary { state },
        })
    }

    fn set_contents(&self, contents: HashMap<K, V>) {
        EditableDictionary::set_contents(self, contents);
    }

    fn begin_transaction(&self) {
        self.dictionary.state.broadcaster.begin_transaction();
    }

    fn end_transaction(&self) {
        self.dictionary.state.broadcaster.end_transaction();
    }

    fn set_contents_manager(&self, manager: Option<Rc<dyn ManagerHandle>>) {
        self.dictionary.state.manager.replace(manager);
    }

    fn contents_manager(&self) -> Option<Rc<dyn ManagerHandle>> {
        self.dictionary.state.manager.get()
    }
}
