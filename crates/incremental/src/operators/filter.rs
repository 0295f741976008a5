//! Predicate filters over a single source.

use super::bracketed;
use crate::manager::{replace_source, ContentsManager, ManagerCore};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::hash::Hash;
use hashbrown::{HashMap, HashSet};
use herald_collections::{BroadcastingDictionary, BroadcastingSet, EditableDictionary, EditableSet};
use herald_core::{BroadcastingCollection, Change, Listener, SuspensionReason};

type Predicate<T> = Rc<dyn Fn(&T) -> bool>;
type EntryPredicate<K, V> = Rc<dyn Fn(&K, &V) -> bool>;

/// Keeps a set equal to the elements of its source that pass a predicate.
///
/// Source insertions and removals are filtered and forwarded as they happen.
/// When the predicate's outcome for an element changes without the source
/// changing, call [`SetFilter::reevaluate`] with that element.
///
/// # Example
///
/// ```
/// use herald_collections::EditableSet;
/// use herald_incremental::{ContentsManager, SetFilter};
///
/// let numbers = EditableSet::with_contents((1..=6).collect());
/// let even = EditableSet::new();
/// let filter = SetFilter::new(Some(numbers.as_broadcasting()), |n: &u32| n % 2 == 0);
/// filter.manage(&even);
///
/// numbers.add([8, 9]);
/// assert_eq!(even.len(), 4);
/// ```
pub struct SetFilter<T: Clone + Eq + Hash> {
    this: Weak<Self>,
    core: ManagerCore<EditableSet<T>>,
    source: RefCell<Option<BroadcastingSet<T>>>,
    predicate: RefCell<Predicate<T>>,
}

impl<T> SetFilter<T>
where
    T: Clone + Eq + Hash + 'static,
{
    pub fn new(source: Option<BroadcastingSet<T>>, predicate: impl Fn(&T) -> bool + 'static) -> Rc<Self> {
        let missing = source.is_none();
        let filter = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            core: ManagerCore::new(),
            source: RefCell::new(source),
            predicate: RefCell::new(Rc::new(predicate)),
        });
        if missing {
            filter.add_suspension_reason(SuspensionReason::NoContentsSource);
        }
        filter
    }

    pub fn contents_source(&self) -> Option<BroadcastingSet<T>> {
        self.source.borrow().clone()
    }

    pub fn set_contents_source(&self, source: Option<BroadcastingSet<T>>) {
        replace_source(self, &self.source, source);
    }

    /// Replaces the predicate and applies the recomputed contents as a diff.
    pub fn set_predicate(&self, predicate: impl Fn(&T) -> bool + 'static) {
        self.predicate.replace(Rc::new(predicate));
        self.recalculate();
    }

    /// Re-runs the predicate for `elements`. Elements the source does not
    /// contain are ignored.
    pub fn reevaluate(&self, elements: impl IntoIterator<Item = T>) {
        let (managed, source) = match (self.core.target(), self.contents_source()) {
            (Some(managed), Some(source)) => (managed, source),
            _ => return,
        };
        let predicate = self.predicate();
        let mut entering = HashSet::new();
        let mut leaving = HashSet::new();
        for element in elements {
            if !source.contains(&element) {
                continue;
            }
            match (predicate(&element), managed.contains(&element)) {
                (true, false) => {
                    entering.insert(element);
                }
                (false, true) => {
                    leaving.insert(element);
                }
                _ => {}
            }
        }
        let bracket = !entering.is_empty() && !leaving.is_empty();
        bracketed(&managed, bracket, || {
            managed.remove(leaving);
            managed.add(entering);
        });
    }

    fn predicate(&self) -> Predicate<T> {
        self.predicate.borrow().clone()
    }
}

impl<T> ContentsManager for SetFilter<T>
where
    T: Clone + Eq + Hash + 'static,
{
    type Managed = EditableSet<T>;

    fn core(&self) -> &ManagerCore<EditableSet<T>> {
        &self.core
    }

    fn calculate_contents(&self) -> HashSet<T> {
        let predicate = self.predicate();
        match self.contents_source() {
            Some(source) => source.inspect(|elements| elements.iter().filter(|e| predicate(e)).cloned().collect()),
            None => HashSet::new(),
        }
    }

    fn connect_sources(&self) {
        if let (Some(this), Some(source)) = (self.this.upgrade(), self.contents_source()) {
            source.add_listener(this);
        }
    }

    fn disconnect_sources(&self) {
        if let Some(source) = self.contents_source() {
            source.remove_listener(self);
        }
    }
}

impl<T> Listener<HashSet<T>> for SetFilter<T>
where
    T: Clone + Eq + Hash + 'static,
{
    fn will_begin_transactions(&self) {
        self.core.forward_begin();
    }

    fn did_end_transactions(&self) {
        self.core.forward_end();
    }

    fn did_add(&self, inserted: &HashSet<T>) {
        if let Some(managed) = self.core.target() {
            let predicate = self.predicate();
            managed.add(inserted.iter().filter(|e| predicate(e)).cloned());
        }
    }

    fn did_remove(&self, removed: &HashSet<T>) {
        if let Some(managed) = self.core.target() {
            managed.remove(removed.iter().cloned());
        }
    }
}

/// Keeps a dictionary equal to the entries of its source that pass a
/// predicate on key and value.
pub struct DictionaryFilter<K: Clone + Eq + Hash, V: Clone + PartialEq> {
    this: Weak<Self>,
    core: ManagerCore<EditableDictionary<K, V>>,
    source: RefCell<Option<BroadcastingDictionary<K, V>>>,
    predicate: RefCell<EntryPredicate<K, V>>,
}

impl<K, V> DictionaryFilter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    pub fn new(
        source: Option<BroadcastingDictionary<K, V>>,
        predicate: impl Fn(&K, &V) -> bool + 'static,
    ) -> Rc<Self> {
        let missing = source.is_none();
        let filter = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            core: ManagerCore::new(),
            source: RefCell::new(source),
            predicate: RefCell::new(Rc::new(predicate)),
        });
        if missing {
            filter.add_suspension_reason(SuspensionReason::NoContentsSource);
        }
        filter
    }

    pub fn contents_source(&self) -> Option<BroadcastingDictionary<K, V>> {
        self.source.borrow().clone()
    }

    pub fn set_contents_source(&self, source: Option<BroadcastingDictionary<K, V>>) {
        replace_source(self, &self.source, source);
    }

    pub fn set_predicate(&self, predicate: impl Fn(&K, &V) -> bool + 'static) {
        self.predicate.replace(Rc::new(predicate));
        self.recalculate();
    }

    /// Re-runs the predicate for the entries at `keys`. Keys the source does
    /// not contain are ignored.
    pub fn reevaluate(&self, keys: impl IntoIterator<Item = K>) {
        let (managed, source) = match (self.core.target(), self.contents_source()) {
            (Some(managed), Some(source)) => (managed, source),
            _ => return,
        };
        let predicate = self.predicate();
        let mut entering = HashMap::new();
        let mut leaving = Vec::new();
        for key in keys {
            let value = match source.get(&key) {
                Some(value) => value,
                None => continue,
            };
            match (predicate(&key, &value), managed.contains_key(&key)) {
                (true, false) => {
                    entering.insert(key, value);
                }
                (false, true) => leaving.push(key),
                _ => {}
            }
        }
        let bracket = !entering.is_empty() && !leaving.is_empty();
        bracketed(&managed, bracket, || {
            managed.remove(leaving);
            managed.add(entering);
        });
    }

    fn predicate(&self) -> EntryPredicate<K, V> {
        self.predicate.borrow().clone()
    }
}

impl<K, V> ContentsManager for DictionaryFilter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    type Managed = EditableDictionary<K, V>;

    fn core(&self) -> &ManagerCore<EditableDictionary<K, V>> {
        &self.core
    }

    fn calculate_contents(&self) -> HashMap<K, V> {
        let predicate = self.predicate();
        match self.contents_source() {
            Some(source) => source.inspect(|entries| {
                entries
                    .iter()
                    .filter(|(k, v)| predicate(k, v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            }),
            None => HashMap::new(),
        }
    }

    fn connect_sources(&self) {
        if let (Some(this), Some(source)) = (self.this.upgrade(), self.contents_source()) {
            source.add_listener(this);
        }
    }

    fn disconnect_sources(&self) {
        if let Some(source) = self.contents_source() {
            source.remove_listener(self);
        }
    }
}

impl<K, V> Listener<HashMap<K, V>> for DictionaryFilter<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    fn will_begin_transactions(&self) {
        self.core.forward_begin();
    }

    fn did_end_transactions(&self) {
        self.core.forward_end();
    }

    fn did_apply(&self, change: &Change<HashMap<K, V>>) {
        let managed = match self.core.target() {
            Some(managed) => managed,
            None => return,
        };
        match change {
            Change::Insertion { inserted, .. } => {
                let predicate = self.predicate();
                let mut passing = HashMap::new();
                let mut failing = Vec::new();
                for (key, value) in inserted {
                    if predicate(key, value) {
                        passing.insert(key.clone(), value.clone());
                    } else if managed.contains_key(key) {
                        // The new value of a replaced entry no longer passes.
                        failing.push(key.clone());
                    }
                }
                let bracket = !passing.is_empty() && !failing.is_empty();
                bracketed(&managed, bracket, || {
                    managed.remove(failing);
                    managed.add(passing);
                });
            }
            Change::Removal {
                removed,
                paired_insertion: None,
            } => managed.remove(removed.keys().cloned()),
            // The paired insertion settles replaced keys.
            Change::Removal { .. } => {}
            Change::Move { element, .. } => match *element {},
        }
    }
}
