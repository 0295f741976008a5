//! Sorted projection of a set into an ordered set.

use crate::manager::{replace_source, ContentsManager, ManagerCore};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::cmp::Ordering;
use core::hash::Hash;
use hashbrown::HashSet;
use herald_collections::{BroadcastingSet, EditableOrderedSet};
use herald_core::{BroadcastingCollection, IndexedElements, Listener, SuspensionReason};
use log::warn;

type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Keeps an ordered set holding the elements of a source set, sorted by a
/// comparator.
///
/// The comparator must be a strict weak ordering. Elements that compare
/// equal keep the order in which they entered the projection: a new element
/// goes after the equal ones already present.
pub struct SortedProjection<T: Clone + Eq + Hash> {
    this: Weak<Self>,
    core: ManagerCore<EditableOrderedSet<T>>,
    source: RefCell<Option<BroadcastingSet<T>>>,
    comparator: RefCell<Comparator<T>>,
}

impl<T> SortedProjection<T>
where
    T: Clone + Eq + Hash + 'static,
{
    pub fn new(
        source: Option<BroadcastingSet<T>>,
        comparator: impl Fn(&T, &T) -> Ordering + 'static,
    ) -> Rc<Self> {
        let missing = source.is_none();
        let projection = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            core: ManagerCore::new(),
            source: RefCell::new(source),
            comparator: RefCell::new(Rc::new(comparator)),
        });
        if missing {
            projection.add_suspension_reason(SuspensionReason::NoContentsSource);
        }
        projection
    }

    pub fn contents_source(&self) -> Option<BroadcastingSet<T>> {
        self.source.borrow().clone()
    }

    pub fn set_contents_source(&self, source: Option<BroadcastingSet<T>>) {
        replace_source(self, &self.source, source);
    }

    /// Replaces the comparator and re-sorts, announcing the moves.
    pub fn set_comparator(&self, comparator: impl Fn(&T, &T) -> Ordering + 'static) {
        self.comparator.replace(Rc::new(comparator));
        self.recalculate();
    }

    /// Re-positions `elements` after their sort keys changed. Elements not in
    /// the projection are ignored.
    pub fn reevaluate(&self, elements: impl IntoIterator<Item = T>) {
        let managed = match self.core.target() {
            Some(managed) => managed,
            None => return,
        };
        let changed: HashSet<T> = elements.into_iter().filter(|e| managed.contains(e)).collect();
        if changed.is_empty() {
            return;
        }
        let compare = self.comparator();
        let resorted = managed.as_broadcasting().inspect(|current| {
            let mut moving: Vec<&T> = current.iter().filter(|e| changed.contains(*e)).collect();
            moving.sort_by(|a, b| compare(a, b));
            let staying: Vec<&T> = current.iter().filter(|e| !changed.contains(*e)).collect();

            let mut resorted = Vec::with_capacity(current.len());
            let mut next = 0;
            for element in moving {
                let at = next + staying[next..].partition_point(|x| compare(x, element) != Ordering::Greater);
                resorted.extend(staying[next..at].iter().map(|e| (*e).clone()));
                resorted.push(element.clone());
                next = at;
            }
            resorted.extend(staying[next..].iter().map(|e| (*e).clone()));
            resorted
        });
        // Same elements, so this only announces moves.
        managed.set_contents(resorted);
    }

    fn comparator(&self) -> Comparator<T> {
        self.comparator.borrow().clone()
    }
}

impl<T> ContentsManager for SortedProjection<T>
where
    T: Clone + Eq + Hash + 'static,
{
    type Managed = EditableOrderedSet<T>;

    fn core(&self) -> &ManagerCore<EditableOrderedSet<T>> {
        &self.core
    }

    fn calculate_contents(&self) -> Vec<T> {
        let mut sorted: Vec<T> = match self.contents_source() {
            Some(source) => source.inspect(|elements| elements.iter().cloned().collect()),
            None => Vec::new(),
        };
        let compare = self.comparator();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
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

impl<T> Listener<HashSet<T>> for SortedProjection<T>
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
        let managed = match self.core.target() {
            Some(managed) => managed,
            None => return,
        };
        let compare = self.comparator();
        let mut fresh: Vec<T> = inserted.iter().filter(|e| !managed.contains(e)).cloned().collect();
        if fresh.is_empty() {
            return;
        }
        fresh.sort_by(|a, b| compare(a, b));
        // Positions in the current order; the k-th new element lands k
        // places further once the earlier ones are in.
        let positions: Vec<usize> = managed.as_broadcasting().inspect(|current| {
            fresh
                .iter()
                .map(|element| current.partition_point(|x| compare(x, element) != Ordering::Greater))
                .collect()
        });
        let inserted: IndexedElements<T> = fresh
            .into_iter()
            .zip(positions)
            .enumerate()
            .map(|(k, (element, position))| (position + k, element))
            .collect();
        if let Err(error) = managed.insert(inserted) {
            warn!("sorted insertion rejected, recomputing: {}", error);
            self.recalculate();
        }
    }

    fn did_remove(&self, removed: &HashSet<T>) {
        if let Some(managed) = self.core.target() {
            managed.remove(removed.iter().cloned());
        }
    }
}
