//! Union and intersection of several sets.

use crate::manager::{reconfigure, ContentsManager, ManagerCore};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::hash::Hash;
use hashbrown::HashSet;
use herald_collections::{BroadcastingSet, EditableSet};
use herald_core::{BroadcastingCollection, Listener};
use log::debug;

/// How a [`SetMixer`] combines its sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixMode {
    /// Elements present in at least one source.
    Union,
    /// Elements present in every source. No sources yield an empty set.
    Intersection,
}

/// Keeps a set equal to the union or intersection of its sources.
///
/// Source changes are handled by querying the membership of the changed
/// elements only. Adding or removing a whole source recomputes the contents
/// and applies them as a diff.
pub struct SetMixer<T: Clone + Eq + Hash> {
    this: Weak<Self>,
    core: ManagerCore<EditableSet<T>>,
    mode: MixMode,
    sources: RefCell<Vec<BroadcastingSet<T>>>,
}

impl<T> SetMixer<T>
where
    T: Clone + Eq + Hash + 'static,
{
    pub fn new(mode: MixMode, sources: impl IntoIterator<Item = BroadcastingSet<T>>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            core: ManagerCore::new(),
            mode,
            sources: RefCell::new(distinct(sources)),
        })
    }

    pub fn union(sources: impl IntoIterator<Item = BroadcastingSet<T>>) -> Rc<Self> {
        Self::new(MixMode::Union, sources)
    }

    pub fn intersection(sources: impl IntoIterator<Item = BroadcastingSet<T>>) -> Rc<Self> {
        Self::new(MixMode::Intersection, sources)
    }

    #[inline]
    pub fn mode(&self) -> MixMode {
        self.mode
    }

    pub fn contents_sources(&self) -> Vec<BroadcastingSet<T>> {
        self.sources.borrow().clone()
    }

    /// Adds a source. Adding a source that is already mixed is a no-op.
    pub fn add_source(&self, source: BroadcastingSet<T>) {
        if self.sources.borrow().iter().any(|s| s.ptr_eq(&source)) {
            return;
        }
        debug!("adding mixer source");
        reconfigure(self, || self.sources.borrow_mut().push(source));
    }

    /// Removes a source. Unknown sources are ignored.
    pub fn remove_source(&self, source: &BroadcastingSet<T>) {
        if !self.sources.borrow().iter().any(|s| s.ptr_eq(source)) {
            return;
        }
        debug!("removing mixer source");
        reconfigure(self, || self.sources.borrow_mut().retain(|s| !s.ptr_eq(source)));
    }

    pub fn set_sources(&self, sources: impl IntoIterator<Item = BroadcastingSet<T>>) {
        let sources = distinct(sources);
        reconfigure(self, || {
            self.sources.replace(sources);
        });
    }

    fn in_any_source(&self, element: &T) -> bool {
        self.sources.borrow().iter().any(|s| s.contains(element))
    }

    fn in_every_source(&self, element: &T) -> bool {
        let sources = self.sources.borrow();
        !sources.is_empty() && sources.iter().all(|s| s.contains(element))
    }
}

fn distinct<T>(sources: impl IntoIterator<Item = BroadcastingSet<T>>) -> Vec<BroadcastingSet<T>>
where
    T: Clone + Eq + Hash,
{
    let mut unique: Vec<BroadcastingSet<T>> = Vec::new();
    for source in sources {
        if !unique.iter().any(|s| s.ptr_eq(&source)) {
            unique.push(source);
        }
    }
    unique
}

impl<T> ContentsManager for SetMixer<T>
where
    T: Clone + Eq + Hash + 'static,
{
    type Managed = EditableSet<T>;

    fn core(&self) -> &ManagerCore<EditableSet<T>> {
        &self.core
    }

    fn calculate_contents(&self) -> HashSet<T> {
        let sources = self.sources.borrow();
        match self.mode {
            MixMode::Union => {
                let mut union = HashSet::new();
                for source in sources.iter() {
                    source.inspect(|elements| union.extend(elements.iter().cloned()));
                }
                union
            }
            MixMode::Intersection => {
                let smallest = match sources.iter().min_by_key(|s| s.len()) {
                    Some(smallest) => smallest,
                    None => return HashSet::new(),
                };
                smallest.inspect(|elements| {
                    elements
                        .iter()
                        .filter(|e| sources.iter().all(|s| s.contains(e)))
                        .cloned()
                        .collect()
                })
            }
        }
    }

    fn connect_sources(&self) {
        if let Some(this) = self.this.upgrade() {
            for source in self.sources.borrow().iter() {
                source.add_listener(this.clone());
            }
        }
    }

    fn disconnect_sources(&self) {
        for source in self.sources.borrow().iter() {
            source.remove_listener(self);
        }
    }
}

impl<T> Listener<HashSet<T>> for SetMixer<T>
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
        let joining: Vec<T> = match self.mode {
            MixMode::Union => inserted.iter().cloned().collect(),
            MixMode::Intersection => inserted.iter().filter(|e| self.in_every_source(e)).cloned().collect(),
        };
        managed.add(joining);
    }

    fn did_remove(&self, removed: &HashSet<T>) {
        let managed = match self.core.target() {
            Some(managed) => managed,
            None => return,
        };
        let leaving: Vec<T> = match self.mode {
            MixMode::Union => removed.iter().filter(|e| !self.in_any_source(e)).cloned().collect(),
            MixMode::Intersection => removed.iter().cloned().collect(),
        };
        managed.remove(leaving);
    }
}
