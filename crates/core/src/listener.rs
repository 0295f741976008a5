//! Listeners and the listener registry.
//!
//! Listeners are held weakly: registering with a collection never keeps a
//! listener alive. Each entry is keyed by the address of the listener's
//! allocation, so registering the same `Rc` twice is a no-op and removal only
//! needs a reference to the listener.

use crate::change::Change;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;

/// Receives the notifications of a broadcasting collection.
///
/// Every method has a no-op default. The default `will_apply` / `did_apply`
/// route each change to the kind-specific hooks (`will_add`, `did_remove`,
/// `did_move`, ...), so a listener overrides either the generic pair or the
/// hooks it cares about.
pub trait Listener<P, M = Infallible> {
    fn will_begin_transactions(&self) {}

    fn did_end_transactions(&self) {}

    fn will_apply(&self, change: &Change<P, M>) {
        match change {
            Change::Insertion { inserted, .. } => self.will_add(inserted),
            Change::Removal { removed, .. } => self.will_remove(removed),
            Change::Move { element, from, to } => self.will_move(element, *from, *to),
        }
    }

    fn did_apply(&self, change: &Change<P, M>) {
        match change {
            Change::Insertion { inserted, .. } => self.did_add(inserted),
            Change::Removal { removed, .. } => self.did_remove(removed),
            Change::Move { element, from, to } => self.did_move(element, *from, *to),
        }
    }

    fn will_add(&self, _inserted: &P) {}

    fn did_add(&self, _inserted: &P) {}

    fn will_remove(&self, _removed: &P) {}

    fn did_remove(&self, _removed: &P) {}

    fn will_move(&self, _element: &M, _from: usize, _to: usize) {}

    fn did_move(&self, _element: &M, _from: usize, _to: usize) {}
}

/// A single notification, as delivered to an [`FnListener`].
#[derive(Debug)]
pub enum Notification<'a, P, M = Infallible> {
    WillBeginTransactions,
    DidEndTransactions,
    WillApply(&'a Change<P, M>),
    DidApply(&'a Change<P, M>),
}

/// Adapts a closure into a [`Listener`].
pub struct FnListener<P, M = Infallible> {
    callback: Box<dyn Fn(Notification<'_, P, M>)>,
}

impl<P, M> FnListener<P, M> {
    /// Wraps `callback` in a listener ready to be registered.
    pub fn new<F>(callback: F) -> Rc<Self>
    where
        F: Fn(Notification<'_, P, M>) + 'static,
    {
        Rc::new(Self {
            callback: Box::new(callback),
        })
    }
}

impl<P, M> Listener<P, M> for FnListener<P, M> {
    fn will_begin_transactions(&self) {
        (self.callback)(Notification::WillBeginTransactions);
    }

    fn did_end_transactions(&self) {
        (self.callback)(Notification::DidEndTransactions);
    }

    fn will_apply(&self, change: &Change<P, M>) {
        (self.callback)(Notification::WillApply(change));
    }

    fn did_apply(&self, change: &Change<P, M>) {
        (self.callback)(Notification::DidApply(change));
    }
}

/// Identity of a registered listener: the address of its allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Returns the identity of `listener`.
    #[inline]
    pub fn of<P, M>(listener: &dyn Listener<P, M>) -> Self {
        ListenerId(listener as *const dyn Listener<P, M> as *const () as usize)
    }
}

struct Entry<P, M> {
    id: ListenerId,
    listener: Weak<dyn Listener<P, M>>,
}

/// Weakly holds the listeners of one collection, in registration order.
pub struct ListenerRegistry<P, M = Infallible> {
    entries: RefCell<Vec<Entry<P, M>>>,
    /// Bumped on every add/remove so dispatch can skip the membership scan
    /// when nothing changed mid-notification.
    generation: Cell<u64>,
}

impl<P, M> Default for ListenerRegistry<P, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, M> ListenerRegistry<P, M> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            generation: Cell::new(0),
        }
    }

    /// Registers a listener. Returns false if it was already registered.
    pub fn add(&self, listener: Rc<dyn Listener<P, M>>) -> bool {
        let id = ListenerId::of(&*listener);
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|e| e.id == id && e.listener.strong_count() > 0) {
            return false;
        }
        // A dead entry may share the address of a new allocation.
        entries.retain(|e| e.id != id);
        entries.push(Entry {
            id,
            listener: Rc::downgrade(&listener),
        });
        self.generation.set(self.generation.get() + 1);
        true
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove(&self, listener: &dyn Listener<P, M>) -> bool {
        self.remove_id(ListenerId::of(listener))
    }

    /// Unregisters a listener by identity.
    pub fn remove_id(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.generation.set(self.generation.get() + 1);
        }
        removed
    }

    /// Returns true if the listener is registered and alive.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.id == id && e.listener.strong_count() > 0)
    }

    /// Returns true if at least one registered listener is alive.
    pub fn has_listeners(&self) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| e.listener.strong_count() > 0)
    }

    /// Returns the number of live listeners.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.listener.strong_count() > 0)
            .count()
    }

    /// Returns true if no live listener is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.has_listeners()
    }

    /// Drops entries whose listener has been deallocated.
    pub fn prune(&self) {
        self.entries
            .borrow_mut()
            .retain(|e| e.listener.strong_count() > 0);
    }

    /// Takes a strong snapshot of the live listeners, pruning dead entries.
    pub fn snapshot(&self) -> Vec<(ListenerId, Rc<dyn Listener<P, M>>)> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|e| e.listener.strong_count() > 0);
        entries
            .iter()
            .filter_map(|e| e.listener.upgrade().map(|l| (e.id, l)))
            .collect()
    }

    /// Calls `f` for every listener registered when the call starts.
    ///
    /// Listeners removed while the dispatch is running are skipped; listeners
    /// added while it is running are not called. No borrow is held while `f`
    /// runs, so listeners may re-enter the registry.
    pub fn for_each(&self, mut f: impl FnMut(&dyn Listener<P, M>)) {
        let snapshot = self.snapshot();
        let generation = self.generation.get();
        for (id, listener) in snapshot {
            if self.generation.get() != generation && !self.contains(id) {
                continue;
            }
            f(&*listener);
        }
    }
}
