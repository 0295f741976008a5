//! Traits shared by every broadcasting collection.

use crate::listener::Listener;
use alloc::rc::Rc;
use core::cell::RefCell;

/// The read-only surface of an observable collection.
///
/// `Payload` is what a [`Change`](crate::Change) carries for this kind of
/// collection and `Moved` is what a move carries (`Infallible` for unordered
/// kinds).
pub trait BroadcastingCollection {
    type Contents;
    type Payload;
    type Moved;

    /// Returns a snapshot of the current contents.
    fn contents(&self) -> Self::Contents;

    /// Registers a listener. Registering the same listener again is a no-op.
    fn add_listener(&self, listener: Rc<dyn Listener<Self::Payload, Self::Moved>>);

    /// Unregisters a listener. Unknown listeners are ignored.
    fn remove_listener(&self, listener: &dyn Listener<Self::Payload, Self::Moved>);

    fn has_listeners(&self) -> bool;

    /// Returns the number of currently open transaction brackets.
    fn ongoing_transactions(&self) -> usize;
}

impl<C: BroadcastingCollection + ?Sized> BroadcastingCollection for Rc<C> {
    type Contents = C::Contents;
    type Payload = C::Payload;
    type Moved = C::Moved;

    fn contents(&self) -> Self::Contents {
        (**self).contents()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<Self::Payload, Self::Moved>>) {
        (**self).add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<Self::Payload, Self::Moved>) {
        (**self).remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        (**self).has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        (**self).ongoing_transactions()
    }
}

/// A contents manager as seen by the collection it manages.
pub trait ManagerHandle {
    /// Called once the managed collection has let go of this manager, either
    /// by replacing it or by being dropped. The manager must not mutate the
    /// collection afterwards.
    fn detach(&self);
}

/// The mutable surface every editable collection shares, as needed by
/// contents managers.
pub trait EditableCollection: BroadcastingCollection + Clone {
    /// A non-owning handle to the collection.
    type WeakHandle: Clone;

    fn downgrade(&self) -> Self::WeakHandle;

    fn upgrade(handle: &Self::WeakHandle) -> Option<Self>;

    /// Replaces the whole contents, announcing the minimal set of changes.
    fn set_contents(&self, contents: Self::Contents);

    fn begin_transaction(&self);

    fn end_transaction(&self);

    /// Installs (or clears) the manager driving this collection. A previously
    /// installed manager is detached.
    fn set_contents_manager(&self, manager: Option<Rc<dyn ManagerHandle>>);

    fn contents_manager(&self) -> Option<Rc<dyn ManagerHandle>>;

    /// Runs `body` inside one transaction bracket.
    fn perform_transaction<R>(&self, body: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        self.begin_transaction();
        let result = body();
        self.end_transaction();
        result
    }
}

/// Storage for the manager an editable collection owns.
#[derive(Default)]
pub struct ManagerSlot {
    manager: RefCell<Option<Rc<dyn ManagerHandle>>>,
}

impl ManagerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `manager`, detaching the previous one unless it is the same.
    pub fn replace(&self, manager: Option<Rc<dyn ManagerHandle>>) {
        let same = match (&*self.manager.borrow(), &manager) {
            (Some(old), Some(new)) => same_manager(old, new),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        let previous = self.manager.replace(manager);
        if let Some(previous) = previous {
            previous.detach();
        }
    }

    pub fn get(&self) -> Option<Rc<dyn ManagerHandle>> {
        self.manager.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.manager.borrow().is_some()
    }
}

impl Drop for ManagerSlot {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.get_mut().take() {
            manager.detach();
        }
    }
}

fn same_manager(a: &Rc<dyn ManagerHandle>, b: &Rc<dyn ManagerHandle>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingHandle {
        detached: Cell<usize>,
    }

    impl ManagerHandle for CountingHandle {
        fn detach(&self) {
            self.detached.set(self.detached.get() + 1);
        }
    }

    #[test]
    fn test_slot_detaches_replaced_manager() {
        let slot = ManagerSlot::new();
        let first = Rc::new(CountingHandle::default());
        let second = Rc::new(CountingHandle::default());

        slot.replace(Some(first.clone()));
        assert!(slot.is_attached());
        slot.replace(Some(first.clone()));
        assert_eq!(first.detached.get(), 0);

        slot.replace(Some(second.clone()));
        assert_eq!(first.detached.get(), 1);

        slot.replace(None);
        assert_eq!(second.detached.get(), 1);
        assert!(!slot.is_attached());
    }

    #[test]
    fn test_dropping_slot_detaches_manager() {
        let slot = ManagerSlot::new();
        let handle = Rc::new(CountingHandle::default());
        slot.replace(Some(handle.clone()));

        drop(slot);
        assert_eq!(handle.detached.get(), 1);
    }
}
