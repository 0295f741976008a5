//! The contents-manager protocol.
//!
//! A contents manager keeps one editable collection (the managed collection)
//! derived from one or more sources. It is suspended while any suspension
//! reason is counted and updating otherwise. Every transition into updating
//! reconnects to the sources and applies a full recomputation as a diff; every
//! transition out of it disconnects, after which the managed collection is
//! never touched again.
//!
//! The managed collection owns its manager through a [`ManagerHandle`]; the
//! manager only holds the managed collection weakly.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use herald_core::{
    BroadcastingCollection, EditableCollection, ManagerHandle, SuspensionReason,
    TransactionCoordinator,
};
use log::debug;

/// Counted while a manager swaps its sources.
pub(crate) const RECONFIGURING: SuspensionReason = SuspensionReason::Custom("reconfiguring");

/// State shared by every contents manager.
pub struct ManagerCore<C: EditableCollection> {
    managed: RefCell<Option<C::WeakHandle>>,
    suspensions: TransactionCoordinator,
    updating: Cell<bool>,
    /// Source brackets currently mirrored on the managed collection.
    forwarded: Cell<usize>,
}

impl<C: EditableCollection> Default for ManagerCore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: EditableCollection> ManagerCore<C> {
    /// Creates the state of a detached manager, suspended for
    /// [`SuspensionReason::NoManagedContents`].
    pub fn new() -> Self {
        Self {
            managed: RefCell::new(None),
            suspensions: TransactionCoordinator::suspended(SuspensionReason::NoManagedContents),
            updating: Cell::new(false),
            forwarded: Cell::new(0),
        }
    }

    /// Returns the managed collection if it is attached and still alive.
    pub fn managed(&self) -> Option<C> {
        self.managed.borrow().as_ref().and_then(C::upgrade)
    }

    /// Returns the managed collection only while updating.
    pub fn target(&self) -> Option<C> {
        if self.updating.get() {
            self.managed()
        } else {
            None
        }
    }

    #[inline]
    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }

    pub fn is_suspended_for(&self, reason: SuspensionReason) -> bool {
        self.suspensions.is_suspended_for(reason)
    }

    /// Mirrors the opening of a source transaction on the managed collection.
    pub fn forward_begin(&self) {
        if let Some(managed) = self.target() {
            self.forwarded.set(self.forwarded.get() + 1);
            managed.begin_transaction();
        }
    }

    /// Mirrors the closing of a source transaction. Brackets that were never
    /// forwarded are ignored.
    pub fn forward_end(&self) {
        let open = self.forwarded.get();
        if open == 0 {
            return;
        }
        self.forwarded.set(open - 1);
        if let Some(managed) = self.managed() {
            managed.end_transaction();
        }
    }

    fn close_forwarded(&self) {
        while self.forwarded.get() > 0 {
            self.forward_end();
        }
    }
}

/// A strategy that computes and maintains the contents of a managed
/// collection.
///
/// Implementors supply the pure recomputation and the source (dis)connection
/// hooks; the suspension bookkeeping and the attach protocol are provided.
pub trait ContentsManager: 'static {
    type Managed: EditableCollection;

    fn core(&self) -> &ManagerCore<Self::Managed>;

    /// Computes the managed contents from the current state of the sources.
    fn calculate_contents(&self) -> <Self::Managed as BroadcastingCollection>::Contents;

    /// Starts observing the sources. Called when updating begins.
    fn connect_sources(&self);

    /// Stops observing the sources. Called when updating ends.
    fn disconnect_sources(&self);

    fn is_updating(&self) -> bool {
        self.core().is_updating()
    }

    /// Lifts an explicit [`stop_updating`](Self::stop_updating). Updating only
    /// resumes once no other suspension reason is counted.
    fn start_updating(&self) {
        if self.core().is_suspended_for(SuspensionReason::Stopped) {
            self.remove_suspension_reason(SuspensionReason::Stopped);
        }
    }

    /// Suspends the manager until [`start_updating`](Self::start_updating).
    fn stop_updating(&self) {
        if !self.core().is_suspended_for(SuspensionReason::Stopped) {
            self.add_suspension_reason(SuspensionReason::Stopped);
        }
    }

    fn add_suspension_reason(&self, reason: SuspensionReason) {
        if self.core().suspensions.suspend(reason) {
            deactivate(self);
        }
    }

    /// # Panics
    ///
    /// Panics if `reason` was never added.
    fn remove_suspension_reason(&self, reason: SuspensionReason) {
        if self.core().suspensions.resume(reason) {
            activate(self);
        }
    }

    /// Recomputes the contents and applies them to the managed collection as
    /// a diff. Does nothing while suspended.
    fn recalculate(&self) {
        if let Some(managed) = self.core().target() {
            debug!("recomputing managed contents");
            managed.set_contents(self.calculate_contents());
        }
    }

    /// Makes this manager drive `target`, detaching it from whatever it
    /// managed before and replacing `target`'s previous manager.
    fn manage(self: &Rc<Self>, target: &Self::Managed)
    where
        Self: Sized,
    {
        match self.core().managed() {
            Some(previous) => previous.set_contents_manager(None),
            None => release(&**self),
        }
        let handle: Rc<dyn ManagerHandle> = Rc::new(Attachment {
            manager: self.clone(),
        });
        target.set_contents_manager(Some(handle));
        self.core().managed.replace(Some(target.downgrade()));
        debug!("contents manager attached");
        self.remove_suspension_reason(SuspensionReason::NoManagedContents);
    }
}

/// Suspends `manager` for [`SuspensionReason::NoManagedContents`] and forgets
/// its managed collection. Does nothing if it manages nothing.
fn release<M: ContentsManager + ?Sized>(manager: &M) {
    let core = manager.core();
    if core.managed.borrow().is_none() {
        return;
    }
    manager.add_suspension_reason(SuspensionReason::NoManagedContents);
    core.managed.replace(None);
    debug!("contents manager detached");
}

fn activate<M: ContentsManager + ?Sized>(manager: &M) {
    manager.core().updating.set(true);
    debug!("contents manager updating");
    manager.connect_sources();
    manager.recalculate();
}

fn deactivate<M: ContentsManager + ?Sized>(manager: &M) {
    let core = manager.core();
    if !core.updating.replace(false) {
        return;
    }
    manager.disconnect_sources();
    core.close_forwarded();
    debug!("contents manager suspended");
}

/// Runs `change` with the manager suspended, so that it reconnects and
/// recomputes once afterwards.
pub(crate) fn reconfigure<M: ContentsManager + ?Sized>(manager: &M, change: impl FnOnce()) {
    manager.add_suspension_reason(RECONFIGURING);
    change();
    manager.remove_suspension_reason(RECONFIGURING);
}

/// Swaps a single-source manager's source, keeping
/// [`SuspensionReason::NoContentsSource`] counted exactly while it has none.
pub(crate) fn replace_source<M, S>(manager: &M, slot: &RefCell<Option<S>>, source: Option<S>)
where
    M: ContentsManager + ?Sized,
{
    reconfigure(manager, || {
        let was_missing = slot.borrow().is_none();
        let now_missing = source.is_none();
        drop(slot.replace(source));
        debug!("contents source replaced");
        match (was_missing, now_missing) {
            (true, false) => manager.remove_suspension_reason(SuspensionReason::NoContentsSource),
            (false, true) => manager.add_suspension_reason(SuspensionReason::NoContentsSource),
            _ => {}
        }
    });
}

/// What a managed collection holds on to.
struct Attachment<M> {
    manager: Rc<M>,
}

impl<M: ContentsManager> ManagerHandle for Attachment<M> {
    fn detach(&self) {
        release(&*self.manager);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use herald_collections::{EditableSet, HashSet};

    /// Mirrors a plain vector of numbers, counting hook calls.
    struct Mirror {
        core: ManagerCore<EditableSet<u32>>,
        values: RefCell<Vec<u32>>,
        connects: Cell<usize>,
        disconnects: Cell<usize>,
    }

    impl Mirror {
        fn new(values: &[u32]) -> Rc<Self> {
            Rc::new(Self {
                core: ManagerCore::new(),
                values: RefCell::new(values.to_vec()),
                connects: Cell::new(0),
                disconnects: Cell::new(0),
            })
        }
    }

    impl ContentsManager for Mirror {
        type Managed = EditableSet<u32>;

        fn core(&self) -> &ManagerCore<EditableSet<u32>> {
            &self.core
        }

        fn calculate_contents(&self) -> HashSet<u32> {
            self.values.borrow().iter().copied().collect()
        }

        fn connect_sources(&self) {
            self.connects.set(self.connects.get() + 1);
        }

        fn disconnect_sources(&self) {
            self.disconnects.set(self.disconnects.get() + 1);
        }
    }

    #[test]
    fn test_manage_starts_updating() {
        let mirror = Mirror::new(&[1, 2]);
        let target = EditableSet::new();
        assert!(!mirror.is_updating());

        mirror.manage(&target);
        assert!(mirror.is_updating());
        assert!(target.contents_manager_attached());
        assert_eq!(mirror.connects.get(), 1);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_stop_and_start_updating() {
        let mirror = Mirror::new(&[1]);
        let target = EditableSet::new();
        mirror.manage(&target);

        mirror.stop_updating();
        mirror.stop_updating();
        assert!(!mirror.is_updating());
        assert_eq!(mirror.disconnects.get(), 1);

        mirror.values.borrow_mut().push(7);
        mirror.recalculate();
        assert!(!target.contains(&7));

        mirror.start_updating();
        assert!(mirror.is_updating());
        assert!(target.contains(&7));
    }

    #[test]
    fn test_suspension_reasons_overlap() {
        let mirror = Mirror::new(&[1]);
        let target = EditableSet::new();
        mirror.manage(&target);

        mirror.add_suspension_reason(SuspensionReason::Custom("loading"));
        mirror.stop_updating();
        mirror.remove_suspension_reason(SuspensionReason::Custom("loading"));
        assert!(!mirror.is_updating());
        mirror.start_updating();
        assert!(mirror.is_updating());
        assert_eq!(mirror.connects.get(), 2);
    }

    #[test]
    fn test_replacing_manager_detaches_previous() {
        let first = Mirror::new(&[1]);
        let second = Mirror::new(&[2]);
        let target = EditableSet::new();

        first.manage(&target);
        second.manage(&target);

        assert!(!first.is_updating());
        assert!(first.core().managed().is_none());
        assert!(second.is_updating());
        let expected: HashSet<u32> = [2].into_iter().collect();
        assert_eq!(target.contents(), expected);
    }

    #[test]
    fn test_clearing_manager_suspends() {
        let mirror = Mirror::new(&[1]);
        let target = EditableSet::new();
        mirror.manage(&target);

        target.set_contents_manager(None);
        assert!(!mirror.is_updating());
        assert!(mirror.core().is_suspended_for(SuspensionReason::NoManagedContents));

        mirror.values.borrow_mut().push(5);
        mirror.recalculate();
        assert!(!target.contains(&5));
    }

    #[test]
    fn test_managing_another_target_releases_the_first() {
        let mirror = Mirror::new(&[3]);
        let first = EditableSet::new();
        let second = EditableSet::new();

        mirror.manage(&first);
        mirror.manage(&second);

        assert!(!first.contents_manager_attached());
        assert!(second.contents_manager_attached());
        assert!(mirror.is_updating());
        assert!(second.contains(&3));
    }

    #[test]
    fn test_dropped_target_suspends_and_allows_reattach() {
        let mirror = Mirror::new(&[4]);
        let first = EditableSet::new();
        mirror.manage(&first);
        assert_eq!(mirror.connects.get(), 1);

        drop(first);
        assert!(!mirror.is_updating());
        assert_eq!(mirror.disconnects.get(), 1);
        assert!(mirror.core().is_suspended_for(SuspensionReason::NoManagedContents));

        let second = EditableSet::new();
        mirror.manage(&second);
        assert!(mirror.is_updating());
        assert_eq!(mirror.connects.get(), 2);
        assert!(second.contains(&4));
    }

    #[test]
    fn test_forwarded_brackets_close_on_suspend() {
        let mirror = Mirror::new(&[]);
        let target = EditableSet::new();
        mirror.manage(&target);

        mirror.core().forward_begin();
        assert_eq!(target.ongoing_transactions(), 1);
        mirror.stop_updating();
        assert_eq!(target.ongoing_transactions(), 0);

        // The matching end arrives after suspension and is ignored.
        mirror.core().forward_end();
        assert_eq!(target.ongoing_transactions(), 0);
    }
}
