//! Re-broadcasting another collection's notifications.

use alloc::rc::Rc;
use herald_core::{Broadcaster, BroadcastingCollection, Change, Listener};

/// Re-emits every notification of one collection to its own listeners.
///
/// Listeners register with the republisher instead of the origin, so they
/// can be detached without knowing where the changes really come from.
/// Changes are forwarded unchanged and `contents()` reads the origin.
pub struct Republisher<C: BroadcastingCollection> {
    source: C,
    broadcaster: Broadcaster<C::Payload, C::Moved>,
}

impl<C> Republisher<C>
where
    C: BroadcastingCollection + 'static,
    C::Payload: 'static,
    C::Moved: 'static,
{
    pub fn new(source: C) -> Rc<Self> {
        let republisher = Rc::new(Self {
            source,
            broadcaster: Broadcaster::new(),
        });
        republisher.source.add_listener(republisher.clone());
        republisher
    }
}

impl<C: BroadcastingCollection> Republisher<C> {
    #[inline]
    pub fn source(&self) -> &C {
        &self.source
    }
}

impl<C: BroadcastingCollection> Listener<C::Payload, C::Moved> for Republisher<C> {
    fn will_begin_transactions(&self) {
        self.broadcaster.begin_transaction();
    }

    fn did_end_transactions(&self) {
        // A bracket opened before this republisher subscribed is not ours.
        if self.broadcaster.ongoing_transactions() > 0 {
            self.broadcaster.end_transaction();
        }
    }

    fn will_apply(&self, change: &Change<C::Payload, C::Moved>) {
        self.broadcaster.will_apply(change);
    }

    fn did_apply(&self, change: &Change<C::Payload, C::Moved>) {
        self.broadcaster.did_apply(change);
    }
}

impl<C: BroadcastingCollection> BroadcastingCollection for Republisher<C> {
    type Contents = C::Contents;
    type Payload = C::Payload;
    type Moved = C::Moved;

    fn contents(&self) -> C::Contents {
        self.source.contents()
    }

    fn add_listener(&self, listener: Rc<dyn Listener<C::Payload, C::Moved>>) {
        self.broadcaster.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<C::Payload, C::Moved>) {
        self.broadcaster.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.broadcaster.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.broadcaster.ongoing_transactions()
    }
}
