//! Viewing a collection through a conversion of its elements.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::hash::Hash;
use hashbrown::HashSet;
use herald_collections::{BroadcastingOrderedSet, BroadcastingSet};
use herald_core::{Broadcaster, BroadcastingCollection, Change, IndexedElements, Listener};

/// A set of `T` seen as a set of `U`.
pub type SetFacade<T, U> = Facade<BroadcastingSet<T>, HashSet<U>, Infallible, HashSet<U>>;

/// An ordered set of `T` seen as an ordered set of `U`.
pub type OrderedSetFacade<T, U> = Facade<BroadcastingOrderedSet<T>, IndexedElements<U>, U, Vec<U>>;

/// Exposes a source collection as a collection of another element type.
///
/// Every payload is converted on its way through; transaction brackets and
/// the order and shape of changes are preserved. The conversion must be
/// deterministic and must not map two source elements to the same value.
///
/// # Example
///
/// ```
/// use herald_collections::EditableSet;
/// use herald_core::BroadcastingCollection;
/// use herald_incremental::SetFacade;
///
/// let ids: EditableSet<u32> = EditableSet::with_contents([1, 2].into_iter().collect());
/// let wide: std::rc::Rc<SetFacade<u32, u64>> = SetFacade::from_source(ids.as_broadcasting());
/// ids.add([3]);
/// assert!(wide.contents().contains(&3u64));
/// ```
pub struct Facade<C: BroadcastingCollection, P, M, D> {
    source: C,
    broadcaster: Broadcaster<P, M>,
    convert_contents: Box<dyn Fn(C::Contents) -> D>,
    convert_payload: Box<dyn Fn(&C::Payload) -> P>,
    convert_moved: Box<dyn Fn(&C::Moved) -> M>,
}

impl<C, P, M, D> Facade<C, P, M, D>
where
    C: BroadcastingCollection + 'static,
    C::Payload: 'static,
    C::Moved: 'static,
    P: 'static,
    M: 'static,
    D: 'static,
{
    fn subscribe(
        source: C,
        convert_contents: Box<dyn Fn(C::Contents) -> D>,
        convert_payload: Box<dyn Fn(&C::Payload) -> P>,
        convert_moved: Box<dyn Fn(&C::Moved) -> M>,
    ) -> Rc<Self> {
        let facade = Rc::new(Self {
            source,
            broadcaster: Broadcaster::new(),
            convert_contents,
            convert_payload,
            convert_moved,
        });
        facade.source.add_listener(facade.clone());
        facade
    }
}

impl<C: BroadcastingCollection, P, M, D> Facade<C, P, M, D> {
    #[inline]
    pub fn source(&self) -> &C {
        &self.source
    }

    fn convert(&self, change: &Change<C::Payload, C::Moved>) -> Change<P, M> {
        change.map(|payload| (self.convert_payload)(payload), |moved| (self.convert_moved)(moved))
    }
}

impl<T, U> SetFacade<T, U>
where
    T: Clone + Eq + Hash + 'static,
    U: Eq + Hash + 'static,
{
    /// Converts with `U::from`.
    pub fn from_source(source: BroadcastingSet<T>) -> Rc<Self>
    where
        U: From<T>,
    {
        Self::with_conversion(source, |element: &T| U::from(element.clone()))
    }

    pub fn with_conversion(source: BroadcastingSet<T>, convert: impl Fn(&T) -> U + 'static) -> Rc<Self> {
        let convert = Rc::new(convert);
        let for_contents = convert.clone();
        Self::subscribe(
            source,
            Box::new(move |contents: HashSet<T>| -> HashSet<U> { contents.iter().map(|e| for_contents(e)).collect() }),
            Box::new(move |payload: &HashSet<T>| -> HashSet<U> { payload.iter().map(|e| convert(e)).collect() }),
            Box::new(|never: &Infallible| -> Infallible { match *never {} }),
        )
    }
}

impl<T, U> OrderedSetFacade<T, U>
where
    T: Clone + Eq + Hash + 'static,
    U: 'static,
{
    /// Converts with `U::from`.
    pub fn from_source(source: BroadcastingOrderedSet<T>) -> Rc<Self>
    where
        U: From<T>,
    {
        Self::with_conversion(source, |element: &T| U::from(element.clone()))
    }

    pub fn with_conversion(source: BroadcastingOrderedSet<T>, convert: impl Fn(&T) -> U + 'static) -> Rc<Self> {
        let convert = Rc::new(convert);
        let for_contents = convert.clone();
        let for_moves = convert.clone();
        Self::subscribe(
            source,
            Box::new(move |contents: Vec<T>| -> Vec<U> { contents.iter().map(|e| for_contents(e)).collect() }),
            Box::new(move |payload: &IndexedElements<T>| -> IndexedElements<U> { payload.map(|e| convert(e)) }),
            Box::new(move |element: &T| -> U { for_moves(element) }),
        )
    }
}

impl<C: BroadcastingCollection, P, M, D> Listener<C::Payload, C::Moved> for Facade<C, P, M, D> {
    fn will_begin_transactions(&self) {
        self.broadcaster.begin_transaction();
    }

    fn did_end_transactions(&self) {
        if self.broadcaster.ongoing_transactions() > 0 {
            self.broadcaster.end_transaction();
        }
    }

    fn will_apply(&self, change: &Change<C::Payload, C::Moved>) {
        if self.broadcaster.has_listeners() {
            self.broadcaster.will_apply(&self.convert(change));
        }
    }

    fn did_apply(&self, change: &Change<C::Payload, C::Moved>) {
        if self.broadcaster.has_listeners() {
            self.broadcaster.did_apply(&self.convert(change));
        }
    }
}

impl<C: BroadcastingCollection, P, M, D> BroadcastingCollection for Facade<C, P, M, D> {
    type Contents = D;
    type Payload = P;
    type Moved = M;

    fn contents(&self) -> D {
        (self.convert_contents)(self.source.contents())
    }

    fn add_listener(&self, listener: Rc<dyn Listener<P, M>>) {
        self.broadcaster.add_listener(listener);
    }

    fn remove_listener(&self, listener: &dyn Listener<P, M>) {
        self.broadcaster.remove_listener(listener);
    }

    fn has_listeners(&self) -> bool {
        self.broadcaster.has_listeners()
    }

    fn ongoing_transactions(&self) -> usize {
        self.broadcaster.ongoing_transactions()
    }
}
