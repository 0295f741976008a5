//! End-to-end scenarios across collections and contents managers.

use herald_collections::{EditableOrderedSet, EditableSet, HashSet, OrderedSetChange};
use herald_core::{BroadcastingCollection, Change, EditableCollection, FnListener, IndexedElements, Notification};
use herald_incremental::{ContentsManager, OrderedSetFacade, Republisher, SetFilter, SetMixer, SortedProjection};
use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A record whose identity is its id and whose number can change in place.
#[derive(Debug)]
struct Sample {
    id: u32,
    number: Cell<i32>,
}

impl Sample {
    fn new(id: u32, number: i32) -> Rc<Self> {
        Rc::new(Self {
            id,
            number: Cell::new(number),
        })
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sample {}

impl Hash for Sample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

type Log = Rc<RefCell<Vec<String>>>;

/// Records every notification of a set as `phase kind [sorted elements]`.
fn set_log<T: Ord + Debug + 'static>(log: &Log) -> Rc<FnListener<HashSet<T>>> {
    let log = log.clone();
    FnListener::new(move |n: Notification<'_, HashSet<T>>| {
        let entry = match n {
            Notification::WillBeginTransactions => "begin".to_string(),
            Notification::DidEndTransactions => "end".to_string(),
            Notification::WillApply(change) => describe("will", change),
            Notification::DidApply(change) => describe("did", change),
        };
        log.borrow_mut().push(entry);
    })
}

fn describe<T: Ord + Debug>(phase: &str, change: &Change<HashSet<T>>) -> String {
    let (kind, payload) = match change {
        Change::Insertion { inserted, .. } => ("add", inserted),
        Change::Removal { removed, .. } => ("remove", removed),
        Change::Move { element, .. } => match *element {},
    };
    let mut items: Vec<&T> = payload.iter().collect();
    items.sort();
    format!("{} {} {:?}", phase, kind, items)
}

#[test]
fn test_filter_reevaluation_after_value_change() {
    let samples: Vec<Rc<Sample>> = (1..=14)
        .map(|id| Sample::new(id, if id == 14 { 32 } else { id as i32 }))
        .collect();
    let source = EditableSet::with_contents(samples.iter().cloned().collect());
    let filter = SetFilter::new(Some(source.as_broadcasting()), |s: &Rc<Sample>| s.number.get() % 2 != 0);
    let odd = EditableSet::new();
    filter.manage(&odd);
    assert_eq!(odd.len(), 7);

    let events: Log = Rc::default();
    let ids: Rc<RefCell<Vec<u32>>> = Rc::default();
    let seen = ids.clone();
    let log = events.clone();
    let listener = FnListener::new(move |n: Notification<'_, HashSet<Rc<Sample>>>| {
        let entry = match n {
            Notification::WillBeginTransactions => "begin",
            Notification::DidEndTransactions => "end",
            Notification::WillApply(Change::Insertion { inserted, .. }) => {
                seen.borrow_mut().extend(inserted.iter().map(|s| s.id));
                "will_add"
            }
            Notification::DidApply(Change::Insertion { .. }) => "did_add",
            Notification::WillApply(Change::Removal { .. }) => "will_remove",
            Notification::DidApply(Change::Removal { .. }) => "did_remove",
            Notification::WillApply(Change::Move { element, .. })
            | Notification::DidApply(Change::Move { element, .. }) => match *element {},
        };
        log.borrow_mut().push(entry.to_string());
    });
    odd.add_listener(listener.clone());

    let changed = samples[13].clone();
    changed.number.set(31);
    filter.reevaluate([changed.clone()]);
    assert_eq!(*events.borrow(), vec!["will_add", "did_add"]);
    assert_eq!(*ids.borrow(), vec![14]);
    assert!(odd.contains(&changed));

    events.borrow_mut().clear();
    changed.number.set(32);
    filter.reevaluate([changed.clone()]);
    assert_eq!(*events.borrow(), vec!["will_remove", "did_remove"]);
    assert!(!odd.contains(&changed));

    events.borrow_mut().clear();
    filter.reevaluate([Sample::new(99, 1)]);
    assert!(events.borrow().is_empty());
}

#[test]
fn test_intersection_picks_up_new_members() {
    let a: EditableSet<u32> = EditableSet::with_contents((1..=14).collect());
    let b: EditableSet<u32> = EditableSet::new();
    let mixer = SetMixer::intersection([a.as_broadcasting(), b.as_broadcasting()]);
    let both = EditableSet::new();
    mixer.manage(&both);
    assert!(both.is_empty());

    let events: Log = Rc::default();
    let listener = set_log::<u32>(&events);
    both.add_listener(listener.clone());

    b.add([1, 2, 3]);

    let expected: HashSet<u32> = [1, 2, 3].into_iter().collect();
    assert_eq!(both.contents(), expected);
    assert_eq!(*events.borrow(), vec!["will add [1, 2, 3]", "did add [1, 2, 3]"]);
}

#[test]
fn test_listener_removed_mid_transaction_hears_nothing_more() {
    let set: EditableSet<u32> = EditableSet::with_contents([1, 2].into_iter().collect());
    let events: Log = Rc::default();
    let victim = set_log::<u32>(&events);

    let target = set.clone();
    let doomed = victim.clone();
    let remover = FnListener::new(move |n: Notification<'_, HashSet<u32>>| {
        if let Notification::DidApply(Change::Removal { .. }) = n {
            target.remove_listener(&*doomed);
        }
    });
    set.add_listener(remover.clone());
    set.add_listener(victim.clone());

    set.set_contents([2, 3].into_iter().collect());

    assert_eq!(*events.borrow(), vec!["begin", "will remove [1]"]);
    assert_eq!(set.ongoing_transactions(), 0);
    assert!(set.contains(&3));
}

#[test]
fn test_dropped_listener_is_skipped() {
    let set: EditableSet<u32> = EditableSet::new();
    let events: Log = Rc::default();
    let listener = set_log::<u32>(&events);
    set.add_listener(listener.clone());

    set.add([1]);
    drop(listener);
    set.add([2]);

    assert_eq!(*events.borrow(), vec!["will add [1]", "did add [1]"]);
    assert!(!set.has_listeners());
}

#[test]
fn test_listener_may_mutate_another_collection() {
    let source: EditableSet<u32> = EditableSet::new();
    let mirror: EditableSet<u32> = EditableSet::new();
    let copy = mirror.clone();
    let listener = FnListener::new(move |n: Notification<'_, HashSet<u32>>| match n {
        Notification::DidApply(Change::Insertion { inserted, .. }) => copy.add(inserted.iter().copied()),
        Notification::DidApply(Change::Removal { removed, .. }) => copy.remove(removed.iter().copied()),
        _ => {}
    });
    source.add_listener(listener.clone());

    source.add([1, 2, 3]);
    source.remove([2]);
    assert_eq!(mirror.contents(), source.contents());
}

#[test]
fn test_chained_managers() {
    let numbers: EditableSet<i32> = EditableSet::with_contents([5, -1, 8, 3, -7].into_iter().collect());
    let positive = EditableSet::new();
    SetFilter::new(Some(numbers.as_broadcasting()), |n: &i32| *n > 0).manage(&positive);
    let ranked = EditableOrderedSet::new();
    let projection = SortedProjection::new(Some(positive.as_broadcasting()), |a: &i32, b: &i32| a.cmp(b));
    projection.manage(&ranked);
    let labels = OrderedSetFacade::with_conversion(ranked.as_broadcasting(), |n: &i32| format!("n{}", n));
    let feed = Republisher::new(labels.clone());
    assert_eq!(feed.contents(), vec!["n3", "n5", "n8"]);

    let changes: Rc<RefCell<Vec<OrderedSetChange<String>>>> = Rc::default();
    let sink = changes.clone();
    let listener = FnListener::new(move |n: Notification<'_, IndexedElements<String>, String>| {
        if let Notification::DidApply(change) = n {
            sink.borrow_mut().push(change.clone());
        }
    });
    feed.add_listener(listener.clone());

    numbers.add([4, -2]);
    numbers.remove([5]);

    let changes = changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0], Change::insertion([(1, "n4".to_string())].into_iter().collect()));
    assert_eq!(changes[1], Change::removal([(2, "n5".to_string())].into_iter().collect()));
    assert_eq!(feed.contents(), vec!["n3", "n4", "n8"]);
}

#[test]
fn test_dropping_the_managed_collection_releases_the_manager() {
    let source: EditableSet<u32> = EditableSet::with_contents([1, 2].into_iter().collect());
    let managed = EditableSet::new();
    let filter = SetFilter::new(Some(source.as_broadcasting()), |_: &u32| true);
    filter.manage(&managed);
    let weak = Rc::downgrade(&filter);
    drop(filter);
    assert!(weak.upgrade().is_some());

    drop(managed);
    assert!(weak.upgrade().is_none());
    assert!(!source.has_listeners());
    source.add([3]);
}

#[test]
fn test_manager_outliving_its_collection_can_be_reattached() {
    let source: EditableSet<u32> = EditableSet::with_contents([1, 2, 3, 4].into_iter().collect());
    let filter = SetFilter::new(Some(source.as_broadcasting()), |n: &u32| n % 2 == 0);
    let first = EditableSet::new();
    filter.manage(&first);
    assert!(source.has_listeners());

    drop(first);
    assert!(!filter.is_updating());
    assert!(!source.has_listeners());
    source.add([6]);

    let second = EditableSet::new();
    filter.manage(&second);
    assert!(filter.is_updating());
    let expected: HashSet<u32> = [2, 4, 6].into_iter().collect();
    assert_eq!(second.contents(), expected);

    source.add([8]);
    assert!(second.contains(&8));
}

#[test]
fn test_manual_bracket_groups_manager_output() {
    let source: EditableSet<u32> = EditableSet::new();
    let filter = SetFilter::new(Some(source.as_broadcasting()), |n: &u32| n % 2 == 0);
    let even = EditableSet::new();
    filter.manage(&even);
    let events: Log = Rc::default();
    let listener = set_log::<u32>(&events);
    even.add_listener(listener.clone());

    source.perform_transaction(|| {
        source.add([2]);
        source.add([3, 4]);
    });

    assert_eq!(
        *events.borrow(),
        vec!["begin", "will add [2]", "did add [2]", "will add [4]", "did add [4]", "end"]
    );
}
