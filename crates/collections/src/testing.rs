//! Recording listener shared by the unit tests.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Debug;
use hashbrown::{HashMap, HashSet};
use herald_core::{Change, IndexedElements, Listener};

pub(crate) trait Describe {
    fn describe(&self) -> String;
}

impl<T: Ord + Debug> Describe for HashSet<T> {
    fn describe(&self) -> String {
        let mut items: Vec<&T> = self.iter().collect();
        items.sort();
        format!("{:?}", items)
    }
}

impl<K: Ord + Debug, V: Debug> Describe for HashMap<K, V> {
    fn describe(&self) -> String {
        let mut items: Vec<(&K, &V)> = self.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        format!("{:?}", items)
    }
}

impl<T: Debug> Describe for IndexedElements<T> {
    fn describe(&self) -> String {
        format!("{:?}", self.iter().collect::<Vec<_>>())
    }
}

/// Records every notification as a short string.
#[derive(Default)]
pub(crate) struct Recorder {
    events: RefCell<Vec<String>>,
}

impl Recorder {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record<P: Describe, M: Debug>(&self, phase: &str, change: &Change<P, M>) {
        let entry = match change {
            Change::Insertion {
                inserted,
                paired_removal: None,
            } => format!("{}_insert {}", phase, inserted.describe()),
            Change::Insertion {
                inserted,
                paired_removal: Some(old),
            } => format!("{}_insert {} replacing {}", phase, inserted.describe(), old.describe()),
            Change::Removal {
                removed,
                paired_insertion: None,
            } => format!("{}_remove {}", phase, removed.describe()),
            Change::Removal {
                removed,
                paired_insertion: Some(new),
            } => format!("{}_remove {} replaced by {}", phase, removed.describe(), new.describe()),
            Change::Move { element, from, to } => {
                format!("{}_move {:?} {} -> {}", phase, element, from, to)
            }
        };
        self.events.borrow_mut().push(entry);
    }
}

impl<P: Describe, M: Debug> Listener<P, M> for Recorder {
    fn will_begin_transactions(&self) {
        self.events.borrow_mut().push(String::from("begin"));
    }

    fn did_end_transactions(&self) {
        self.events.borrow_mut().push(String::from("end"));
    }

    fn will_apply(&self, change: &Change<P, M>) {
        self.record("will", change);
    }

    fn did_apply(&self, change: &Change<P, M>) {
        self.record("did", change);
    }
}
