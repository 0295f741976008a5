//! Journal listener for the unit tests.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Debug;
use hashbrown::{HashMap, HashSet};
use herald_core::{IndexedElements, Listener};

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

/// Keeps the applied side of every notification.
#[derive(Default)]
pub(crate) struct Journal {
    entries: RefCell<Vec<String>>,
}

impl Journal {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn push(&self, entry: String) {
        self.entries.borrow_mut().push(entry);
    }
}

impl<P: Describe, M: Debug> Listener<P, M> for Journal {
    fn will_begin_transactions(&self) {
        self.push(String::from("begin"));
    }

    fn did_end_transactions(&self) {
        self.push(String::from("end"));
    }

    fn did_add(&self, inserted: &P) {
        self.push(format!("add {}", inserted.describe()));
    }

    fn did_remove(&self, removed: &P) {
        self.push(format!("remove {}", removed.describe()));
    }

    fn did_move(&self, element: &M, from: usize, to: usize) {
        self.push(format!("move {:?} {} -> {}", element, from, to));
    }
}
