//! The persistence set (spec §4.6, §3.4 "Persistence"): the set of
//! canonical-pair roots that must survive a `clear`/`wash`.

use crate::value::{NormKey, Value};
use std::collections::HashSet;

#[derive(Default)]
pub struct PersistSet(HashSet<NormKey>);

impl PersistSet {
    pub fn new() -> PersistSet {
        PersistSet(HashSet::new())
    }

    /// Record `v` (must already be a normed pair — spec's Persistence
    /// invariant) as a root to reinstall across `clear`/`wash`.
    pub fn insert(&mut self, v: Value) {
        debug_assert!(v.is_pair(), "persist_ht may only hold normed pairs");
        self.0.insert(NormKey(v));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|k| &k.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Swap in a fresh, empty set, returning the old one — used by
    /// `clear`/`wash` to hold the roots aside while the back-end tables
    /// are rebuilt (spec §4.9 step 2, §4.10 step 2).
    pub fn take(&mut self) -> PersistSet {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Atom, Pair};

    fn pair() -> Value {
        Value::Pair(Pair::new(Value::Atom(Atom::Int(1)), Value::Atom(Atom::Nil)))
    }

    #[test]
    fn insert_and_iterate() {
        let mut set = PersistSet::new();
        let p = pair();
        set.insert(p.clone());
        assert_eq!(set.len(), 1);
        assert!(set.iter().any(|v| v.ptr_eq(&p)));
    }

    #[test]
    fn take_leaves_an_empty_set_behind() {
        let mut set = PersistSet::new();
        set.insert(pair());
        let taken = set.take();
        assert_eq!(taken.len(), 1);
        assert!(set.is_empty());
    }
}
