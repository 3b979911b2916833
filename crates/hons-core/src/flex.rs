//! The "flex alist": small-then-large polymorphic associative container
//! used inside the chained back-end's `cdr_ht`/`cdr_ht_eql` buckets
//! (spec §4.4, glossary). Each bucket starts as a short `Vec` scanned
//! linearly and promotes itself to a hash map once it would exceed 18
//! entries. The promotion is meant to look atomic to the caller: there
//! is never a moment where a lookup sees neither representation.
//! Because `HonsSpace` is single-owner (spec §5), "atomic" here just
//! means "the old `Small` is never read after `promote` installs the new
//! `Large`" — there is no concurrent reader to race.

use crate::value::{NormKey, Pair, Value};
use std::collections::HashMap;

const SMALL_LIMIT: usize = 18;

pub enum FlexAlist {
    Small(Vec<(Value, Pair)>),
    Large(HashMap<NormKey, Pair>),
}

impl FlexAlist {
    pub fn new() -> FlexAlist {
        FlexAlist::Small(Vec::new())
    }

    pub fn get(&self, key: &Value) -> Option<Pair> {
        match self {
            FlexAlist::Small(v) => v
                .iter()
                .find(|(k, _)| k.ptr_eq(key))
                .map(|(_, p)| p.clone()),
            FlexAlist::Large(m) => m.get(&NormKey(key.clone())).cloned(),
        }
    }

    /// Insert `key -> pair`, promoting `Small -> Large` if this insert
    /// would push the small vector past `SMALL_LIMIT` entries.
    pub fn insert(&mut self, key: Value, pair: Pair) {
        match self {
            FlexAlist::Small(v) => {
                if v.len() >= SMALL_LIMIT {
                    let mut map: HashMap<NormKey, Pair> = v
                        .drain(..)
                        .map(|(k, p)| (NormKey(k), p))
                        .collect();
                    map.insert(NormKey(key), pair);
                    tracing::debug!(limit = SMALL_LIMIT, "flex alist promoted to map");
                    *self = FlexAlist::Large(map);
                } else {
                    v.push((key, pair));
                }
            }
            FlexAlist::Large(m) => {
                m.insert(NormKey(key), pair);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlexAlist::Small(v) => v.len(),
            FlexAlist::Large(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FlexAlist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Atom;

    fn pair(n: i64) -> Pair {
        Pair::new(Value::Atom(Atom::Int(n)), Value::Atom(Atom::Nil))
    }

    #[test]
    fn stays_small_under_limit() {
        let mut f = FlexAlist::new();
        for i in 0..SMALL_LIMIT {
            f.insert(Value::Atom(Atom::Int(i as i64)), pair(i as i64));
        }
        assert!(matches!(f, FlexAlist::Small(_)));
        assert_eq!(f.len(), SMALL_LIMIT);
    }

    #[test]
    fn promotes_past_limit_and_keeps_all_entries() {
        let mut f = FlexAlist::new();
        for i in 0..(SMALL_LIMIT + 5) {
            f.insert(Value::Atom(Atom::Int(i as i64)), pair(i as i64));
        }
        assert!(matches!(f, FlexAlist::Large(_)));
        assert_eq!(f.len(), SMALL_LIMIT + 5);
        for i in 0..(SMALL_LIMIT + 5) {
            assert!(f.get(&Value::Atom(Atom::Int(i as i64))).is_some());
        }
    }
}
