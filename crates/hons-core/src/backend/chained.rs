//! The portable, pointer-free back-end (spec §3.3, §4.4 "Chained
//! back-end"). Canonical pairs are located by a two-level lookup keyed
//! on the pair's tail, routed through a tagged classification rather
//! than a runtime type test (spec §9's "tag variants" recommendation).

use crate::backend::BackendStats;
use crate::error::HonsError;
use crate::flex::FlexAlist;
use crate::value::{Atom, NormKey, Pair, Value};
use std::collections::HashMap;

enum TailShape {
    Null,
    Pointer,
    Value,
}

fn classify_tail(tail: &Value) -> TailShape {
    match tail {
        Value::Atom(Atom::Nil) => TailShape::Null,
        Value::Atom(a) if a.is_pointer_comparable() => TailShape::Pointer,
        Value::Pair(_) => TailShape::Pointer,
        Value::Atom(_) => TailShape::Value,
    }
}

pub struct ChainedBackend {
    nil_ht: HashMap<NormKey, Pair>,
    cdr_ht: HashMap<NormKey, FlexAlist>,
    cdr_ht_eql: HashMap<NormKey, FlexAlist>,
}

impl ChainedBackend {
    pub fn new() -> ChainedBackend {
        ChainedBackend {
            nil_ht: HashMap::new(),
            cdr_ht: HashMap::new(),
            cdr_ht_eql: HashMap::new(),
        }
    }

    pub fn with_capacity(nil_cap: usize, cdr_cap: usize, cdr_eql_cap: usize) -> ChainedBackend {
        ChainedBackend {
            nil_ht: HashMap::with_capacity(nil_cap),
            cdr_ht: HashMap::with_capacity(cdr_cap),
            cdr_ht_eql: HashMap::with_capacity(cdr_eql_cap),
        }
    }

    pub fn find_canonical(&self, head: &Value, tail: &Value) -> Option<Pair> {
        match classify_tail(tail) {
            TailShape::Null => self.nil_ht.get(&NormKey(head.clone())).cloned(),
            TailShape::Pointer => self
                .cdr_ht
                .get(&NormKey(tail.clone()))
                .and_then(|flex| flex.get(head)),
            TailShape::Value => self
                .cdr_ht_eql
                .get(&NormKey(tail.clone()))
                .and_then(|flex| flex.get(head)),
        }
    }

    pub fn canonicalize(
        &mut self,
        head: Value,
        tail: Value,
        hint: Option<Pair>,
    ) -> Result<Pair, HonsError> {
        if let Some(existing) = self.find_canonical(&head, &tail) {
            return Ok(existing);
        }
        let pair = hint.unwrap_or_else(|| Pair::new(head.clone(), tail.clone()));
        match classify_tail(&tail) {
            TailShape::Null => {
                self.nil_ht.insert(NormKey(head), pair.clone());
            }
            TailShape::Pointer => {
                self.cdr_ht
                    .entry(NormKey(tail))
                    .or_default()
                    .insert(head, pair.clone());
            }
            TailShape::Value => {
                self.cdr_ht_eql
                    .entry(NormKey(tail))
                    .or_default()
                    .insert(head, pair.clone());
            }
        }
        Ok(pair)
    }

    pub fn stats(&self) -> BackendStats {
        let flex_total: usize = self
            .cdr_ht
            .values()
            .chain(self.cdr_ht_eql.values())
            .map(|f| f.len())
            .sum();
        BackendStats {
            canonical_pairs: self.nil_ht.len() + flex_total,
            nil_entries: self.nil_ht.len(),
            cdr_buckets: self.cdr_ht.len(),
            cdr_eql_buckets: self.cdr_ht_eql.len(),
            ..Default::default()
        }
    }
}

impl Default for ChainedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_is_idempotent_by_identity() {
        let mut b = ChainedBackend::new();
        let h = Value::Atom(Atom::Int(1));
        let t = Value::Atom(Atom::Nil);
        let p1 = b.canonicalize(h.clone(), t.clone(), None).unwrap();
        let p2 = b.canonicalize(h, t, None).unwrap();
        assert!(p1.ptr_eq(&p2));
    }

    #[test]
    fn distinguishes_tail_shapes() {
        let mut b = ChainedBackend::new();
        let h = Value::Atom(Atom::Int(1));
        let nil_pair = b.canonicalize(h.clone(), Value::Atom(Atom::Nil), None).unwrap();
        let eql_pair = b.canonicalize(h.clone(), Value::Atom(Atom::Int(2)), None).unwrap();
        assert!(!nil_pair.ptr_eq(&eql_pair));
        let stats = b.stats();
        assert_eq!(stats.nil_entries, 1);
        assert_eq!(stats.cdr_eql_buckets, 1);
    }

    #[test]
    fn hint_is_adopted_when_eligible() {
        let mut b = ChainedBackend::new();
        let h = Value::Atom(Atom::Int(1));
        let t = Value::Atom(Atom::Nil);
        let hint = Pair::new(h.clone(), t.clone());
        let canon = b.canonicalize(h, t, Some(hint.clone())).unwrap();
        assert!(canon.ptr_eq(&hint));
    }
}
