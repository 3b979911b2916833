//! The norm cache (spec §4.1): a bounded, identity-keyed memo of
//! previously-normed values. Purely a performance aid — it may forget
//! entries at any time without affecting correctness, so every method
//! here is allowed to be approximate about what it remembers.

use crate::value::{NormKey, Value};
use std::collections::HashMap;

/// `3/4 * 400_000`, the cutoff spec §4.1 names for the open-map variant.
const DEFAULT_OPEN_MAP_CAPACITY: usize = 400_000;

/// `2^20`, the fixed-array variant's table length (addressed back-end).
const FIXED_ARRAY_LEN: usize = 1 << 20;

pub struct OpenMapCache {
    map: HashMap<NormKey, Value>,
    count: usize,
    cutoff: usize,
}

impl OpenMapCache {
    pub fn new(capacity: usize) -> OpenMapCache {
        OpenMapCache {
            map: HashMap::new(),
            count: 0,
            cutoff: (capacity * 3) / 4,
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.map.get(&NormKey(key.clone())).cloned()
    }

    /// Insert `key -> value`. The counter is incremented *before* the
    /// possible flush so that an interruption mid-`set` can only ever
    /// over-count (triggering a spurious early flush), never under-count
    /// (which could let the map grow unbounded) — spec §4.1.
    pub fn set(&mut self, key: Value, value: Value) {
        self.count += 1;
        if self.count > self.cutoff {
            self.map.clear();
            self.count = 1;
            tracing::trace!(cutoff = self.cutoff, "norm cache flushed (open map)");
        }
        self.map.insert(NormKey(key), value);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Two parallel fixed-length arrays indexed by a cheap hash of the
/// input's assigned address. A lookup only hits when the stored key is
/// identity-equal to the query; everything else is treated as a miss,
/// never an error.
pub struct FixedArrayCache {
    keys: Vec<Option<Value>>,
    vals: Vec<Option<Value>>,
    hits: u64,
    misses: u64,
}

fn slot_index(addr: u64) -> usize {
    ((addr >> 5) & ((FIXED_ARRAY_LEN as u64) - 1)) as usize
}

impl FixedArrayCache {
    pub fn new() -> FixedArrayCache {
        FixedArrayCache {
            keys: vec![None; FIXED_ARRAY_LEN],
            vals: vec![None; FIXED_ARRAY_LEN],
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &Value, addr: u64) -> Option<Value> {
        let i = slot_index(addr);
        match &self.keys[i] {
            Some(k) if k.ptr_eq(key) => {
                self.hits += 1;
                self.vals[i].clone()
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `key -> value`. The two slots must appear to update
    /// atomically with respect to a signal interruption (spec §4.1): we
    /// write the value first, then the key, inside a no-interrupts
    /// section, so a reader can never observe a key updated to the new
    /// entry paired with a stale value from the slot's previous tenant.
    pub fn set(&mut self, key: Value, value: Value, addr: u64) {
        let i = slot_index(addr);
        crate::critical::no_interrupts(|| {
            self.vals[i] = Some(value);
            self.keys[i] = Some(key);
        });
    }

    pub fn clear(&mut self) {
        for slot in &mut self.keys {
            *slot = None;
        }
        for slot in &mut self.vals {
            *slot = None;
        }
        self.hits = 0;
        self.misses = 0;
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Default for FixedArrayCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The active norm cache implementation (spec §4.1's two allowed shapes).
pub enum NormCache {
    OpenMap(OpenMapCache),
    FixedArray(FixedArrayCache),
}

impl NormCache {
    pub fn open_map(capacity: usize) -> NormCache {
        NormCache::OpenMap(OpenMapCache::new(capacity))
    }

    pub fn fixed_array() -> NormCache {
        NormCache::FixedArray(FixedArrayCache::new())
    }

    /// `addr_of` is only invoked for the fixed-array variant, so callers
    /// on the chained back-end (which has no addresses) never pay for it.
    pub fn get(&mut self, key: &Value, addr_of: impl FnOnce() -> u64) -> Option<Value> {
        match self {
            NormCache::OpenMap(c) => c.get(key),
            NormCache::FixedArray(c) => c.get(key, addr_of()),
        }
    }

    pub fn set(&mut self, key: Value, value: Value, addr_of: impl FnOnce() -> u64) {
        match self {
            NormCache::OpenMap(c) => c.set(key, value),
            NormCache::FixedArray(c) => c.set(key, value, addr_of()),
        }
    }

    pub fn clear(&mut self) {
        match self {
            NormCache::OpenMap(c) => c.clear(),
            NormCache::FixedArray(c) => c.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Atom;

    #[test]
    fn open_map_round_trips() {
        let mut c = OpenMapCache::new(10);
        let k = Value::Atom(Atom::Int(1));
        let v = Value::Atom(Atom::Int(2));
        assert!(c.get(&k).is_none());
        c.set(k.clone(), v.clone());
        assert!(c.get(&k).unwrap().ptr_eq(&v));
    }

    #[test]
    fn open_map_flushes_before_overflow_not_after() {
        // capacity 4 -> cutoff = 3. The 4th set() must observe count=4>3
        // and flush *before* inserting, per spec's ordering requirement.
        let mut c = OpenMapCache::new(4);
        for i in 0..3 {
            c.set(
                Value::Atom(Atom::Int(i)),
                Value::Atom(Atom::Int(i)),
            );
        }
        assert_eq!(c.len(), 3);
        c.set(Value::Atom(Atom::Int(100)), Value::Atom(Atom::Int(100)));
        // Flushed, then the 100 entry inserted: only one survivor.
        assert_eq!(c.len(), 1);
        assert!(c.get(&Value::Atom(Atom::Int(0))).is_none());
        assert!(c.get(&Value::Atom(Atom::Int(100))).is_some());
    }

    #[test]
    fn fixed_array_miss_on_different_identity_same_slot() {
        let mut c = FixedArrayCache::new();
        let k1 = Value::Atom(Atom::Int(1));
        let k2 = Value::Atom(Atom::Int(2));
        // Same address on purpose -> same slot, different identity.
        c.set(k1.clone(), Value::Atom(Atom::Int(10)), 64);
        assert!(c.get(&k1, 64).is_some());
        assert!(c.get(&k2, 64).is_none());
    }
}
