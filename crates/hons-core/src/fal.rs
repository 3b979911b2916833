//! The fast-alist registry (spec §4.8, §3.4 F1-F4): maps a handle (a pair,
//! read as an ordinary `(key . value)` cons chain) to its shadow hash
//! table, the thing that makes `get`/`acons` O(1) instead of a linear scan.
//!
//! Spec §9 suggests weak-keyed storage so a caller that drops a handle
//! without calling `free` doesn't leak its shadow map. Rust has no
//! ergonomic weak-keyed `HashMap` (the handle's hash/eq depend on pointer
//! identity, which a `Weak` can't supply once the strong count hits zero),
//! so this registry holds strong keys and documents the discipline
//! instead (spec §9: "document the requirement that users explicitly call
//! `free`" is the fallback when weak keys aren't available).

use crate::value::{NormKey, Value};
use std::collections::HashMap;

/// The shadow hash table backing one fast alist (spec glossary). Maps a
/// normed key to the `(key . value)` cons cell that is its frontmost
/// occurrence in the alist chain (F4).
#[derive(Default)]
pub struct ShadowMap {
    entries: HashMap<NormKey, Value>,
}

impl ShadowMap {
    pub fn with_capacity(capacity: usize) -> ShadowMap {
        ShadowMap {
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries.get(&NormKey(key.clone())).cloned()
    }

    /// Insert/overwrite `key -> entry`. Re-inserting a key that is already
    /// present in rapid succession (the acons-then-reacons pattern spec
    /// §4.8 calls out) is just a `HashMap` overwrite — no special casing
    /// needed, which is the "does not degrade under repeated
    /// remove/insert" property the spec asks for.
    pub fn insert(&mut self, key: Value, entry: Value) {
        self.entries.insert(NormKey(key), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys().map(|k| &k.0)
    }
}

#[derive(Default)]
pub struct FastAlistRegistry {
    table: HashMap<NormKey, ShadowMap>,
}

impl FastAlistRegistry {
    pub fn new() -> FastAlistRegistry {
        FastAlistRegistry {
            table: HashMap::new(),
        }
    }

    pub fn is_registered(&self, handle: &Value) -> bool {
        self.table.contains_key(&NormKey(handle.clone()))
    }

    pub fn get(&self, handle: &Value) -> Option<&ShadowMap> {
        self.table.get(&NormKey(handle.clone()))
    }

    /// Register `handle -> map`. Spec F1: `handle` must be a pair (the
    /// empty/atom case never gets a shadow map of its own — it's the
    /// starting point `acons` builds the very first entry onto).
    pub fn register(&mut self, handle: Value, map: ShadowMap) {
        debug_assert!(handle.is_pair(), "fal_ht may only register pair handles (F1)");
        self.table.insert(NormKey(handle), map);
    }

    /// Deregister `handle`, returning its shadow map if it had one.
    /// Spec §5: callers performing an update must `deregister(old) ->
    /// mutate(map) -> register(new)`, never leaving a stale binding.
    pub fn deregister(&mut self, handle: &Value) -> Option<ShadowMap> {
        self.table.remove(&NormKey(handle.clone()))
    }

    pub fn free(&mut self, handle: &Value) {
        self.deregister(handle);
    }

    /// Every currently-registered handle, for `clear`/`wash`'s "reinstall
    /// the fast-alist registry" step (spec §4.9/§4.10) — the registry
    /// itself is rebuilt from scratch by whoever calls this, walking each
    /// handle's chain and registering a fresh map once the chain's pairs
    /// are re-canonicalized.
    pub fn handles(&self) -> impl Iterator<Item = &Value> {
        self.table.keys().map(|k| &k.0)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Swap in a fresh, empty registry, returning the old one (spec §4.9
    /// step 2 / §4.10 step 2: "atomically swap in empty replacements").
    pub fn take(&mut self) -> FastAlistRegistry {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Atom, Pair};

    fn handle() -> Value {
        Value::Pair(Pair::new(
            Value::cons(Value::Atom(Atom::Str("a".into())), Value::Atom(Atom::Int(1))),
            Value::Atom(Atom::Nil),
        ))
    }

    #[test]
    fn register_then_lookup() {
        let mut reg = FastAlistRegistry::new();
        let h = handle();
        let mut map = ShadowMap::with_capacity(8);
        map.insert(Value::Atom(Atom::Str("a".into())), Value::Atom(Atom::Int(1)));
        reg.register(h.clone(), map);
        assert!(reg.is_registered(&h));
        assert_eq!(reg.get(&h).unwrap().len(), 1);
    }

    #[test]
    fn deregister_then_reregister_preserves_map_contents() {
        let mut reg = FastAlistRegistry::new();
        let h1 = handle();
        let mut map = ShadowMap::with_capacity(8);
        map.insert(Value::Atom(Atom::Int(1)), Value::Atom(Atom::Int(100)));
        reg.register(h1.clone(), map);

        let mut map = reg.deregister(&h1).unwrap();
        assert!(!reg.is_registered(&h1));
        map.insert(Value::Atom(Atom::Int(2)), Value::Atom(Atom::Int(200)));
        let h2 = Value::Pair(Pair::new(
            Value::cons(Value::Atom(Atom::Int(2)), Value::Atom(Atom::Int(200))),
            h1,
        ));
        reg.register(h2.clone(), map);
        assert_eq!(reg.get(&h2).unwrap().len(), 2);
    }

    #[test]
    fn shadow_map_overwrite_does_not_grow_on_repeated_key() {
        let mut map = ShadowMap::with_capacity(4);
        for i in 0..50 {
            map.insert(Value::Atom(Atom::Str("same".into())), Value::Atom(Atom::Int(i)));
        }
        assert_eq!(map.len(), 1);
    }
}
