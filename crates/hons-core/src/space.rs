//! The Hons Space itself (spec §2, §3.5): the engine instance that owns a
//! canonical-pair back-end, the norm cache, the fast-alist registry, and
//! the persistence set, and ties them together into the operations of §4.

use crate::backend::{Backend, BackendStats};
use crate::backend::{addressed::AddressedBackend, chained::ChainedBackend};
use crate::cache::NormCache;
use crate::config::{BackendKind, HonsConfig, ResizeHints, SlowAlistAction};
use crate::error::HonsError;
use crate::fal::{FastAlistRegistry, ShadowMap};
use crate::persist::PersistSet;
use crate::value::{deep_equal, lite_equal, Atom, NormKey, Pair, Value};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A single hash-consing engine instance and its tables (spec §2).
///
/// Not `Send`/`Sync`: a `HonsSpace` is strictly single-owner within one
/// logical execution context (spec §5). Embedders that want isolated
/// spaces for tests or benchmarking construct their own; see the `hons`
/// crate for the process-wide thread-local default the `hons_*` façade
/// forwards to.
pub struct HonsSpace {
    backend: Backend,
    cache: NormCache,
    persist: PersistSet,
    fal: FastAlistRegistry,
    /// Unifies equal-content strings into one canonical `Rc<str>` (spec
    /// §4.5): shared across both back-ends, since the addressed
    /// back-end's own bookkeeping (see `backend::addressed`) only assigns
    /// an *address* to a string that already arrived here canonical.
    str_ht: HashMap<String, Rc<str>>,
    config: HonsConfig,
}

impl HonsSpace {
    pub fn new(config: HonsConfig) -> HonsSpace {
        let backend = match config.backend {
            BackendKind::Chained => Backend::Chained(ChainedBackend::with_capacity(
                config.nil_ht_capacity,
                config.cdr_ht_capacity,
                config.cdr_ht_eql_capacity,
            )),
            BackendKind::Addressed => Backend::Addressed(AddressedBackend::with_capacity(
                config.addr_ht_capacity,
                config.sbits_capacity_bits,
            )),
        };
        let cache = match config.backend {
            BackendKind::Chained => NormCache::open_map(config.norm_cache_capacity),
            BackendKind::Addressed => NormCache::fixed_array(),
        };
        HonsSpace {
            backend,
            cache,
            persist: PersistSet::new(),
            fal: FastAlistRegistry::new(),
            str_ht: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &HonsConfig {
        &self.config
    }

    // ---- §4.5 atom normalizer -------------------------------------

    fn norm_atom_value(&mut self, v: Value) -> Value {
        match v {
            Value::Atom(Atom::Str(s)) => Value::Atom(Atom::Str(self.norm_str(s))),
            atom @ Value::Atom(_) => atom,
            Value::Pair(_) => unreachable!("norm_atom_value called on a pair"),
        }
    }

    fn norm_str(&mut self, s: Rc<str>) -> Rc<str> {
        if let Some(existing) = self.str_ht.get(s.as_ref()) {
            return existing.clone();
        }
        self.str_ht.insert(s.to_string(), s.clone());
        s
    }

    // ---- §4.1/§4.3 norm cache + pair normalizer --------------------

    /// `norm(x)`: return the normed value semantically equal to `x`
    /// (spec §4.3). Uses an explicit work stack rather than recursion so
    /// pathologically deep structures can't exhaust the call stack.
    pub fn norm(&mut self, x: Value) -> Value {
        let root = match &x {
            Value::Atom(_) => return self.norm_atom_value(x),
            Value::Pair(p) => p.clone(),
        };

        enum Frame {
            Enter(Pair),
            Exit(Pair),
        }

        let mut stack = vec![Frame::Enter(root.clone())];
        let mut memo: HashMap<usize, Value> = HashMap::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(p) => {
                    let key = p.stable_addr();
                    if memo.contains_key(&key) {
                        continue;
                    }
                    if self.backend.is_already_normed(&p) {
                        memo.insert(key, Value::Pair(p));
                        continue;
                    }
                    let addr = self.backend_pair_addr(&p);
                    if let Some(hit) = self.cache.get(&Value::Pair(p.clone()), || addr) {
                        memo.insert(key, hit);
                        continue;
                    }
                    stack.push(Frame::Exit(p.clone()));
                    if let Value::Pair(hp) = p.head() {
                        stack.push(Frame::Enter(hp));
                    }
                    if let Value::Pair(tp) = p.tail() {
                        stack.push(Frame::Enter(tp));
                    }
                }
                Frame::Exit(p) => {
                    let key = p.stable_addr();
                    if memo.contains_key(&key) {
                        continue;
                    }
                    let head = p.head();
                    let tail = p.tail();
                    let normed_head = match head {
                        Value::Atom(_) => self.norm_atom_value(head),
                        Value::Pair(hp) => memo
                            .get(&hp.stable_addr())
                            .cloned()
                            .expect("head must be normed before its parent (postorder)"),
                    };
                    let normed_tail = match tail {
                        Value::Atom(_) => self.norm_atom_value(tail),
                        Value::Pair(tp) => memo
                            .get(&tp.stable_addr())
                            .cloned()
                            .expect("tail must be normed before its parent (postorder)"),
                    };
                    let canon = self
                        .backend
                        .canonicalize(normed_head, normed_tail, Some(p.clone()))
                        .unwrap_or_else(|e| self.fatal(e));
                    let orig = Value::Pair(p.clone());
                    let addr_of_orig = self.backend_pair_addr(&p);
                    self.cache.set(orig, Value::Pair(canon.clone()), || addr_of_orig);
                    memo.insert(key, Value::Pair(canon));
                }
            }
        }

        memo.remove(&root.stable_addr())
            .expect("root must be normed by the time the work stack drains")
    }

    /// Best-effort address for the fixed-array cache's slot hash (spec
    /// §4.1). Only meaningful on the addressed back-end; the chained
    /// back-end's cache variant never calls this. The pair being looked
    /// up here may not be canonical yet, so its own raw allocation
    /// address is used as the hash input rather than one minted by the
    /// back-end — good enough for a cache slot index, which is allowed
    /// to be approximate.
    fn backend_pair_addr(&self, p: &Pair) -> u64 {
        match &self.backend {
            Backend::Addressed(_) => p.stable_addr() as u64,
            Backend::Chained(_) => 0,
        }
    }

    fn fatal(&self, e: HonsError) -> ! {
        tracing::error!(error = %e, "{e}");
        panic!("{e}");
    }

    // ---- §6 external interfaces -------------------------------------

    /// `hons(x, y)`: canonical pair construction, normalizing both sides.
    pub fn hons(&mut self, x: Value, y: Value) -> Value {
        let head = self.norm(x);
        let tail = self.norm(y);
        Value::Pair(
            self.backend
                .canonicalize(head, tail, None)
                .unwrap_or_else(|e| self.fatal(e)),
        )
    }

    /// `hons_copy(x)`.
    pub fn hons_copy(&mut self, x: Value) -> Value {
        self.norm(x)
    }

    /// `hons_copy_persistent(x)` (spec §4.6).
    pub fn hons_copy_persistent(&mut self, x: Value) -> Value {
        let x = self.norm(x);
        if x.is_pair() {
            self.persist.insert(x.clone());
        }
        x
    }

    pub fn hons_equal(&self, x: &Value, y: &Value) -> bool {
        deep_equal(x, y)
    }

    pub fn hons_equal_lite(&self, x: &Value, y: &Value) -> bool {
        lite_equal(x, y)
    }

    /// `number_subtrees(x)`: count of distinct (by identity) pairs
    /// reachable from `x`'s canonical form.
    pub fn number_subtrees(&mut self, x: Value) -> usize {
        let x = self.norm(x);
        let mut seen: HashSet<usize> = HashSet::new();
        let mut stack = vec![x];
        while let Some(v) = stack.pop() {
            if let Value::Pair(p) = v {
                if seen.insert(p.stable_addr()) {
                    stack.push(p.head());
                    stack.push(p.tail());
                }
            }
        }
        seen.len()
    }

    // ---- §4.8 fast-alist registry -------------------------------------

    fn report_slow_alist(&self, op: &str) {
        match self.config.slow_alist_action {
            SlowAlistAction::Off => {}
            SlowAlistAction::Warn => {
                tracing::warn!(op, "; Hons Note: slow alist discipline violation in {op}");
            }
            SlowAlistAction::Break => {
                tracing::warn!(op, "; Hons Note: slow alist discipline violation in {op}");
                debug_assert!(false, "slow-alist break: {op}");
            }
        }
    }

    fn capacity_hint(&self, handle: &Value) -> usize {
        match handle {
            Value::Atom(Atom::Int(n)) if *n > 0 => *n as usize,
            _ => self.config.fal_ht_capacity,
        }
        .max(60)
    }

    fn walk_chain(&self, handle: &Value) -> Vec<(Value, Value)> {
        let mut out = Vec::new();
        let mut cur = handle.clone();
        while let Value::Pair(p) = cur {
            let entry = p.head();
            if let Value::Pair(e) = &entry {
                out.push((e.head(), e.tail()));
            }
            cur = p.tail();
        }
        out
    }

    /// `hons_acons`/`hons_acons_bang` (spec §4.8, §6).
    pub fn acons(&mut self, key: Value, value: Value, handle: Value, want_hons: bool) -> Value {
        let k = self.norm(key);
        let (entry, handle_prime) = if want_hons {
            let entry = self.hons(k.clone(), value);
            let handle_prime = self.hons(entry.clone(), handle.clone());
            (entry, handle_prime)
        } else {
            let entry = Value::cons(k.clone(), value);
            let handle_prime = Value::cons(entry.clone(), handle.clone());
            (entry, handle_prime)
        };

        if handle.is_pair() {
            match self.fal.deregister(&handle) {
                Some(mut map) => {
                    map.insert(k, entry);
                    self.fal.register(handle_prime.clone(), map);
                }
                None => self.report_slow_alist("acons"),
            }
        } else {
            let mut map = ShadowMap::with_capacity(self.capacity_hint(&handle));
            map.insert(k, entry);
            self.fal.register(handle_prime.clone(), map);
        }
        handle_prime
    }

    /// `hons_get`.
    pub fn get(&mut self, key: Value, handle: &Value) -> Option<Value> {
        let k = self.norm(key);
        if let Some(map) = self.fal.get(handle) {
            return map.get(&k);
        }
        if !handle.is_pair() {
            return None;
        }
        self.report_slow_alist("get");
        self.walk_chain(handle)
            .into_iter()
            .find(|(ek, _)| deep_equal(ek, &k))
            .map(|(ek, ev)| Value::cons(ek, ev))
    }

    /// `fast_alist_free`.
    pub fn free(&mut self, handle: &Value) -> Value {
        self.fal.free(handle);
        handle.clone()
    }

    /// `fast_alist_len`.
    pub fn len(&mut self, handle: &Value) -> usize {
        if let Some(map) = self.fal.get(handle) {
            return map.len();
        }
        if !handle.is_pair() {
            return 0;
        }
        let shrunk = self.shrink(handle.clone(), Value::nil(), false);
        let count = self.fal.get(&shrunk).map(|m| m.len()).unwrap_or(0);
        self.free(&shrunk);
        count
    }

    /// `hons_shrink_alist`/`hons_shrink_alist_bang` (spec §4.8). Builds a
    /// deduplicated alist (first occurrence in `source`, front to back)
    /// appended onto `accumulator`.
    ///
    /// The spec distinguishes a "fast walk" (source already has a shadow
    /// map, so its keys are trusted pre-normed) from a "slow walk" (norm
    /// every key as it's read). This implementation always re-norms —
    /// `norm` is already idempotent and cache-backed, so the distinction
    /// is a performance path only, not an observable one, and collapsing
    /// it keeps this method's correctness independent of which table
    /// happened to have a shadow map (see DESIGN.md).
    pub fn shrink(&mut self, source: Value, accumulator: Value, want_hons: bool) -> Value {
        let mut seen: HashSet<NormKey> = HashSet::new();
        for (k, _) in self.walk_chain(&accumulator) {
            seen.insert(NormKey(self.norm(k)));
        }

        let mut result = accumulator;
        for (k, v) in self.walk_chain(&source) {
            let k = self.norm(k);
            if seen.insert(NormKey(k.clone())) {
                result = self.acons(k, v, result, want_hons);
            }
        }
        result
    }

    // ---- §4.9 clear -------------------------------------

    /// Recursively re-allocate `v`'s pair cells into the (now-empty)
    /// back-end, trusting that every atom reachable from `v` still holds
    /// its prior identity (spec §4.9 step 3). `seen` avoids re-work on
    /// shared substructure.
    fn restore(&mut self, v: Value, seen: &mut HashMap<usize, Value>) -> Value {
        let p = match &v {
            Value::Atom(_) => return v,
            Value::Pair(p) => p.clone(),
        };
        if let Some(done) = seen.get(&p.stable_addr()) {
            return done.clone();
        }
        let head = self.restore(p.head(), seen);
        let tail = self.restore(p.tail(), seen);
        let canon = Value::Pair(
            self.backend
                .canonicalize(head, tail, None)
                .unwrap_or_else(|e| self.fatal(e)),
        );
        seen.insert(p.stable_addr(), canon.clone());
        canon
    }

    /// `hons_clear(do_gc)` (spec §4.9). `do_gc` is accepted for interface
    /// fidelity; this back-end's `clear` never depends on the host GC
    /// (only `wash` does), so it is otherwise unused here.
    pub fn clear(&mut self, _do_gc: bool) {
        tracing::debug!("hons_clear: discarding all canonicalizations");
        self.cache.clear();

        let old_fal = self.fal.take();
        let old_persist = self.persist.take();
        self.backend.reset();

        let mut seen: HashMap<usize, Value> = HashMap::new();
        for root in old_persist.iter() {
            let restored = self.restore(root.clone(), &mut seen);
            if restored.is_pair() {
                self.persist.insert(restored);
            }
        }

        for handle in old_fal.handles() {
            let restored_handle = self.restore(handle.clone(), &mut seen);
            if let Some(map) = old_fal.get(handle) {
                let mut new_map = ShadowMap::with_capacity(map.len().max(self.config.fal_ht_capacity));
                for key in map.keys() {
                    let restored_key = self.restore(key.clone(), &mut seen);
                    if let Some(entry) = map.get(key) {
                        let restored_entry = self.restore(entry, &mut seen);
                        new_map.insert(restored_key, restored_entry);
                    }
                }
                self.fal.register(restored_handle, new_map);
            }
        }
    }

    // ---- §4.10 wash -------------------------------------

    /// `hons_wash()` (spec §4.10). A no-op (with a diagnostic) on the
    /// chained back-end, which has no host GC to cooperate with.
    pub fn wash(&mut self) {
        self.cache.clear();
        let fal = self.fal.take();
        let persist = self.persist.take();
        let performed = self.backend.wash();
        self.fal = fal;
        self.persist = persist;
        if performed {
            tracing::info!("; Hons Note: wash complete");
        }
    }

    // ---- §6 resize / stats -------------------------------------

    /// `hons_resize(...)`. Table growth in this crate is otherwise
    /// handled lazily by the underlying `HashMap`s and `sbits`'s own
    /// geometric growth (spec §4.7); this records the hint for future
    /// `clear`-triggered rebuilds and reserves headroom where that is
    /// cheap to do immediately.
    pub fn resize(&mut self, hints: ResizeHints) {
        if let Some(cap) = hints.norm_cache_capacity {
            self.config.norm_cache_capacity = cap;
        }
        if let Some(cap) = hints.fal_ht_capacity {
            self.config.fal_ht_capacity = cap;
        }
        if let Some(cap) = hints.nil_ht_capacity {
            self.config.nil_ht_capacity = cap;
        }
        if let Some(cap) = hints.cdr_ht_capacity {
            self.config.cdr_ht_capacity = cap;
        }
        if let Some(cap) = hints.cdr_ht_eql_capacity {
            self.config.cdr_ht_eql_capacity = cap;
        }
        if let Some(cap) = hints.addr_ht_capacity {
            self.config.addr_ht_capacity = cap;
        }
        if let Some(bits) = hints.sbits_capacity_bits {
            self.config.sbits_capacity_bits = bits;
        }
        tracing::info!("; Hons Note: resize hints recorded for next clear");
    }

    pub fn backend_stats(&self) -> BackendStats {
        self.backend.stats()
    }

    pub fn persist_len(&self) -> usize {
        self.persist.len()
    }

    pub fn fal_len(&self) -> usize {
        self.fal.len()
    }
}

impl Default for HonsSpace {
    fn default() -> Self {
        HonsSpace::new(HonsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Atom(Atom::Int(n))
    }

    fn space(kind: BackendKind) -> HonsSpace {
        HonsSpace::new(HonsConfig {
            backend: kind,
            ..HonsConfig::default()
        })
    }

    #[test]
    fn s1_identity_after_norm_chained() {
        let mut hs = space(BackendKind::Chained);
        let x = Value::cons(int(1), Value::cons(int(2), int(3)));
        let y = Value::cons(int(1), Value::cons(int(2), int(3)));
        let nx = hs.norm(x);
        let ny = hs.norm(y);
        assert!(nx.ptr_eq(&ny));
    }

    #[test]
    fn s1_identity_after_norm_addressed() {
        let mut hs = space(BackendKind::Addressed);
        let x = Value::cons(int(1), Value::cons(int(2), int(3)));
        let y = Value::cons(int(1), Value::cons(int(2), int(3)));
        let nx = hs.norm(x);
        let ny = hs.norm(y);
        assert!(nx.ptr_eq(&ny));
    }

    #[test]
    fn s2_sharing_via_hons() {
        let mut hs = space(BackendKind::Chained);
        let a = hs.norm(Value::cons(int(1), int(2)));
        let b = hs.hons(int(1), int(2));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn s3_fast_alist_basic() {
        let mut hs = space(BackendKind::Chained);
        let h0 = Value::Atom(Atom::Int(100));
        let h1 = hs.acons(Value::Atom(Atom::Str("a".into())), int(1), h0, true);
        let h2 = hs.acons(Value::Atom(Atom::Str("b".into())), int(2), h1, true);
        assert_eq!(
            hs.get(Value::Atom(Atom::Str("a".into())), &h2).unwrap().as_pair().unwrap().tail(),
            int(1)
        );
        assert_eq!(
            hs.get(Value::Atom(Atom::Str("b".into())), &h2).unwrap().as_pair().unwrap().tail(),
            int(2)
        );
        assert!(hs.get(Value::Atom(Atom::Str("c".into())), &h2).is_none());
        assert_eq!(hs.len(&h2), 2);
    }

    #[test]
    fn s4_shadowing_first_entry_wins() {
        let mut hs = space(BackendKind::Chained);
        let empty = Value::nil();
        let h = hs.acons(Value::Atom(Atom::Str("a".into())), int(2), empty, true);
        let h = hs.acons(Value::Atom(Atom::Str("a".into())), int(1), h, true);
        let got = hs.get(Value::Atom(Atom::Str("a".into())), &h).unwrap();
        assert_eq!(got.as_pair().unwrap().tail(), int(1));
    }

    #[test]
    fn s5_persistence_through_clear() {
        let mut hs = space(BackendKind::Chained);
        let keep = hs.hons_copy_persistent(Value::Atom(Atom::Str("keep".into())));
        let dropped = hs.norm(Value::Atom(Atom::Str("drop".into())));
        let keep_pair = hs.hons(keep.clone(), Value::nil());
        let keep_pair = hs.hons_copy_persistent(keep_pair);
        let dropped_pair_before = hs.norm(Value::cons(dropped.clone(), Value::nil()));

        hs.clear(false);

        let keep_after = hs.norm(Value::Atom(Atom::Str("keep".into())));
        assert!(keep.ptr_eq(&keep_after));
        let keep_pair_after = hs.norm(Value::cons(keep, Value::nil()));
        assert!(keep_pair.ptr_eq(&keep_pair_after));

        let dropped_pair_after = hs.norm(Value::cons(dropped, Value::nil()));
        assert!(!dropped_pair_before.ptr_eq(&dropped_pair_after));
        // The *string* "drop" still unifies (str_ht survives a pair-only
        // clear, spec §4.9 only discards canonical *pairs*), but any pair
        // built on top of it before the clear is gone.
    }

    #[test]
    fn acons_deregisters_old_handle_and_registers_new_one() {
        let mut hs = space(BackendKind::Chained);
        let empty = Value::nil();
        let h1 = hs.acons(int(1), int(10), empty, true);
        assert!(hs.fal.is_registered(&h1));
        let h2 = hs.acons(int(2), int(20), h1.clone(), true);
        assert!(!hs.fal.is_registered(&h1));
        assert!(hs.fal.is_registered(&h2));
        assert_eq!(
            hs.get(int(1), &h2).unwrap().as_pair().unwrap().tail(),
            int(10)
        );
    }

    #[test]
    fn number_subtrees_counts_distinct_pairs() {
        let mut hs = space(BackendKind::Chained);
        let shared = hs.hons(int(1), int(2));
        let tree = Value::cons(shared.clone(), shared);
        assert_eq!(hs.number_subtrees(tree), 2);
    }

    #[test]
    fn wash_is_a_no_op_on_chained_backend() {
        let mut hs = space(BackendKind::Chained);
        let x = hs.norm(Value::cons(int(1), int(2)));
        hs.wash();
        let y = hs.norm(Value::cons(int(1), int(2)));
        assert!(x.ptr_eq(&y));
    }

    #[test]
    fn shrink_deduplicates_keeping_frontmost_occurrence() {
        let mut hs = space(BackendKind::Chained);
        let empty = Value::nil();
        // Chain front-to-back after these three aconses is (1.999), (2.200),
        // (1.100): the frontmost binding for key 1 is the most recent
        // acons, 999, same entry `get` would already return on `a` itself.
        let a = hs.acons(int(1), int(100), empty, true);
        let a = hs.acons(int(2), int(200), a, true);
        let a = hs.acons(int(1), int(999), a, true);
        let shrunk = hs.shrink(a, Value::nil(), true);
        assert_eq!(hs.len(&shrunk), 2);
        assert_eq!(
            hs.get(int(1), &shrunk).unwrap().as_pair().unwrap().tail(),
            int(999)
        );
    }
}
