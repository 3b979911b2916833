//! The stable-pair host the addressed back-end depends on (spec §3.3,
//! §9 "Ownership of canonical pairs").
//!
//! The spec treats this as an external collaborator: "the surrounding
//! language runtime that supplies ... garbage collection, and static
//! (non-moving) allocation primitives" is explicitly out of scope (§1).
//! For this crate to compile and be testable standing alone, `StableHost`
//! gives that collaborator a concrete trait boundary, and `RcHost` is the
//! reference implementation: Rust's allocator never relocates a live heap
//! object, so "a pair whose physical address is stable across GC" is
//! free — the pair's own `Rc` allocation already has one. "The host's GC
//! reclaiming an unreferenced pair" becomes "the `Rc` strong count
//! dropping to zero once nothing (not even the engine) still points at
//! it," which is exactly what `Weak::upgrade` returning `None` detects.
//! See DESIGN.md for why this substitution is recorded as an explicit
//! Open Question resolution rather than silently assumed.

use crate::value::{Pair, Value};

pub type StableIndex = usize;

/// A host capable of allocating pairs at stable indices and cooperating
/// with a later collection pass.
pub trait StableHost {
    /// Allocate a fresh stable pair for `(head, tail)`, or adopt `hint`
    /// (the caller has already verified `hint`'s head/tail identities
    /// match) instead of allocating. Returns the pair and its index.
    fn alloc(&mut self, head: Value, tail: Value, hint: Option<Pair>) -> (Pair, StableIndex);

    /// Look up the pair at `index`. `None` means the host has reclaimed
    /// it (it is no longer reachable from anywhere the host tracks).
    fn pair_by_index(&self, index: StableIndex) -> Option<Pair>;

    /// Cooperate with a collection pass: the caller has already dropped
    /// every reference it intends to drop; this call should block until
    /// any stale entries have actually been freed.
    fn collect(&mut self);

    /// Number of indices ever handed out (including reclaimed ones).
    fn index_count(&self) -> usize;
}

/// Reference `StableHost`: stable pairs are plain `Rc<PairCell>` cells,
/// and indices are dense and monotonically assigned. Reclaiming a slot
/// costs nothing extra to detect (`Weak::upgrade` fails); it does leave a
/// dead entry in `slots`, which is the same bounded bookkeeping overhead
/// a real moving host would pay for its own free-list.
pub struct RcHost {
    slots: Vec<std::rc::Weak<crate::value::PairCell>>,
}

impl RcHost {
    pub fn new() -> RcHost {
        RcHost { slots: Vec::new() }
    }
}

impl Default for RcHost {
    fn default() -> Self {
        Self::new()
    }
}

impl StableHost for RcHost {
    fn alloc(&mut self, head: Value, tail: Value, hint: Option<Pair>) -> (Pair, StableIndex) {
        let pair = hint.unwrap_or_else(|| Pair::new(head, tail));
        let index = self.slots.len();
        self.slots.push(pair.downgrade());
        (pair, index)
    }

    fn pair_by_index(&self, index: StableIndex) -> Option<Pair> {
        self.slots
            .get(index)
            .and_then(|w| w.upgrade())
            .map(Pair::from_rc)
    }

    fn collect(&mut self) {
        // Reclaim already happened the moment the caller dropped its
        // strong references; there is no separate pass to wait for.
        tracing::debug!(indices = self.slots.len(), "host collection pass (no-op: Rc already reclaimed)");
    }

    fn index_count(&self) -> usize {
        self.slots.len()
    }
}
