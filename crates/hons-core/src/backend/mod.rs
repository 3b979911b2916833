//! The two canonical-pair back-ends (spec §3.3, §4.4). Which one a
//! `HonsSpace` uses is a startup-time choice (spec §9: "Choice of
//! back-end is a compile-time or startup-time configuration variant") —
//! this crate picks startup-time, since a single process may reasonably
//! want both (an addressed space for the main program, a chained one in
//! a test that never wires up a `StableHost`).

pub mod addressed;
pub mod chained;

use crate::error::HonsError;
use crate::value::{Pair, Value};
use addressed::AddressedBackend;
use chained::ChainedBackend;

/// Diagnostic snapshot of a back-end's table occupancy (spec §7
/// `hons_summary`).
#[derive(Debug, Clone, Default)]
pub struct BackendStats {
    pub canonical_pairs: usize,
    pub nil_entries: usize,
    pub cdr_buckets: usize,
    pub cdr_eql_buckets: usize,
    pub addr_entries: usize,
    pub sbits_capacity: usize,
    pub sbits_live: usize,
    pub str_entries: usize,
    pub other_entries: usize,
}

pub enum Backend {
    Chained(ChainedBackend),
    Addressed(AddressedBackend),
}

impl Backend {
    /// Return the existing canonical pair for `(head, tail)`, if any.
    ///
    /// Takes `&mut self` because the addressed back-end may need to mint a
    /// fresh address for an atom it has never seen before just to *look*
    /// (minting an address is not itself a mutation of anything normed —
    /// see `addressed::AddressedBackend::addr_of`).
    pub fn find_canonical(&mut self, head: &Value, tail: &Value) -> Option<Pair> {
        match self {
            Backend::Chained(b) => b.find_canonical(head, tail),
            Backend::Addressed(b) => b.find_canonical(head, tail),
        }
    }

    /// Canonicalize `(head, tail)`, adopting `hint` when it is eligible
    /// (spec §4.3's "hint optimization"): `hint` must literally have
    /// `head`/`tail` as its own head/tail identities.
    pub fn canonicalize(
        &mut self,
        head: Value,
        tail: Value,
        hint: Option<Pair>,
    ) -> Result<Pair, HonsError> {
        let hint = hint.filter(|h| h.head().ptr_eq(&head) && h.tail().ptr_eq(&tail));
        match self {
            Backend::Chained(b) => b.canonicalize(head, tail, hint),
            Backend::Addressed(b) => b.canonicalize(head, tail, hint),
        }
    }

    pub fn is_already_normed(&mut self, p: &Pair) -> bool {
        self.find_canonical(&p.head(), &p.tail())
            .is_some_and(|c| c.ptr_eq(p))
    }

    /// Fresh, empty tables of the same kind (spec §4.9 clear / §4.10 wash).
    pub fn reset(&mut self) {
        match self {
            Backend::Chained(b) => *b = ChainedBackend::new(),
            Backend::Addressed(b) => b.reset_tables(),
        }
    }

    pub fn supports_wash(&self) -> bool {
        matches!(self, Backend::Addressed(_))
    }

    /// Addressed-only: spec §4.10's wash algorithm, steps 2b-4 (the
    /// back-end-table-local part; the fast-alist registry/persistence set
    /// swap lives one level up in `HonsSpace::wash`). No-ops and returns
    /// `false` on the chained back-end (spec: "must no-op with a note").
    pub fn wash(&mut self) -> bool {
        match self {
            Backend::Chained(_) => {
                tracing::info!("; Hons Note: wash() is a no-op on the chained back-end");
                false
            }
            Backend::Addressed(b) => {
                b.wash();
                true
            }
        }
    }

    pub fn stats(&self) -> BackendStats {
        match self {
            Backend::Chained(b) => b.stats(),
            Backend::Addressed(b) => b.stats(),
        }
    }
}
