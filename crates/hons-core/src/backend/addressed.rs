//! The index-based back-end (spec §3.3 "Addressed back-end", §4.2, §4.4,
//! §4.5, §4.7). Every normed value gets a unique natural-number address;
//! normed pairs are found by the combined address of their head and tail
//! in `addr_ht`, and `sbits` tracks which stable-pair indices currently
//! hold a normed pair.
//!
//! Addresses are partitioned exactly as spec §3.3 lays out:
//!
//! - `0..=255`: character code points.
//! - `256`: nil. `257`: true.
//! - `258..DYNAMIC_BASE`: small integers in `[SMALL_INT_MIN, SMALL_INT_MAX]`.
//! - `DYNAMIC_BASE..`: one address per stable-pair index, handed out either
//!   for a real canonical cons cell or as a throwaway "address mint" for an
//!   atom that has no address of its own (strings, symbols, large
//!   integers, floats, rationals, out-of-range characters).

use crate::critical::no_interrupts;
use crate::error::HonsError;
use crate::host::{RcHost, StableHost, StableIndex};
use crate::sbits::SBits;
use crate::value::{Atom, Pair, Symbol, Value};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use super::BackendStats;

const SMALL_INT_MIN: i64 = -(1 << 14);
const SMALL_INT_MAX: i64 = 1 << 23;
const SMALL_INT_COUNT: u64 = (SMALL_INT_MAX - SMALL_INT_MIN + 1) as u64;

const NIL_ADDR: u64 = 256;
const TRUE_ADDR: u64 = 257;
const SMALL_INT_BASE: u64 = 258;
/// First address handed out to a stable-pair index (spec §3.3).
pub const DYNAMIC_BASE: u64 = SMALL_INT_BASE + SMALL_INT_COUNT;

fn static_addr(atom: &Atom) -> Option<u64> {
    match atom {
        Atom::Nil => Some(NIL_ADDR),
        Atom::True => Some(TRUE_ADDR),
        Atom::Char(c) if (*c as u32) <= 255 => Some(*c as u32 as u64),
        Atom::Int(n) if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(n) => {
            Some(SMALL_INT_BASE + (*n - SMALL_INT_MIN) as u64)
        }
        _ => None,
    }
}

/// Key type for `other_ht`: every non-small, non-string atom that still
/// needs a minted address (large integers, floats, rationals, and
/// characters outside the static `0..=255` range).
#[derive(Clone, PartialEq, Eq, Hash)]
enum OtherKey {
    Int(i64),
    FloatBits(u64),
    Rational(i64, i64),
    Char(char),
}

fn other_key(atom: &Atom) -> Option<OtherKey> {
    match atom {
        Atom::Int(n) => Some(OtherKey::Int(*n)),
        Atom::Float(f) => Some(OtherKey::FloatBits(f.to_bits())),
        Atom::Rational(r) => Some(OtherKey::Rational(r.numer(), r.denom())),
        Atom::Char(c) => Some(OtherKey::Char(*c)),
        _ => None,
    }
}

/// Process-wide symbol address table (spec §4.5: "addresses recorded
/// per-symbol, guarded by a global mutex because symbols are process-wide
/// shared"). Deliberately a separate numbering space from any one
/// `HonsSpace`'s own stable-pair indices: a symbol's address only has to
/// be stable and unique *within* the `addr_ht` it gets looked up in, and
/// sharing the counter across every `HonsSpace` in the process is simpler
/// than threading a symbol through each space's own `StableHost` (see
/// DESIGN.md).
fn symbol_addr(sym: &Symbol) -> u64 {
    static TABLE: OnceLock<Mutex<HashMap<usize, u64>>> = OnceLock::new();
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let table = TABLE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut table = table.lock().expect("symbol address table mutex poisoned");
    *table
        .entry(sym.ptr_key())
        .or_insert_with(|| DYNAMIC_BASE + NEXT.fetch_add(1, Ordering::Relaxed))
}

pub struct AddressedBackend {
    host: RcHost,
    addr_ht: HashMap<i128, Pair>,
    /// Stable index of every canonical pair currently in `addr_ht`, keyed
    /// by the pair's allocation identity, so `addr_of` can recover a
    /// pair's address without a reverse scan.
    pair_index: HashMap<usize, StableIndex>,
    sbits: SBits,
    /// Keyed by the already-canonical string's allocation identity, not
    /// its content: by the time a string reaches this back-end it has
    /// already been through `HonsSpace`'s own `str_ht` (spec §4.5), which
    /// is what unifies equal-content strings into one `Rc<str>` in the
    /// first place. This table only needs to remember "have I minted an
    /// address for *this* `Rc` before."
    str_ht: HashMap<usize, u64>,
    other_ht: HashMap<OtherKey, u64>,
}

impl AddressedBackend {
    pub fn new() -> AddressedBackend {
        Self::with_capacity(1 << 16, 1 << 16)
    }

    pub fn with_capacity(addr_cap: usize, sbits_bits: usize) -> AddressedBackend {
        AddressedBackend {
            host: RcHost::new(),
            addr_ht: HashMap::with_capacity(addr_cap),
            pair_index: HashMap::with_capacity(addr_cap),
            sbits: SBits::new(sbits_bits),
            str_ht: HashMap::new(),
            other_ht: HashMap::new(),
        }
    }

    /// Mint a fresh stable-pair index solely to give `value` an address
    /// (spec §4.5: "paired with a dedicated stable-pair whose index
    /// provides x's address"). The minted pair never becomes canonical —
    /// its `sbits` bit is never set — so it costs one index, not one
    /// canonical-pair slot.
    fn mint_address(&mut self) -> u64 {
        let (_pair, index) = self.host.alloc(Value::nil(), Value::nil(), None);
        DYNAMIC_BASE + index as u64
    }

    fn pair_addr(&self, p: &Pair) -> Option<u64> {
        self.pair_index.get(&p.stable_addr()).map(|&i| DYNAMIC_BASE + i as u64)
    }

    /// Address of an already-canonical value. Atoms always succeed (they
    /// are "trivially normed" and mint their own address on first
    /// reference, spec §3.2); a pair only succeeds once it has actually
    /// been registered as canonical, which is always true by the time
    /// `canonicalize` calls this on a normed head/tail.
    fn addr_of(&mut self, v: &Value) -> Option<u64> {
        match v {
            Value::Pair(p) => self.pair_addr(p),
            Value::Atom(a) => Some(self.atom_addr(a)),
        }
    }

    fn atom_addr(&mut self, atom: &Atom) -> u64 {
        if let Some(addr) = static_addr(atom) {
            return addr;
        }
        match atom {
            Atom::Sym(s) => symbol_addr(s),
            Atom::Str(s) => {
                let ptr = Rc::as_ptr(s) as *const u8 as usize;
                if let Some(&addr) = self.str_ht.get(&ptr) {
                    return addr;
                }
                let addr = self.mint_address();
                self.str_ht.insert(ptr, addr);
                addr
            }
            other => {
                let key = other_key(other).expect("atom_addr: unhandled atom kind");
                if let Some(&addr) = self.other_ht.get(&key) {
                    return addr;
                }
                let addr = self.mint_address();
                self.other_ht.insert(key, addr);
                addr
            }
        }
    }

    pub fn find_canonical(&mut self, head: &Value, tail: &Value) -> Option<Pair> {
        let ha = self.addr_of(head)?;
        let ta = self.addr_of(tail)?;
        self.addr_ht.get(&crate::combine::combine(ha, ta)).cloned()
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
        let ha = self.addr_of(&head).expect("head address must exist once normed");
        let ta = self.addr_of(&tail).expect("tail address must exist once normed");
        let (pair, index) = self.host.alloc(head, tail, hint);
        self.sbits.ensure_capacity(index)?;
        let key = crate::combine::combine(ha, ta);
        no_interrupts(|| {
            self.sbits.set(index);
            self.pair_index.insert(pair.stable_addr(), index);
            self.addr_ht.insert(key, pair.clone());
        });
        Ok(pair)
    }

    pub fn reset_tables(&mut self) {
        self.addr_ht = HashMap::new();
        self.sbits.clear_all();
        self.pair_index.clear();
        // str_ht/other_ht/host survive: they're atom<->address mappings,
        // not canonical-pair membership, and clear/wash only discard
        // canonical *pairs* (spec §4.9, §4.10). Re-norming an atom after
        // a clear must still get back the identity it had before.
    }

    /// spec §4.10 steps 2b-4, the back-end-table-local part of wash.
    pub fn wash(&mut self) {
        let old_sbits = std::mem::replace(&mut self.sbits, SBits::new(1 << 16));
        self.pair_index.clear();
        self.addr_ht.clear();
        self.host.collect();

        for index in 0..old_sbits.capacity_bits() {
            if !old_sbits.get(index) {
                continue;
            }
            match self.host.pair_by_index(index) {
                None => {
                    tracing::debug!(index, "wash: stable pair reclaimed by host GC");
                }
                Some(pair) => {
                    let head = pair.head();
                    let tail = pair.tail();
                    let ha = self.addr_of(&head).expect("surviving pair's head must have an address");
                    let ta = self.addr_of(&tail).expect("surviving pair's tail must have an address");
                    let key = crate::combine::combine(ha, ta);
                    self.sbits.ensure_capacity(index).expect("wash: sbits re-grow to a previously-valid index cannot fail");
                    no_interrupts(|| {
                        self.sbits.set(index);
                        self.pair_index.insert(pair.stable_addr(), index);
                        self.addr_ht.insert(key, pair);
                    });
                }
            }
        }
    }

    pub fn stats(&self) -> BackendStats {
        BackendStats {
            canonical_pairs: self.addr_ht.len(),
            addr_entries: self.addr_ht.len(),
            sbits_capacity: self.sbits.capacity_bits(),
            sbits_live: self.sbits.count_ones(),
            str_entries: self.str_ht.len(),
            other_entries: self.other_ht.len(),
            ..Default::default()
        }
    }
}

impl Default for AddressedBackend {
    fn default() -> Self {
        Self::new()
    }
}
