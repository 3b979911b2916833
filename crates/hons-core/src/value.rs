//! The value universe a Hons Space normalizes (spec §3.1).
//!
//! A value is either an atom (symbol, character, string, integer,
//! float, rational, or one of the two distinguished constants `nil`/`true`)
//! or a pair of two values. Pairs are `Rc`-boxed mutable cells so that a
//! caller can build an un-normed pair, hand it to the engine as a "hint"
//! (§4.3), and have the engine adopt the very same allocation as canonical
//! instead of copying it.
//!
//! Symbols are the one atom kind this crate treats as shared across the
//! whole process rather than owned by a single `HonsSpace` (design note,
//! spec §9: "Global symbol address table ... guarded by a single global
//! mutex"). Everything else here is `Rc`, not `Arc`: a `HonsSpace` is not
//! `Send` and was never meant to be (spec §5 — single-owner, no
//! concurrent access to one engine instance).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::{Mutex, OnceLock};

/// A process-wide interned symbol handle.
///
/// Two `Symbol::intern` calls with the same name return pointer-equal
/// handles, which is what lets the atom normalizer treat symbols as
/// "trivially normed" (spec §3.2): the host is assumed to hand out
/// canonical symbol identities already, and this type is this crate's
/// stand-in for that host guarantee.
#[derive(Clone, Debug)]
pub struct Symbol(Arc<str>);

use std::sync::Arc;

static SYMBOL_TABLE: OnceLock<Mutex<HashMap<String, Arc<str>>>> = OnceLock::new();

impl Symbol {
    /// Look up or create the canonical handle for `name`.
    pub fn intern(name: &str) -> Symbol {
        let table = SYMBOL_TABLE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut table = table.lock().expect("symbol table mutex poisoned");
        if let Some(existing) = table.get(name) {
            return Symbol(existing.clone());
        }
        let arc: Arc<str> = Arc::from(name);
        table.insert(name.to_string(), arc.clone());
        Symbol(arc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn ptr_key(&self) -> usize {
        Arc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An exact rational, always stored reduced with a strictly positive
/// denominator. `denom == 0` is a programming defect (the spec's grammar
/// does not admit it), not a recoverable error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    numer: i64,
    denom: i64,
}

impl Rational {
    pub fn new(numer: i64, denom: i64) -> Rational {
        assert!(denom != 0, "Rational::new: zero denominator");
        let sign = if denom < 0 { -1 } else { 1 };
        let (mut n, mut d) = (numer * sign, denom * sign);
        let g = gcd(n.unsigned_abs(), d.unsigned_abs()).max(1);
        n /= g as i64;
        d /= g as i64;
        Rational { numer: n, denom: d }
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}

/// A leaf value. See spec §3.1 for the grammar and §3.3 for the static
/// addresses `Nil` and `True` receive in the addressed back-end.
#[derive(Clone, Debug)]
pub enum Atom {
    /// The empty list / logical false (ACL2-style: nil doubles as both).
    Nil,
    /// The distinguished logical true constant.
    True,
    Char(char),
    Int(i64),
    Float(f64),
    Rational(Rational),
    Sym(Symbol),
    Str(Rc<str>),
}

impl Atom {
    /// Identity equality: whether these two atoms are *the same* atom,
    /// not merely equal in value. For `Str` this is only meaningful once
    /// both have passed through the atom normalizer (§4.5) — two
    /// un-normed strings with the same text are not identity-equal.
    pub fn identity_eq(&self, other: &Atom) -> bool {
        match (self, other) {
            (Atom::Nil, Atom::Nil) => true,
            (Atom::True, Atom::True) => true,
            (Atom::Char(a), Atom::Char(b)) => a == b,
            (Atom::Int(a), Atom::Int(b)) => a == b,
            (Atom::Float(a), Atom::Float(b)) => a.to_bits() == b.to_bits(),
            (Atom::Rational(a), Atom::Rational(b)) => a == b,
            (Atom::Sym(a), Atom::Sym(b)) => a == b,
            (Atom::Str(a), Atom::Str(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Semantic (deep) equality, ignoring identity.
    pub fn semantic_eq(&self, other: &Atom) -> bool {
        match (self, other) {
            (Atom::Nil, Atom::Nil) => true,
            (Atom::True, Atom::True) => true,
            (Atom::Char(a), Atom::Char(b)) => a == b,
            (Atom::Int(a), Atom::Int(b)) => a == b,
            (Atom::Float(a), Atom::Float(b)) => a == b,
            (Atom::Rational(a), Atom::Rational(b)) => a == b,
            (Atom::Sym(a), Atom::Sym(b)) => a.as_str() == b.as_str(),
            (Atom::Str(a), Atom::Str(b)) => a.as_ref() == b.as_ref(),
            _ => false,
        }
    }

    /// True for atoms that are "trivially normed" by construction
    /// (everything except `Str`, which must pass through `str_ht` first).
    pub fn is_trivially_normed(&self) -> bool {
        !matches!(self, Atom::Str(_))
    }

    /// Tail/head routing classification used by the chained back-end
    /// (spec §3.3, §9 "tag variants"): pointer-comparable atoms have a
    /// real heap identity; everything else compares by value.
    pub fn is_pointer_comparable(&self) -> bool {
        matches!(self, Atom::Sym(_) | Atom::Str(_))
    }
}

/// The inner cell of a pair. Exposed as `RefCell` fields because a pair
/// is a mutable heap cell until it is canonicalized (spec §3.1); the
/// engine treats a *normed* pair as immutable by convention, not by type.
pub(crate) struct PairCell {
    pub head: RefCell<Value>,
    pub tail: RefCell<Value>,
}

/// A `(head . tail)` pair. Cheap to clone (`Rc` bump).
#[derive(Clone)]
pub struct Pair(pub(crate) Rc<PairCell>);

impl Pair {
    pub fn new(head: Value, tail: Value) -> Pair {
        Pair(Rc::new(PairCell {
            head: RefCell::new(head),
            tail: RefCell::new(tail),
        }))
    }

    pub fn head(&self) -> Value {
        self.0.head.borrow().clone()
    }

    pub fn tail(&self) -> Value {
        self.0.tail.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Pair) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn set_head(&self, v: Value) {
        *self.0.head.borrow_mut() = v;
    }

    pub(crate) fn set_tail(&self, v: Value) {
        *self.0.tail.borrow_mut() = v;
    }

    /// The allocation's address, used as this pair's stable-address key
    /// in the addressed back-end's host (`crate::host`) — Rust's
    /// allocator never moves a live heap object, so this is already a
    /// "stable address" in the sense spec §3.3 wants.
    pub(crate) fn stable_addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub(crate) fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub(crate) fn downgrade(&self) -> std::rc::Weak<PairCell> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn from_rc(rc: Rc<PairCell>) -> Pair {
        Pair(rc)
    }
}

impl fmt::Debug for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pair(#{:x})", self.stable_addr())
    }
}

/// Either an atom or a pair (spec §3.1).
#[derive(Clone, Debug)]
pub enum Value {
    Atom(Atom),
    Pair(Pair),
}

impl Value {
    pub fn nil() -> Value {
        Value::Atom(Atom::Nil)
    }

    pub fn bool_true() -> Value {
        Value::Atom(Atom::True)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Atom(Atom::Nil))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn as_pair(&self) -> Option<&Pair> {
        match self {
            Value::Pair(p) => Some(p),
            Value::Atom(_) => None,
        }
    }

    pub fn cons(head: Value, tail: Value) -> Value {
        Value::Pair(Pair::new(head, tail))
    }

    /// Identity equality: one-word comparison for normed values (spec §3.2).
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Pair(a), Value::Pair(b)) => a.ptr_eq(b),
            (Value::Atom(a), Value::Atom(b)) => a.identity_eq(b),
            _ => false,
        }
    }
}

/// Deep structural equality over arbitrarily deep value trees, using an
/// explicit work stack rather than recursion (spec §4.3's "must handle
/// deep structures without stack exhaustion" applies equally here).
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    let mut stack = vec![(a.clone(), b.clone())];
    while let Some((x, y)) = stack.pop() {
        match (&x, &y) {
            (Value::Pair(px), Value::Pair(py)) => {
                if px.ptr_eq(py) {
                    continue;
                }
                stack.push((px.head(), py.head()));
                stack.push((px.tail(), py.tail()));
            }
            (Value::Atom(ax), Value::Atom(ay)) => {
                if !ax.semantic_eq(ay) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// `hons_equal_lite` (spec §6): identity first; once both sides are
/// normed pairs a mismatched head/tail identity is conclusive (no need
/// to recurse), otherwise it falls back to `deep_equal`. Cheaper than
/// `deep_equal` whenever both operands actually came out of the same
/// Hons Space.
pub fn lite_equal(a: &Value, b: &Value) -> bool {
    let mut stack = vec![(a.clone(), b.clone())];
    while let Some((x, y)) = stack.pop() {
        if x.ptr_eq(&y) {
            continue;
        }
        match (&x, &y) {
            (Value::Pair(_), Value::Pair(_)) => {
                // Both normed pairs, but not identity-equal: by the
                // singleton invariant (spec §3.4) that alone proves
                // semantic inequality.
                return false;
            }
            (Value::Atom(ax), Value::Atom(ay)) => {
                if !ax.semantic_eq(ay) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// A hashable/comparable wrapper around a *normed* `Value`, used as the
/// key type for the chained back-end's tables and the fast-alist shadow
/// maps. Pointer-comparable values (symbols, strings, pairs) hash/compare
/// by heap identity; everything else hashes/compares by content. For a
/// normed value the two notions coincide, which is exactly the
/// property §3.2 guarantees.
#[derive(Clone, Debug)]
pub struct NormKey(pub Value);

#[derive(PartialEq, Eq, Hash)]
enum KeyRepr {
    Nil,
    True,
    Char(char),
    Int(i64),
    FloatBits(u64),
    Rational(i64, i64),
    SymPtr(usize),
    StrPtr(usize),
    PairPtr(usize),
}

fn key_repr(v: &Value) -> KeyRepr {
    match v {
        Value::Atom(Atom::Nil) => KeyRepr::Nil,
        Value::Atom(Atom::True) => KeyRepr::True,
        Value::Atom(Atom::Char(c)) => KeyRepr::Char(*c),
        Value::Atom(Atom::Int(n)) => KeyRepr::Int(*n),
        Value::Atom(Atom::Float(f)) => KeyRepr::FloatBits(f.to_bits()),
        Value::Atom(Atom::Rational(r)) => KeyRepr::Rational(r.numer(), r.denom()),
        Value::Atom(Atom::Sym(s)) => KeyRepr::SymPtr(s.ptr_key()),
        Value::Atom(Atom::Str(s)) => KeyRepr::StrPtr(Rc::as_ptr(s) as *const u8 as usize),
        Value::Pair(p) => KeyRepr::PairPtr(p.stable_addr()),
    }
}

impl PartialEq for NormKey {
    fn eq(&self, other: &Self) -> bool {
        key_repr(&self.0) == key_repr(&other.0)
    }
}
impl Eq for NormKey {}

impl Hash for NormKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        key_repr(&self.0).hash(state);
    }
}
