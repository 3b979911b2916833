//! Process-wide default Hons Space and the `hons_*` functional façade
//! (spec §6).
//!
//! `hons-core::HonsSpace` is deliberately bare: no default instance, no
//! global state. Most callers don't want to thread a `&mut HonsSpace`
//! through every call site, so this crate keeps one thread-local space
//! per thread (a `HonsSpace` is not `Send`, spec §5) and exposes it
//! through free functions named after their ACL2-style counterparts.
//!
//! Each OS thread gets its own independent space; nothing here attempts
//! to share canonical pairs across threads.

use hons_core::{
    Atom, BackendKind, HonsConfig, HonsSpace, ResizeHints, SlowAlistAction, Value,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU8, Ordering};

/// Process-wide default for how a freshly-created thread-local space
/// reacts to slow-alist discipline violations (spec §7): the same
/// atomic-flag idiom the teacher workspace uses for signal delivery, not
/// a `Mutex`, since this is a single small enum read on every new thread.
static DEFAULT_SLOW_ALIST_ACTION: AtomicU8 = AtomicU8::new(SlowAlistAction::Warn.to_u8());

fn default_slow_alist_action() -> SlowAlistAction {
    SlowAlistAction::from_u8(DEFAULT_SLOW_ALIST_ACTION.load(Ordering::Relaxed))
}

/// Set the process-wide default applied to every subsequently-created
/// thread-local space (this thread's own space, if already initialized,
/// is unaffected — call [`configure`] on this thread to change it).
pub fn set_default_slow_alist_action(action: SlowAlistAction) {
    DEFAULT_SLOW_ALIST_ACTION.store(action.to_u8(), Ordering::Relaxed);
}

thread_local! {
    static SPACE: RefCell<HonsSpace> = RefCell::new(HonsSpace::new(HonsConfig {
        slow_alist_action: default_slow_alist_action(),
        ..HonsConfig::default()
    }));
}

/// Run `f` against this thread's default space.
fn with_space<R>(f: impl FnOnce(&mut HonsSpace) -> R) -> R {
    SPACE.with(|s| f(&mut s.borrow_mut()))
}

/// Replace this thread's default space with one built from `config`
/// (spec §6: an embedder may want a non-default back-end or capacity
/// plan for the thread-local instance, not just a freshly-built
/// `HonsSpace` of its own).
pub fn configure(config: HonsConfig) {
    SPACE.with(|s| *s.borrow_mut() = HonsSpace::new(config));
}

pub fn hons(x: Value, y: Value) -> Value {
    with_space(|hs| hs.hons(x, y))
}

pub fn hons_copy(x: Value) -> Value {
    with_space(|hs| hs.hons_copy(x))
}

pub fn hons_copy_persistent(x: Value) -> Value {
    with_space(|hs| hs.hons_copy_persistent(x))
}

pub fn hons_equal(x: &Value, y: &Value) -> bool {
    with_space(|hs| hs.hons_equal(x, y))
}

pub fn hons_equal_lite(x: &Value, y: &Value) -> bool {
    with_space(|hs| hs.hons_equal_lite(x, y))
}

pub fn number_subtrees(x: Value) -> usize {
    with_space(|hs| hs.number_subtrees(x))
}

/// `hons-acons`: builds the new entry and handle with `hons` (so the
/// resulting alist cells are themselves canonical).
pub fn hons_acons(key: Value, value: Value, handle: Value) -> Value {
    with_space(|hs| hs.acons(key, value, handle, true))
}

/// `hons-acons!`: same fast-alist bookkeeping, but the new entry/handle
/// cells are plain (non-canonical) conses.
pub fn hons_acons_bang(key: Value, value: Value, handle: Value) -> Value {
    with_space(|hs| hs.acons(key, value, handle, false))
}

pub fn hons_get(key: Value, handle: &Value) -> Option<Value> {
    with_space(|hs| hs.get(key, handle))
}

pub fn hons_shrink_alist(source: Value, accumulator: Value) -> Value {
    with_space(|hs| hs.shrink(source, accumulator, true))
}

pub fn hons_shrink_alist_bang(source: Value, accumulator: Value) -> Value {
    with_space(|hs| hs.shrink(source, accumulator, false))
}

pub fn fast_alist_free(handle: &Value) -> Value {
    with_space(|hs| hs.free(handle))
}

pub fn fast_alist_len(handle: &Value) -> usize {
    with_space(|hs| hs.len(handle))
}

pub fn hons_clear(do_gc: bool) {
    with_space(|hs| hs.clear(do_gc));
}

pub fn hons_wash() {
    with_space(|hs| hs.wash());
}

pub fn hons_resize(hints: ResizeHints) {
    with_space(|hs| hs.resize(hints));
}

/// `hons_summary` (spec §7): a short multi-line diagnostic of this
/// thread's space, in the `"; Hons Note: ..."` style the back-end uses
/// for its own `tracing` events.
pub fn hons_summary() -> String {
    with_space(|hs| {
        let stats = hs.backend_stats();
        match hs.config().backend {
            BackendKind::Chained => format!(
                "; Hons Note: backend=chained canonical-pairs={} nil-entries={} cdr-buckets={} cdr-eql-buckets={} persisted={} fast-alists={}",
                stats.canonical_pairs,
                stats.nil_entries,
                stats.cdr_buckets,
                stats.cdr_eql_buckets,
                hs.persist_len(),
                hs.fal_len(),
            ),
            BackendKind::Addressed => format!(
                "; Hons Note: backend=addressed canonical-pairs={} addr-entries={} sbits-live={}/{} persisted={} fast-alists={}",
                stats.canonical_pairs,
                stats.addr_entries,
                stats.sbits_live,
                stats.sbits_capacity,
                hs.persist_len(),
                hs.fal_len(),
            ),
        }
    })
}

/// `fast_alist_summary` (spec §7): one line per currently-registered fast
/// alist, naming its length.
pub fn fast_alist_summary() -> String {
    with_space(|hs| format!("; Hons Note: {} fast alist(s) registered", hs.fal_len()))
}

/// Convenience: `(key . value)` cons construction that doesn't consult
/// the space at all, for callers building up plain alist chains to feed
/// into [`hons_acons`]/[`hons_shrink_alist`].
pub fn cons(x: Value, y: Value) -> Value {
    Value::cons(x, y)
}

pub fn nil() -> Value {
    Value::nil()
}

pub fn int(n: i64) -> Value {
    Value::Atom(Atom::Int(n))
}

pub fn str_val(s: impl Into<std::rc::Rc<str>>) -> Value {
    Value::Atom(Atom::Str(s.into()))
}
