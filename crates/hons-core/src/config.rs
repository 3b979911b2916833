//! Per-table capacity hints and the slow-alist diagnostic policy (spec
//! §6 `hons_resize`, §7's `slow_alist_action`).
//!
//! A plain struct with a `Default` impl, not a builder — the same shape
//! the teacher workspace uses for its own static configuration (compiler
//! config structs), rather than introducing a config-file format this
//! embedded-library crate has no use for (spec §6: "No environment
//! variables are consulted").

/// What to do when `get`/`acons`/`shrink` can't find a registered shadow
/// map for a handle that looks like it ought to have one (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowAlistAction {
    Off,
    #[default]
    Warn,
    /// No attached debugger to trap into in a headless process, so
    /// "break" is modeled as a debug-assertion failure — loud in debug
    /// builds, a no-op in release (recorded as an Open Question
    /// resolution in DESIGN.md).
    Break,
}

impl SlowAlistAction {
    /// Encoding for the process-wide `AtomicU8`-backed default the `hons`
    /// façade keeps (spec §7's atomic-flag idiom).
    pub const fn to_u8(self) -> u8 {
        match self {
            SlowAlistAction::Off => 0,
            SlowAlistAction::Warn => 1,
            SlowAlistAction::Break => 2,
        }
    }

    pub const fn from_u8(v: u8) -> SlowAlistAction {
        match v {
            0 => SlowAlistAction::Off,
            2 => SlowAlistAction::Break,
            _ => SlowAlistAction::Warn,
        }
    }
}

/// Which canonical-pair back-end a `HonsSpace` uses (spec §3.3, §9:
/// "compile-time or startup-time configuration variant" — this crate
/// picks startup-time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Chained,
    Addressed,
}

#[derive(Debug, Clone)]
pub struct HonsConfig {
    pub nil_ht_capacity: usize,
    pub cdr_ht_capacity: usize,
    pub cdr_ht_eql_capacity: usize,
    pub addr_ht_capacity: usize,
    pub sbits_capacity_bits: usize,
    pub norm_cache_capacity: usize,
    pub fal_ht_capacity: usize,
    pub slow_alist_action: SlowAlistAction,
    pub backend: BackendKind,
}

impl Default for HonsConfig {
    fn default() -> HonsConfig {
        HonsConfig {
            nil_ht_capacity: 1 << 14,
            cdr_ht_capacity: 1 << 14,
            cdr_ht_eql_capacity: 1 << 10,
            addr_ht_capacity: 1 << 16,
            sbits_capacity_bits: 1 << 16,
            norm_cache_capacity: 400_000,
            fal_ht_capacity: 60,
            slow_alist_action: SlowAlistAction::Warn,
            backend: BackendKind::Chained,
        }
    }
}

/// `hons_resize`'s argument (spec §6): per-table capacity hints, any of
/// which may be omitted to leave that table's current sizing alone.
#[derive(Debug, Clone, Default)]
pub struct ResizeHints {
    pub nil_ht_capacity: Option<usize>,
    pub cdr_ht_capacity: Option<usize>,
    pub cdr_ht_eql_capacity: Option<usize>,
    pub addr_ht_capacity: Option<usize>,
    pub sbits_capacity_bits: Option<usize>,
    pub norm_cache_capacity: Option<usize>,
    pub fal_ht_capacity: Option<usize>,
}
