//! Error types (spec §7).
//!
//! Only one condition in the whole engine is a genuine recoverable-ish
//! `Result` error: `sbits` capacity exhaustion. Slow-alist discipline
//! violations are reported through `diagnostics`, not `Result`, because
//! the spec requires the engine to *continue* with a linear fallback
//! rather than fail the call.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HonsError {
    /// Growing `sbits` to cover a stable index would exceed the host
    /// array limit (spec §4.7, §7: fatal).
    SbitsCapacityExceeded { requested: usize, limit: usize },
}

impl fmt::Display for HonsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HonsError::SbitsCapacityExceeded { requested, limit } => write!(
                f,
                "; Hons Note: cannot grow sbits to cover index {requested} (limit {limit})"
            ),
        }
    }
}

impl std::error::Error for HonsError {}
