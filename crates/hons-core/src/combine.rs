//! The address-combination function for the addressed back-end (spec §4.2).
//!
//! `combine(a, b)` must be injective over all pairs of non-negative
//! addresses: it is the ground truth the singleton invariant rests on
//! for `addr_ht`. Two disjoint ranges are used, tagged by sign, so the
//! "small" fast path never collides with the Cantor-pairing fallback.

/// Addresses below this threshold (on both sides) take the cheap,
/// bit-packed path; everything else falls back to Cantor pairing.
const SMALL_BOUND: u64 = 1 << 30;

/// Chosen so the large-range output (which starts at 0 for `(SMALL_BOUND,
/// SMALL_BOUND)`) never lands on a value produced by the small-range path
/// (which only ever produces values `<= 0`). See `combine`'s doc test for
/// the boundary check.
const LARGE_OFFSET: i128 = 576_460_752_840_294_399;

/// Cantor pairing function: bijective over `ℕ × ℕ -> ℕ`.
fn cantor_pair(a: u64, b: u64) -> i128 {
    let (a, b) = (a as i128, b as i128);
    ((a + b) * (a + b + 1)) / 2 + b
}

/// Combine two addresses into the injective key used by `addr_ht`.
///
/// Implements spec §4.2's recipe exactly:
/// - both `< 2^30`: `-((a << 30) | b)` (negative, tagging the small case)
/// - otherwise: `cantor_pair(a, b) - LARGE_OFFSET` (non-negative once
///   `a` or `b` has escaped the small range, by construction below)
pub fn combine(a: u64, b: u64) -> i128 {
    if a < SMALL_BOUND && b < SMALL_BOUND {
        -(((a as i128) << 30) | (b as i128))
    } else {
        cantor_pair(a, b) - LARGE_OFFSET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_matches_spec_s6() {
        assert_eq!(combine(0, 0), 0);
        assert_eq!(combine(1, 0), -1_073_741_824);
        assert_eq!(
            combine(1 << 30, 0),
            cantor_pair(1 << 30, 0) - LARGE_OFFSET
        );
    }

    #[test]
    fn small_range_never_collides_with_large_range() {
        // Small-range outputs are always <= 0; spot-check that the
        // large-range path, right at its boundary, is >= 0 (so the two
        // ranges meet only at the single shared value, if any, and that
        // value cannot be produced twice because the small/large
        // conditions are mutually exclusive on (a, b)).
        let boundary = combine(SMALL_BOUND, 0);
        assert!(boundary >= 0);
    }

    #[test]
    fn combine_is_injective_over_a_sample_grid() {
        use std::collections::HashMap;
        let mut seen: HashMap<i128, (u64, u64)> = HashMap::new();
        let sample: Vec<u64> = (0..40)
            .map(|i| i * 7)
            .chain([
                0,
                1,
                (1 << 30) - 1,
                1 << 30,
                (1 << 30) + 1,
                1 << 31,
                u32::MAX as u64,
            ])
            .collect();
        for &a in &sample {
            for &b in &sample {
                let key = combine(a, b);
                if let Some(prev) = seen.insert(key, (a, b)) {
                    panic!(
                        "combine collision: combine({a},{b}) == combine({},{}) == {key}",
                        prev.0, prev.1
                    );
                }
            }
        }
    }

    #[test]
    fn small_case_values_are_distinct_per_pair() {
        assert_ne!(combine(0, 1), combine(1, 0));
        assert_ne!(combine(2, 3), combine(3, 2));
    }
}
