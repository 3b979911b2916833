//! Property-style checks of the core canonicalization invariants (spec
//! §3.2 C1/C2, §3.4 F1-F4), exercised across both back-ends.

use hons_core::{Atom, BackendKind, HonsConfig, HonsSpace, Value};

fn space(kind: BackendKind) -> HonsSpace {
    HonsSpace::new(HonsConfig {
        backend: kind,
        ..HonsConfig::default()
    })
}

fn int(n: i64) -> Value {
    Value::Atom(Atom::Int(n))
}

/// Builds a `depth`-long proper list bottom-up (iteratively, not
/// recursively) so the *construction* of a deep test fixture can't itself
/// exhaust the stack before `norm` ever gets a chance to.
fn sample_tree(depth: usize) -> Value {
    let mut v = int(0);
    for i in 1..=depth {
        v = Value::cons(int(i as i64), v);
    }
    v
}

fn both_backends(check: impl Fn(&mut HonsSpace)) {
    for kind in [BackendKind::Chained, BackendKind::Addressed] {
        let mut hs = space(kind);
        check(&mut hs);
    }
}

#[test]
fn c1_norm_is_idempotent() {
    both_backends(|hs| {
        let x = sample_tree(12);
        let once = hs.norm(x.clone());
        let twice = hs.norm(once.clone());
        assert!(once.ptr_eq(&twice));
    });
}

#[test]
fn c2_equal_inputs_normalize_to_the_same_identity() {
    both_backends(|hs| {
        let a = hs.norm(sample_tree(20));
        let b = hs.norm(sample_tree(20));
        assert!(a.ptr_eq(&b));
        assert!(hs.hons_equal(&a, &b));
        assert!(hs.hons_equal_lite(&a, &b));
    });
}

#[test]
fn distinct_values_never_collide() {
    both_backends(|hs| {
        let a = hs.norm(sample_tree(5));
        let b = hs.norm(Value::cons(int(999), sample_tree(4)));
        assert!(!a.ptr_eq(&b));
        assert!(!hs.hons_equal(&a, &b));
    });
}

#[test]
fn deeply_nested_lists_norm_without_overflowing_the_stack() {
    both_backends(|hs| {
        let deep = sample_tree(50_000);
        let normed = hs.norm(deep);
        assert_eq!(hs.number_subtrees(normed), 50_000);
    });
}

#[test]
fn shared_substructure_is_counted_once() {
    both_backends(|hs| {
        let shared = hs.hons(int(1), int(2));
        let tree = Value::cons(shared.clone(), Value::cons(shared.clone(), shared));
        assert_eq!(hs.number_subtrees(tree), 3);
    });
}

#[test]
fn f1_through_f4_fast_alist_round_trip() {
    both_backends(|hs| {
        let mut handle = Value::nil();
        for i in 0..20 {
            handle = hs.acons(int(i), int(i * 10), handle, true);
        }
        for i in 0..20 {
            let got = hs.get(int(i), &handle).unwrap();
            assert_eq!(got.as_pair().unwrap().tail(), int(i * 10));
        }
        assert_eq!(hs.len(&handle), 20);

        // F4: re-acons-ing an existing key shadows without growing len.
        handle = hs.acons(int(5), int(-1), handle, true);
        assert_eq!(hs.len(&handle), 20);
        assert_eq!(
            hs.get(int(5), &handle).unwrap().as_pair().unwrap().tail(),
            int(-1)
        );
    });
}

#[test]
fn clear_preserves_only_persistent_roots() {
    both_backends(|hs| {
        let persisted = hs.hons_copy_persistent(sample_tree(6));
        let transient = hs.norm(sample_tree(7));

        hs.clear(false);

        let persisted_again = hs.norm(sample_tree(6));
        assert!(persisted.ptr_eq(&persisted_again));

        let transient_again = hs.norm(sample_tree(7));
        assert!(!transient.ptr_eq(&transient_again));
    });
}

#[test]
fn clear_preserves_registered_fast_alists() {
    both_backends(|hs| {
        let mut handle = Value::nil();
        for i in 0..5 {
            handle = hs.acons(int(i), int(i), handle, true);
        }
        assert_eq!(hs.len(&handle), 5);
        hs.clear(false);
        assert_eq!(hs.len(&handle), 5);
        assert_eq!(
            hs.get(int(3), &handle).unwrap().as_pair().unwrap().tail(),
            int(3)
        );
    });
}

#[test]
fn wash_only_reports_success_on_addressed_backend() {
    let mut chained = space(BackendKind::Chained);
    chained.norm(sample_tree(4));
    chained.wash(); // must not panic; a documented no-op

    let mut addressed = space(BackendKind::Addressed);
    let x = addressed.norm(sample_tree(4));
    addressed.wash();
    let y = addressed.norm(sample_tree(4));
    assert!(x.ptr_eq(&y));
}
