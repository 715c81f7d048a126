//! Computed/writable atom, dependency-graph, and error-path integration
//! tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nexus_state::{computed_atom, create_store, primitive_atom, writable_atom, NexusError};
use once_cell::sync::OnceCell;

#[test]
fn test_computed_atom_derives_from_primitive() {
    let store = create_store(Vec::new());
    let count = primitive_atom(3);
    let doubled = {
        let count = count.clone();
        computed_atom(move |get| Ok(get.get(&count)? * 2))
    };
    assert_eq!(store.get(&doubled).unwrap(), 6);
    store.set(&count, 10).unwrap();
    assert_eq!(store.get(&doubled).unwrap(), 20);
}

#[test]
fn test_diamond_dependency_recomputes_sink_exactly_once() {
    let store = create_store(Vec::new());
    let base = primitive_atom(1);

    let left = {
        let base = base.clone();
        computed_atom(move |get| Ok(get.get(&base)? + 1))
    };
    let right = {
        let base = base.clone();
        computed_atom(move |get| Ok(get.get(&base)? * 10))
    };

    let recomputations = Arc::new(AtomicUsize::new(0));
    let sink = {
        let (left, right, recomputations) = (left.clone(), right.clone(), recomputations.clone());
        computed_atom(move |get| {
            recomputations.fetch_add(1, Ordering::SeqCst);
            Ok(get.get(&left)? + get.get(&right)?)
        })
    };

    assert_eq!(store.get(&sink).unwrap(), 2 + 10);
    recomputations.store(0, Ordering::SeqCst);

    store.set(&base, 2).unwrap();
    assert_eq!(store.get(&sink).unwrap(), 3 + 20);
    assert_eq!(recomputations.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unaffected_branch_does_not_recompute() {
    let store = create_store(Vec::new());
    let a = primitive_atom(1);
    let b = primitive_atom(100);

    let calls = Arc::new(AtomicUsize::new(0));
    let derived_from_b = {
        let (b, calls) = (b.clone(), calls.clone());
        computed_atom(move |get| {
            calls.fetch_add(1, Ordering::SeqCst);
            get.get(&b)
        })
    };

    assert_eq!(store.get(&derived_from_b).unwrap(), 100);
    calls.store(0, Ordering::SeqCst);

    store.set(&a, 2).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_writable_atom_fans_out_to_two_primitives() {
    let store = create_store(Vec::new());
    let first = primitive_atom("Ada".to_string());
    let last = primitive_atom("Lovelace".to_string());
    let full_name = {
        let (first, last) = (first.clone(), last.clone());
        writable_atom(
            move |get| Ok(format!("{} {}", get.get(&first)?, get.get(&last)?)),
            move |_get, set, value: String| {
                let mut parts = value.splitn(2, ' ');
                let f = parts.next().unwrap_or_default().to_string();
                let l = parts.next().unwrap_or_default().to_string();
                set.set(&first, f)?;
                set.set(&last, l)?;
                Ok(())
            },
        )
    };

    assert_eq!(store.get(&full_name).unwrap(), "Ada Lovelace");
    store.set(&full_name, "Grace Hopper".to_string()).unwrap();
    assert_eq!(store.get(&first).unwrap(), "Grace");
    assert_eq!(store.get(&last).unwrap(), "Hopper");
    assert_eq!(store.get(&full_name).unwrap(), "Grace Hopper");
}

#[test]
fn test_set_on_computed_atom_errors() {
    let store = create_store(Vec::new());
    let count = primitive_atom(1);
    let doubled = {
        let count = count.clone();
        computed_atom(move |get| Ok(get.get(&count)? * 2))
    };
    let err = store.set(&doubled, 4).unwrap_err();
    assert!(matches!(err, NexusError::WriteToComputed { .. }));
}

#[test]
fn test_circular_dependency_is_detected() {
    let store = create_store(Vec::new());

    let cell: Arc<OnceCell<nexus_state::ComputedAtom<i32>>> = Arc::new(OnceCell::new());
    let cell_for_b = cell.clone();
    let b = computed_atom(move |get| {
        let a = cell_for_b.get().expect("`a` is set before `b` is ever read");
        get.get(a)
    });
    let a = {
        let b = b.clone();
        computed_atom(move |get| get.get(&b))
    };
    cell.set(a.clone()).ok();

    let err = store.get(&a).unwrap_err();
    assert!(matches!(err, NexusError::CircularDependency { .. }));
}
