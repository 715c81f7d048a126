//! Primitive atom and store integration tests.

use nexus_state::{create_store, primitive_atom, SetStateAction};

#[test]
fn test_create_primitive_atom_has_unique_id() {
    let a = primitive_atom(0);
    let b = primitive_atom(0);
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_atom_with_label_shows_up_in_display() {
    let count = primitive_atom(0).with_label("counter");
    assert_eq!(count.debug_label(), Some("counter"));
    assert!(count.to_string().contains("counter"));
}

#[test]
fn test_get_returns_initial_value() {
    let store = create_store(Vec::new());
    let count = primitive_atom(42);
    assert_eq!(store.get(&count).unwrap(), 42);
}

#[test]
fn test_set_then_get_reflects_new_value() {
    let store = create_store(Vec::new());
    let count = primitive_atom(0);
    store.set(&count, 5).unwrap();
    assert_eq!(store.get(&count).unwrap(), 5);
}

#[test]
fn test_set_with_updater_closure() {
    let store = create_store(Vec::new());
    let count = primitive_atom(10);
    store.set(&count, SetStateAction::Updater(Box::new(|prev: i32| prev + 1))).unwrap();
    assert_eq!(store.get(&count).unwrap(), 11);
}

#[test]
fn test_two_stores_do_not_share_primitive_values() {
    let store_a = create_store(Vec::new());
    let store_b = create_store(Vec::new());
    let count = primitive_atom(0);

    store_a.set(&count, 100).unwrap();
    assert_eq!(store_a.get(&count).unwrap(), 100);
    assert_eq!(store_b.get(&count).unwrap(), 0);
}

#[test]
fn test_subscribe_invokes_listener_once_per_change() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let store = create_store(Vec::new());
    let count = primitive_atom(0);
    let fired = Arc::new(AtomicUsize::new(0));

    let mut unsub = store.subscribe(&count, {
        let fired = fired.clone();
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
        }
    });

    store.set(&count, 1).unwrap();
    store.set(&count, 2).unwrap();
    store.set(&count, 2).unwrap(); // unchanged, no notification
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    unsub.call();
    store.set(&count, 3).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}
