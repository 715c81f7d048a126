//! Store micro-benchmarks: primitive get/set, computed recomputation, and
//! a wide diamond cascade, to keep an eye on how the dependency graph
//! holds up under fan-out.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nexus_state::{computed_atom, create_store, primitive_atom};

fn bench_primitive_get(c: &mut Criterion) {
    let store = create_store(Vec::new());
    let counter = primitive_atom(0i64);

    c.bench_function("primitive_get", |b| {
        b.iter(|| black_box(store.get(&counter).unwrap()));
    });
}

fn bench_primitive_set(c: &mut Criterion) {
    let store = create_store(Vec::new());
    let counter = primitive_atom(0i64);
    let mut n = 0i64;

    c.bench_function("primitive_set", |b| {
        b.iter(|| {
            n += 1;
            store.set(&counter, black_box(n)).unwrap();
        });
    });
}

fn bench_computed_recompute_on_dependency_change(c: &mut Criterion) {
    let store = create_store(Vec::new());
    let base = primitive_atom(0i64);
    let doubled = {
        let base = base.clone();
        computed_atom(move |get| Ok(get.get(&base)? * 2))
    };
    store.get(&doubled).unwrap();
    let mut n = 0i64;

    c.bench_function("computed_recompute_on_dependency_change", |b| {
        b.iter(|| {
            n += 1;
            store.set(&base, n).unwrap();
            black_box(store.get(&doubled).unwrap());
        });
    });
}

/// 32-wide fan-out into a single sink: exercises the topological-closure
/// cascade (`Store::propagate_from`) rather than a single-edge recompute.
fn bench_wide_diamond_cascade(c: &mut Criterion) {
    let store = create_store(Vec::new());
    let base = primitive_atom(0i64);

    let layer: Vec<_> = (0..32)
        .map(|i| {
            let base = base.clone();
            computed_atom(move |get| Ok(get.get(&base)? + i))
        })
        .collect();

    let sink = {
        let layer = layer.clone();
        computed_atom(move |get| {
            let mut total = 0i64;
            for atom in &layer {
                total += get.get(atom)?;
            }
            Ok(total)
        })
    };
    store.get(&sink).unwrap();
    let mut n = 0i64;

    c.bench_function("wide_diamond_cascade", |b| {
        b.iter(|| {
            n += 1;
            store.set(&base, n).unwrap();
            black_box(store.get(&sink).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_primitive_get,
    bench_primitive_set,
    bench_computed_recompute_on_dependency_change,
    bench_wide_diamond_cascade,
);
criterion_main!(benches);
