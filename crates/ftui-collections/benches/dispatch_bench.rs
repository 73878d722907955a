//! Benchmarks for change computation and listener dispatch.
//!
//! Run with: `cargo bench --package ftui-collections --bench dispatch_bench`
//!
//! # What is measured
//!
//! - `list_add/N`: one append observed by N element-change listeners,
//!   including the post-mutation snapshot kept on the change (skipped at
//!   N = 0).
//! - `list_remove_all/N`: scattered removal from an N-element list, which
//!   exercises run splitting in the diff.
//! - `set_transition/N`: minimal diff between two overlapping N-element sets.
//! - `content_binding/N`: one mutation mirrored across a bidirectional
//!   binding between two N-element lists.
//!
//! # Criterion Output
//!
//! Results are written to `target/criterion/dispatch_bench/`.

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ftui_collections::diff;
use ftui_collections::{ListChange, ListProperty, ObservableList, Property};
use indexmap::IndexSet;
use std::hint::black_box;

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_list_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_add");
    for listeners in [0usize, 1, 8, 64] {
        let list: ObservableList<u64> = ObservableList::new();
        let hits = Rc::new(Cell::new(0u64));
        for _ in 0..listeners {
            let hits = Rc::clone(&hits);
            list.add_listener(Rc::new(move |change: &mut ListChange<u64>| {
                while change.next() {}
                hits.set(hits.get() + 1);
            }));
        }
        group.throughput(Throughput::Elements(listeners.max(1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(listeners), &list, |b, list| {
            b.iter(|| {
                list.add(black_box(7)).ok();
                list.clear().ok();
            });
        });
    }
    group.finish();
}

fn bench_list_remove_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_remove_all");
    for size in [64usize, 1_024, 16_384] {
        let items: Vec<u64> = (0..size as u64).collect();
        let targets: Vec<u64> = items.iter().copied().filter(|v| v % 3 == 0).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| black_box(diff::list::remove_all(items, &targets)));
        });
    }
    group.finish();
}

fn bench_set_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_transition");
    for size in [64usize, 1_024, 16_384] {
        let old: IndexSet<u64> = (0..size as u64).collect();
        let new: IndexSet<u64> = (size as u64 / 2..size as u64 * 3 / 2).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| black_box(diff::set::transition(&old, &new)));
        });
    }
    group.finish();
}

// ============================================================================
// Binding Benchmarks
// ============================================================================

fn bench_content_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_binding");
    for size in [16usize, 256, 4_096] {
        let left: ListProperty<u64> =
            Property::new(Some(ObservableList::from_vec((0..size as u64).collect())));
        let right: ListProperty<u64> = Property::new(Some(ObservableList::new()));
        if right.bind_content_bidirectional(Some(&left)).is_err() {
            continue;
        }
        let Some(source) = left.get() else {
            continue;
        };
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                source.insert(0, black_box(u64::MAX)).ok();
                source.remove_at(0).ok();
            });
        });
    }
    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_list_add,
    bench_list_remove_all,
    bench_set_transition,
    bench_content_binding,
);

criterion_main!(benches);
