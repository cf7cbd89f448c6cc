//! Benchmarks for layout and relationship queries.
//!
//! Benchmark targets:
//! - 100 people: <1ms
//! - 1,000 people: <10ms
//! - 5,000 people: <60ms
//!
//! Trees are synthetic: couples with two or three children each, repeated
//! generation by generation, so every person has parents, a spouse and
//! siblings.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use famgraph::models::{PersonData, PersonId, RelationshipType, TreeId};
use famgraph::rendering::{Point, ViewportController};
use famgraph::{ExportFormat, ExportService, GraphStore, LayoutEngine, RelationshipResolver};

// ============================================================================
// Helper Functions
// ============================================================================

fn add(store: &mut GraphStore, people: &mut Vec<PersonId>) -> PersonId {
    let id = store
        .add_person(PersonData::named(format!("P{}", people.len()), "Bench"))
        .unwrap();
    people.push(id.clone());
    id
}

/// Builds a tree of roughly `size` people.
fn build_tree(size: usize) -> (GraphStore, Vec<PersonId>) {
    let mut store = GraphStore::new(TreeId::new("bench"));
    let mut people = Vec::with_capacity(size);
    let mut couples: Vec<(PersonId, PersonId)> = Vec::new();

    let a = add(&mut store, &mut people);
    let b = add(&mut store, &mut people);
    store.add_relationship(&a, &b, RelationshipType::Spouse).unwrap();
    couples.push((a, b));

    let mut next = 0;
    while people.len() < size && next < couples.len() {
        let (mother, father) = couples[next].clone();
        next += 1;
        for i in 0..(2 + next % 2) {
            let child = add(&mut store, &mut people);
            store
                .add_relationship(&mother, &child, RelationshipType::ParentChild)
                .unwrap();
            store
                .add_relationship(&father, &child, RelationshipType::ParentChild)
                .unwrap();
            if i == 0 {
                let partner = add(&mut store, &mut people);
                store
                    .add_relationship(&child, &partner, RelationshipType::Spouse)
                    .unwrap();
                couples.push((child, partner));
            }
        }
    }
    (store, people)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let engine = LayoutEngine::default();

    for size in [100, 1_000, 5_000] {
        let (store, _) = build_tree(size);
        let snapshot = store.snapshot();
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| engine.layout(black_box(snapshot)).unwrap());
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    for size in [100, 1_000, 5_000] {
        let (store, people) = build_tree(size);
        let leaf = people.last().cloned().unwrap();
        let resolver = RelationshipResolver::new(&store);

        group.bench_with_input(BenchmarkId::new("ancestors", size), &leaf, |b, leaf| {
            b.iter(|| resolver.ancestors(black_box(leaf)).len());
        });
        group.bench_with_input(BenchmarkId::new("siblings", size), &leaf, |b, leaf| {
            b.iter(|| resolver.siblings(black_box(leaf)).len());
        });
        group.bench_with_input(BenchmarkId::new("cycle_check", size), &leaf, |b, leaf| {
            b.iter(|| store.is_ancestor(black_box(&people[0]), black_box(leaf)));
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let (store, _) = build_tree(1_000);
    let snapshot = store.snapshot();
    let service = ExportService::new();

    for &format in ExportFormat::all() {
        group.bench_with_input(BenchmarkId::from_parameter(format), &snapshot, |b, snapshot| {
            b.iter(|| service.export(black_box(snapshot), format).unwrap().len());
        });
    }
    group.finish();
}

fn bench_viewport(c: &mut Criterion) {
    let mut viewport = ViewportController::default();
    viewport.zoom(0.5);
    viewport.pan(120.0, -40.0);

    c.bench_function("viewport_round_trip", |b| {
        b.iter(|| viewport.to_model(viewport.to_view(black_box(Point::new(512.0, 384.0)))));
    });
}

criterion_group!(benches, bench_layout, bench_queries, bench_export, bench_viewport);
criterion_main!(benches);
