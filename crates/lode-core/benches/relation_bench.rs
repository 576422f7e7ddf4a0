//! Performance benchmarks for binding and batched relation loading.
//!
//! Run with: cargo bench -p lode-core
//!
//! These benchmarks measure:
//! - Binding throughput for growing collections
//! - Cold relation loads (one fetch shared by the whole batch)
//! - Warm relation loads served from the per-batch cache

use std::convert::Infallible;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use lode_core::{many, Engine, Handle, LoadResult, Model, RelationSpec};

// =============================================================================
// Benchmark models
// =============================================================================

#[derive(Default)]
struct Parent {
    id: u64,
    handle: Handle,
}

#[derive(Default)]
struct Child {
    parent_id: u64,
    handle: Handle,
}

impl Model for Parent {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl Model for Child {
    fn handle(&self) -> &Handle {
        &self.handle
    }
}

fn parents(n: u64) -> Vec<Parent> {
    (0..n)
        .map(|id| Parent {
            id,
            ..Default::default()
        })
        .collect()
}

async fn children(parent: &Parent) -> LoadResult<Vec<Arc<Child>>> {
    many(RelationSpec::new(
        "children",
        parent,
        |p: &Parent| Some(p.id),
        |c: &Child| c.parent_id,
        |keys: Vec<u64>| async move {
            Ok::<_, Infallible>(
                keys.iter()
                    .flat_map(|&parent_id| {
                        (0..3).map(move |_| Child {
                            parent_id,
                            ..Default::default()
                        })
                    })
                    .collect(),
            )
        },
    ))
    .await
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let engine = Engine::new();
            b.iter(|| black_box(engine.bind_values(parents(size))));
        });
    }

    group.finish();
}

fn bench_cold_relation_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("relation_cold");

    for size in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let engine = Engine::new();
            b.iter(|| {
                let parents = engine.bind_values(parents(size));
                rt.block_on(async {
                    for parent in &parents {
                        black_box(children(parent).await.unwrap());
                    }
                });
            });
        });
    }

    group.finish();
}

fn bench_warm_relation_load(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let parents = Engine::new().bind_values(parents(1_000));
    rt.block_on(children(&parents[0])).unwrap();

    c.bench_function("relation_warm", |b| {
        b.iter(|| {
            rt.block_on(async {
                for parent in &parents {
                    black_box(children(parent).await.unwrap());
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_bind,
    bench_cold_relation_load,
    bench_warm_relation_load
);
criterion_main!(benches);
