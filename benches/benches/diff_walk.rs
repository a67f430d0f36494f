// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use geodiff_tree::{BoundsDiffVisitor, DiffWalker, MemoryStore, RevTree, TreeBuilder};
use kurbo::Rect;

fn gen_grid_features(builder: &mut TreeBuilder, n: usize, cell: f64) {
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            let extent = if (x + y) % 3 == 0 {
                Rect::new(x0, y0, x0, y0)
            } else {
                Rect::new(x0, y0, x0 + cell * 0.5, y0 + cell * 0.5)
            };
            builder.put_feature(format!("f{x}_{y}"), extent);
        }
    }
}

/// Two versions of an `n * n` feature tree where every `stride`-th feature moved.
fn versions(n: usize, stride: usize) -> (MemoryStore, Arc<RevTree>, Arc<RevTree>) {
    let mut store = MemoryStore::new();
    let mut builder = TreeBuilder::new();
    gen_grid_features(&mut builder, n, 10.0);
    let old = builder.build(&mut store);
    for i in (0..n * n).step_by(stride) {
        let (x, y) = (i % n, i / n);
        let x0 = x as f64 * 10.0 + 1.0;
        let y0 = y as f64 * 10.0 + 1.0;
        builder.put_feature(format!("f{x}_{y}"), Rect::new(x0, y0, x0 + 2.0, y0 + 2.0));
    }
    let new = builder.build(&mut store);
    (store, old, new)
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_walk");
    for &(n, stride) in &[(64usize, 1usize), (64, 97), (128, 1009)] {
        let (store, old, new) = versions(n, stride);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("bounds_n{}_stride{}", n * n, stride), |b| {
            b.iter_batched(
                BoundsDiffVisitor::new,
                |mut visitor| {
                    let walker = DiffWalker::new(old.clone(), new.clone(), &store, &store);
                    let stats = walker.walk(&mut visitor).unwrap();
                    black_box(stats.total());
                    black_box(visitor.build().num_parts());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");
    for &n in &[32usize, 128] {
        let mut builder = TreeBuilder::new();
        gen_grid_features(&mut builder, n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("build_n{}", n * n), |b| {
            b.iter_batched(
                MemoryStore::new,
                |mut store| black_box(builder.build(&mut store).id()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walk, bench_build);
criterion_main!(benches);
