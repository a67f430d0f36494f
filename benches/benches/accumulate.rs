// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use geodiff_geom::{CoordAccumulator, DiffGeometry, PointSet, Shape};
use kurbo::Rect;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_points(count: usize) -> Vec<(f64, f64)> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| (rng.next_f64() * 360.0 - 180.0, rng.next_f64() * 180.0 - 90.0))
        .collect()
}

fn gen_extents(count: usize, max_size: f64) -> Vec<Rect> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            let x0 = rng.next_f64() * 2000.0;
            let y0 = rng.next_f64() * 2000.0;
            Rect::new(
                x0,
                y0,
                x0 + rng.next_f64() * max_size,
                y0 + rng.next_f64() * max_size,
            )
        })
        .collect()
}

fn bench_accumulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator");
    for &n in &[1_000usize, 100_000, 500_000] {
        let points = gen_points(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("add_n{}", n), |b| {
            b.iter_batched(
                CoordAccumulator::new,
                |mut acc| {
                    for &(x, y) in &points {
                        acc.add(x, y);
                    }
                    black_box(acc.len());
                },
                BatchSize::LargeInput,
            )
        });
    }
    let mut acc = CoordAccumulator::new();
    for (x, y) in gen_points(100_000) {
        acc.add(x, y);
    }
    group.bench_function("view_iter_n100000", |b| {
        b.iter(|| {
            let sum: f64 = acc.as_view().into_iter().map(|(x, y)| x + y).sum();
            black_box(sum);
        })
    });
    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    for &n in &[100usize, 1_000] {
        let extents = gen_extents(n, 40.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("rects_n{}", n), |b| {
            b.iter_batched(
                || {
                    let mut points = PointSet::new();
                    let mut shapes = Vec::with_capacity(extents.len());
                    for r in &extents {
                        match Shape::classify(*r) {
                            Shape::Point(c) => points.add(c.x, c.y),
                            s => shapes.push(s),
                        }
                    }
                    (points, shapes)
                },
                |(points, shapes)| {
                    let g = DiffGeometry::union(points, shapes);
                    black_box(g.num_parts());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let points = gen_points(100_000);
    group.bench_function("points_only_n100000", |b| {
        b.iter_batched(
            || {
                let mut set = PointSet::new();
                for &(x, y) in &points {
                    set.add(x, y);
                }
                set
            },
            |set| black_box(DiffGeometry::union(set, Vec::new()).num_parts()),
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_accumulator, bench_union);
criterion_main!(benches);
