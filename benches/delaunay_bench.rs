//! Benchmarks for the divide and conquer triangulator.
//!
//! Run with: `cargo bench --bench delaunay_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unitgrid::DelaunayFast;

/// Reproducible points in the unit square.
fn cloud(n: usize) -> Vec<Vec<f32>> {
    let mut state: u64 = 42;
    let mut next = || {
        state = (state * 1_103_515_245 + 12_345) % (1 << 31);
        state as f32 / (1u64 << 31) as f32
    };
    let mut samples = vec![Vec::with_capacity(n), Vec::with_capacity(n)];
    for _ in 0..n {
        samples[0].push(next());
        samples[1].push(next());
    }
    samples
}

fn bench_triangulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("delaunay_fast");

    for n in [1_000, 10_000, 100_000] {
        let samples = cloud(n);
        group.bench_with_input(BenchmarkId::new("random", n), &n, |b, _| {
            b.iter(|| DelaunayFast::new(black_box(&samples)).unwrap());
        });
    }

    // regular lattice, many collinear points
    let side = 100;
    let lattice: Vec<Vec<f32>> = vec![
        (0..side * side).map(|k| (k % side) as f32).collect(),
        (0..side * side).map(|k| (k / side) as f32).collect(),
    ];
    group.bench_function("lattice_10000", |b| {
        b.iter(|| DelaunayFast::new(black_box(&lattice)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_triangulate);
criterion_main!(benches);
