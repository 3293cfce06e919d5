//! Benchmarks for inverse grid lookups.
//!
//! Run with: `cargo bench --bench grid_search_bench`
//!
//! Compares closed-form inversion on linear grids with the cell searches
//! on curvilinear and lat/lon grids, with and without a tracked guess.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unitgrid::sets::{Gridded2DSet, GriddedLatLonSet, GriddedSet, LatLonOrder, LinearNDSet};

/// Sheared curvilinear lattice, x fastest.
fn sheared(n: usize) -> Vec<Vec<f32>> {
    let (mut xs, mut ys) = (Vec::with_capacity(n * n), Vec::with_capacity(n * n));
    for j in 0..n {
        for i in 0..n {
            xs.push(i as f32 + 0.3 * j as f32);
            ys.push(0.5 * j as f32 - 0.1 * i as f32);
        }
    }
    vec![xs, ys]
}

/// Slanted swath, latitude first.
fn swath(n: usize) -> Vec<Vec<f32>> {
    let (mut lats, mut lons) = (Vec::with_capacity(n * n), Vec::with_capacity(n * n));
    for j in 0..n {
        for i in 0..n {
            lats.push(30.0 + 0.05 * j as f32 + 0.005 * i as f32);
            lons.push(-100.0 + 0.06 * i as f32 - 0.008 * j as f32);
        }
    }
    vec![lats, lons]
}

/// A scan line of grid coordinates, so consecutive points share cells.
fn scan_line(n: usize, points: usize) -> Vec<Vec<f32>> {
    let last = (n - 1) as f32;
    let xs = (0..points).map(|k| 0.5 + k as f32 / points as f32 * (last - 1.0)).collect();
    let ys = (0..points).map(|k| 0.25 + 0.5 * k as f32 / points as f32 * (last - 1.0)).collect();
    vec![xs, ys]
}

fn bench_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_nd");
    let set = LinearNDSet::new(&[0.0, 0.0], &[100.0, 50.0], &[201, 101]).unwrap();
    let values = set.grid_to_value(&scan_line(101, 10_000)).unwrap();

    group.bench_function("value_to_grid", |b| {
        b.iter(|| set.value_to_grid(black_box(&values)).unwrap());
    });
    group.bench_function("value_to_interp", |b| {
        b.iter(|| set.value_to_interp(black_box(&values)).unwrap());
    });

    group.finish();
}

fn bench_curvilinear(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridded_2d");

    for n in [32, 128, 256] {
        let set = Gridded2DSet::new(sheared(n), n, n).unwrap();
        let values = set.grid_to_value(&scan_line(n, 1_000)).unwrap();

        group.bench_with_input(BenchmarkId::new("value_to_grid", n), &n, |b, _| {
            b.iter(|| set.value_to_grid(black_box(&values)).unwrap());
        });
    }

    group.finish();
}

fn bench_latlon(c: &mut Criterion) {
    let mut group = c.benchmark_group("gridded_latlon");

    for n in [64, 256] {
        let set = GriddedLatLonSet::new(swath(n), n, n, LatLonOrder::LatLon).unwrap();
        let values = set.grid_to_value(&scan_line(n, 1_000)).unwrap();

        group.bench_with_input(BenchmarkId::new("tracked_guess", n), &n, |b, _| {
            b.iter(|| {
                let mut guess = None;
                set.value_to_grid_with_guess(black_box(&values), &mut guess).unwrap()
            });
        });

        let first = [values[0][0], values[1][0]];
        group.bench_with_input(BenchmarkId::new("cold_locate", n), &n, |b, _| {
            b.iter(|| set.locate(black_box(first), None).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_linear, bench_curvilinear, bench_latlon);
criterion_main!(benches);
