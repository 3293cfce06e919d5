//! Integration tests for the divide and conquer triangulator.
//!
//! Pseudo-random point clouds are triangulated and checked against
//! Euler's formula, an independent convex hull and the adjacency tables.
//! Concave paths are filled by ear clipping and checked by area and
//! containment.

use std::collections::HashMap;

use unitgrid::delaunay::{fill, inside, path_area};
use unitgrid::{DelaunayCustom, DelaunayError, DelaunayFast, Triangulation};

/// Reproducible points in `[0, 100)²` from a linear congruential generator.
fn cloud(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut state = seed;
    let mut next = || {
        state = (state * 1_103_515_245 + 12_345) % (1 << 31);
        (state as f64 / f64::from(1u32 << 31) * 100.0) as f32
    };
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for _ in 0..n {
        xs.push(next());
        ys.push(next());
    }
    vec![xs, ys]
}

/// Vertex count of the strict convex hull, by monotone chain.
fn hull_size(samples: &[Vec<f32>]) -> usize {
    let mut points: Vec<(f64, f64)> = samples[0]
        .iter()
        .zip(&samples[1])
        .map(|(&x, &y)| (f64::from(x), f64::from(y)))
        .collect();
    points.sort_by(|a, b| a.partial_cmp(b).unwrap());
    points.dedup();

    let cross = |o: (f64, f64), a: (f64, f64), b: (f64, f64)| (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0);
    let chain = |iter: &mut dyn Iterator<Item = (f64, f64)>| {
        let mut chain: Vec<(f64, f64)> = Vec::new();
        for p in iter {
            while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0 {
                chain.pop();
            }
            chain.push(p);
        }
        chain.len()
    };
    let lower = chain(&mut points.iter().copied());
    let upper = chain(&mut points.iter().rev().copied());
    lower + upper - 2
}

fn signed_area(samples: &[Vec<f32>], t: [usize; 3]) -> f64 {
    let p = |i: usize| (f64::from(samples[0][i]), f64::from(samples[1][i]));
    let (a, b, c) = (p(t[0]), p(t[1]), p(t[2]));
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn check_topology(triangulation: &Triangulation, n: usize) {
    assert!(triangulation.isolated_points().is_empty());

    // Euler's formula for a triangulated point set without holes
    let boundary = triangulation.boundary_edges();
    assert_eq!(triangulation.len(), 2 * n - 2 - boundary);
    assert_eq!(triangulation.num_edges, (3 * triangulation.len() + boundary) / 2);

    let mut shared: HashMap<(usize, usize), usize> = HashMap::new();
    for t in &triangulation.tri {
        for j in 0..3 {
            let (a, b) = (t[j], t[(j + 1) % 3]);
            *shared.entry((a.min(b), a.max(b))).or_default() += 1;
        }
    }
    assert!(shared.values().all(|&count| count <= 2));

    for (t, sides) in triangulation.walk.iter().enumerate() {
        for (j, across) in sides.iter().enumerate() {
            if let Some(other) = *across {
                assert!(triangulation.walk[other].contains(&Some(t)));
                let e = triangulation.edges[t][j];
                assert!(triangulation.edges[other].contains(&e));
            }
        }
    }
}

#[test]
fn test_random_clouds_satisfy_euler() {
    for seed in [1, 7, 42, 2024] {
        for n in [3, 4, 10, 50, 257, 1000] {
            let samples = cloud(n, seed);
            let triangulation = DelaunayFast::new(&samples).unwrap().into_triangulation();
            check_topology(&triangulation, n);
            for &t in &triangulation.tri {
                assert!(signed_area(&samples, t) < 0.0);
            }
        }
    }
}

#[test]
fn test_boundary_matches_convex_hull() {
    for n in [10, 50, 257, 1000] {
        let samples = cloud(n, 42);
        let triangulation = DelaunayFast::new(&samples).unwrap().into_triangulation();
        let h = hull_size(&samples);
        assert_eq!(triangulation.boundary_edges(), h);
        assert_eq!(triangulation.len(), 2 * n - 2 - h);
    }
}

#[test]
fn test_extra_samples_in_longer_component_are_ignored() {
    let mut samples = cloud(20, 3);
    samples[0].extend([500.0, 600.0]);
    let triangulation = DelaunayFast::new(&samples).unwrap().into_triangulation();
    assert_eq!(triangulation.vertices.len(), 20);
    check_topology(&triangulation, 20);
}

#[test]
fn test_rejected_inputs() {
    assert!(matches!(
        DelaunayFast::new(&[vec![0.0, 1.0, 2.0]]),
        Err(DelaunayError::InvalidDimension(1))
    ));
    assert!(matches!(
        DelaunayFast::new(&[vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]]),
        Err(DelaunayError::Unimplemented(_))
    ));
    assert!(matches!(
        DelaunayFast::new(&[vec![0.0, 1.0], vec![0.0, 1.0]]),
        Err(DelaunayError::TooFewPoints(2))
    ));
    assert!(matches!(
        DelaunayFast::new(&[vec![0.0, 1.0, f32::INFINITY], vec![0.0, 1.0, 0.5]]),
        Err(DelaunayError::NonFiniteSample { index: 2 })
    ));
}

/// Five pointed star, counterclockwise, alternating outer and inner radii.
fn star() -> Vec<Vec<f32>> {
    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for k in 0..10 {
        let radius = if k % 2 == 0 { 2.0 } else { 0.8 };
        let angle = std::f64::consts::PI / 5.0 * k as f64;
        xs.push((radius * angle.cos()) as f32);
        ys.push((radius * angle.sin()) as f32);
    }
    vec![xs, ys]
}

#[test]
fn test_fill_concave_star() {
    let path = star();
    let custom = DelaunayCustom::fill(&path).unwrap();
    let t = custom.triangulation();
    assert_eq!(t.len(), 8);
    assert!(t.isolated_points().is_empty());
    assert!((custom.area() - path_area(&path).unwrap()).abs() < 1e-4);

    // every triangle lies inside the star
    for &[a, b, c] in &t.tri {
        let cx = (path[0][a] + path[0][b] + path[0][c]) / 3.0;
        let cy = (path[1][a] + path[1][b] + path[1][c]) / 3.0;
        assert!(inside(&path, cx, cy).unwrap());
    }
    assert!(inside(&path, 0.0, 0.0).unwrap());
    // between two points of the star
    assert!(!inside(&path, 1.2 * 0.809, 1.2 * 0.588).unwrap());
    assert_eq!(custom.find_triangle(5.0, 5.0), None);
}

#[test]
fn test_fill_reversed_path_keeps_orientation() {
    let mut path = star();
    path[0].reverse();
    path[1].reverse();
    let tri = fill(&path, true).unwrap();
    assert_eq!(tri.len(), 8);
    for &[a, b, c] in &tri {
        let turn = (path[0][b] - path[0][a]) * (path[1][c] - path[1][a])
            - (path[1][b] - path[1][a]) * (path[0][c] - path[0][a]);
        assert!(turn < 0.0);
    }
}

#[test]
fn test_custom_accepts_fast_triangles() {
    let samples = cloud(60, 11);
    let fast = DelaunayFast::new(&samples).unwrap().into_triangulation();
    let custom = DelaunayCustom::new(&samples, fast.tri.clone()).unwrap();
    assert_eq!(custom.triangulation(), &fast);

    let mut bad = fast.tri.clone();
    bad[3][1] = 60;
    assert_eq!(
        DelaunayCustom::new(&samples, bad).unwrap_err(),
        DelaunayError::IndexOutOfRange { triangle: 3, index: 60 }
    );
}

#[test]
fn test_crossed_path_is_rejected() {
    // a figure eight
    let path = vec![vec![0.0, 2.0, 2.0, 0.0], vec![0.0, 2.0, 0.0, 2.0]];
    assert_eq!(DelaunayCustom::fill(&path).unwrap_err(), DelaunayError::SelfIntersecting);
    assert_eq!(path_area(&path).unwrap_err(), DelaunayError::SelfIntersecting);
}
