//! Integration tests for sample-backed grids.
//!
//! Irregular 1-D grids, curvilinear 2-D and 3-D grids, the generic N-D
//! container and the shared double precision grid cache.

use std::sync::Arc;

use approx::assert_relative_eq;
use unitgrid::sets::{
    Gridded1DDoubleSet, Gridded1DDoubleSetCache, Gridded1DSet, Gridded2DSet, Gridded3DDoubleSet, Gridded3DSet,
    GriddedNDSet, GriddedSet, Set, SetError, SetOptions, make_gridded_set,
};

/// Sheared lattice `x = i + 0.3 j`, `y = 0.5 j - 0.1 i`, rasterized x fastest.
fn sheared(nx: usize, ny: usize) -> Vec<Vec<f32>> {
    let mut xs = Vec::with_capacity(nx * ny);
    let mut ys = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            xs.push(i as f32 + 0.3 * j as f32);
            ys.push(0.5 * j as f32 - 0.1 * i as f32);
        }
    }
    vec![xs, ys]
}

#[test]
fn test_interp_weights_reproduce_query() {
    let set = Gridded2DSet::new(sheared(8, 6), 8, 6).unwrap();
    let grid = vec![vec![0.5, 3.25, 6.9, 2.0], vec![0.5, 4.75, 1.1, 2.0]];
    let query = set.grid_to_value(&grid).unwrap();
    let samples = set.samples().unwrap();

    let interp = set.value_to_interp(&query).unwrap();
    for (i, entry) in interp.iter().enumerate() {
        let entry = entry.as_ref().unwrap();
        let total: f32 = entry.weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-5);
        for component in 0..2 {
            let estimate: f32 = entry
                .indices
                .iter()
                .zip(&entry.weights)
                .map(|(&k, &w)| samples[component][k] * w)
                .sum();
            assert_relative_eq!(estimate, query[component][i], epsilon = 1e-4);
        }
    }
}

#[test]
fn test_value_to_grid_with_guess_tracks_cell() {
    let set = Gridded2DSet::new(sheared(10, 10), 10, 10).unwrap();
    let mut guess = None;
    let path: Vec<[f32; 2]> = (0..20).map(|k| [1.0 + 0.37 * k as f32, 1.5 + 0.31 * k as f32]).collect();
    for p in &path {
        let value = set.grid_to_value(&[vec![p[0]], vec![p[1]]]).unwrap();
        let g = set.value_to_grid_with_guess(&value, &mut guess).unwrap();
        assert_relative_eq!(g[0][0], p[0], epsilon = 1e-4);
        assert_relative_eq!(g[1][0], p[1], epsilon = 1e-4);
        let cell = guess.as_ref().unwrap();
        assert!(cell[0] <= p[0] as usize + 1 && cell[1] <= p[1] as usize + 1);
    }
}

#[test]
fn test_outside_curvilinear_grid() {
    let set = Gridded2DSet::new(sheared(5, 5), 5, 5).unwrap();
    let g = set.value_to_grid(&[vec![-3.0, 100.0], vec![-3.0, 0.0]]).unwrap();
    assert!(g[0].iter().all(|v| v.is_nan()));
    assert_eq!(set.value_to_index(&[vec![-3.0], vec![-3.0]]).unwrap(), vec![None]);
    assert!(set.value_to_interp(&[vec![-3.0], vec![-3.0]]).unwrap()[0].is_none());
}

#[test]
fn test_folded_grid_rejected() {
    let mut samples = sheared(4, 4);
    // swap two interior points to fold a cell
    samples[0].swap(5, 6);
    samples[1].swap(5, 6);
    assert!(matches!(
        Gridded2DSet::new(samples, 4, 4),
        Err(SetError::InvalidGrid(_))
    ));
}

#[test]
fn test_irregular_1d_grid() {
    let set = Gridded1DSet::new(vec![vec![10.0, 7.0, 2.0, 1.0]], 4).unwrap();
    assert!(!set.is_ascending());
    let g = set.value_to_grid(&[vec![4.5, 1.0, 12.0]]).unwrap();
    assert_relative_eq!(g[0][0], 1.5, epsilon = 1e-6);
    assert_relative_eq!(g[0][1], 3.0, epsilon = 1e-6);
    assert!(g[0][2].is_nan());
    assert!(Gridded1DSet::new(vec![vec![0.0, 2.0, 1.0]], 3).is_err());
}

#[test]
fn test_double_set_precision() {
    let samples: Vec<f64> = (0..50).map(|k| 1.0e9 + (k as f64).powi(2)).collect();
    let set = Gridded1DDoubleSet::new(samples).unwrap();
    let g = set.double_to_grid(&[vec![1.0e9 + 30.25]]).unwrap();
    // between 25 and 36
    assert_relative_eq!(g[0][0], 5.0 + 5.25 / 11.0, epsilon = 1e-9);
    let v = set.grid_to_double(&g).unwrap();
    assert_relative_eq!(v[0][0], 1.0e9 + 30.25, epsilon = 1e-6);
}

#[test]
fn test_cache_interns_and_purges() {
    let cache = Gridded1DDoubleSetCache::new();
    let a = cache.create(vec![0.0, 0.5, 2.0], SetOptions::default()).unwrap();
    let b = cache.create(vec![0.0, 0.5, 2.0], SetOptions::default()).unwrap();
    let c = cache.create(vec![0.0, 0.5, 3.0], SetOptions::default()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.live_count(), 2);

    drop(a);
    drop(b);
    assert_eq!(cache.live_count(), 1);
    let d = cache.create(vec![0.0, 0.5, 2.0], SetOptions::default()).unwrap();
    assert_eq!(d.len(), 3);
    assert_eq!(cache.live_count(), 2);
}

#[test]
fn test_factory_picks_specific_sets() {
    let one = make_gridded_set(vec![vec![0.0, 1.0, 3.0]], &[3], SetOptions::default(), true).unwrap();
    assert_eq!(one.value_to_grid(&[vec![2.0]]).unwrap(), vec![vec![1.5]]);

    let two = make_gridded_set(sheared(3, 3), &[3, 3], SetOptions::default(), true).unwrap();
    let v = two.grid_to_value(&[vec![1.0], vec![1.0]]).unwrap();
    assert_relative_eq!(v[0][0], 1.3, epsilon = 1e-6);

    let cube = vec![
        vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0],
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
    ];
    let three = make_gridded_set(cube, &[2, 2, 2], SetOptions::default(), true).unwrap();
    let g = three.value_to_grid(&[vec![0.2], vec![0.7], vec![0.4]]).unwrap();
    assert_relative_eq!(g[1][0], 0.7, epsilon = 1e-6);
    assert_eq!(three.neighbors().unwrap()[0], vec![1, 2, 4]);

    let samples = vec![vec![0.0; 8]; 4];
    let four = make_gridded_set(samples, &[2, 2, 2], SetOptions::default(), false).unwrap();
    assert!(matches!(
        four.value_to_grid(&[vec![0.0], vec![0.0], vec![0.0], vec![0.0]]),
        Err(SetError::Unimplemented(_))
    ));
}

#[test]
fn test_nd_container_index_access() {
    let samples = vec![(0..12).map(|k| k as f32).collect(), vec![1.0; 12], vec![2.0; 12]];
    let set = GriddedNDSet::new(samples, &[2, 3, 2]).unwrap();
    assert_eq!(set.len(), 12);
    let v = set.index_to_value(&[7, 12]).unwrap();
    assert_eq!(v[0][0], 7.0);
    assert!(v[0][1].is_nan());
    assert_eq!(set.low(), &[0.0, 1.0, 2.0]);
    assert_eq!(set.hi(), &[11.0, 1.0, 2.0]);
}

#[test]
fn test_degenerate_curvilinear_axes() {
    let column = Gridded2DSet::new(vec![vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 2.0]], 1, 3).unwrap();
    let row = Gridded2DSet::new(vec![vec![0.0, 1.0, 2.0], vec![0.0, 0.0, 0.0]], 3, 1).unwrap();
    for set in [&column, &row] {
        assert!(matches!(
            set.grid_to_value(&[vec![-0.3], vec![-0.3]]),
            Err(SetError::DegenerateGrid(_))
        ));
        assert!(matches!(
            set.value_to_grid(&[vec![0.0], vec![1.0]]),
            Err(SetError::DegenerateGrid(_))
        ));
        // index access does not interpolate
        assert_eq!(set.index_to_value(&[2]).unwrap().len(), 2);
    }

    let single = Gridded2DSet::new(vec![vec![4.0], vec![-1.0]], 1, 1).unwrap();
    assert_eq!(single.grid_to_value(&[vec![0.2], vec![-0.4]]).unwrap(), vec![vec![4.0], vec![-1.0]]);
}

#[test]
fn test_irregular_1d_rejects_missing_samples() {
    for (samples, index) in [
        (vec![0.0, f32::INFINITY, 2.0], 1),
        (vec![f32::NEG_INFINITY, 1.0, 2.0], 0),
        (vec![0.0, 1.0, f32::NAN], 2),
    ] {
        assert_eq!(
            Gridded1DSet::new(vec![samples], 3).unwrap_err(),
            SetError::MissingSample { index }
        );
    }
}

/// Lattice rotated 30 degrees about z and sheared along z.
fn rotated_volume(n: [usize; 3]) -> Vec<Vec<f64>> {
    let (sin, cos) = 30.0_f64.to_radians().sin_cos();
    let mut out = vec![Vec::new(), Vec::new(), Vec::new()];
    for k in 0..n[2] {
        for j in 0..n[1] {
            for i in 0..n[0] {
                let (x, y, z) = (i as f64, j as f64, k as f64);
                out[0].push(cos * x - sin * y);
                out[1].push(sin * x + cos * y);
                out[2].push(0.5 * z + 0.1 * x);
            }
        }
    }
    out
}

#[test]
fn test_curvilinear_volume_walk() {
    let doubles = rotated_volume([7, 6, 5]);
    let floats: Vec<Vec<f32>> = doubles.iter().map(|c| c.iter().map(|&v| v as f32).collect()).collect();
    let single = Gridded3DSet::new(floats, 7, 6, 5).unwrap();
    let double = Gridded3DDoubleSet::new(doubles, 7, 6, 5).unwrap();
    assert!(single.is_positive());

    let grid = vec![vec![0.1, 5.7, 3.3, 6.2], vec![4.9, 0.4, 2.2, 5.3], vec![3.6, 1.1, 0.1, 3.9]];
    let values = single.grid_to_value(&grid).unwrap();
    let from_single = single.value_to_grid(&values).unwrap();
    let from_double = double.value_to_grid(&values).unwrap();
    for axis in 0..3 {
        for i in 0..4 {
            assert_relative_eq!(from_single[axis][i], grid[axis][i], epsilon = 1e-4);
            assert_relative_eq!(from_double[axis][i], grid[axis][i], epsilon = 1e-4);
        }
    }

    let interp = single.value_to_interp(&values).unwrap();
    for weights in interp.iter().map(|i| &i.as_ref().unwrap().weights) {
        assert_relative_eq!(weights.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }
    assert_eq!(single.value_to_index(&[vec![100.0], vec![0.0], vec![0.0]]).unwrap(), vec![None]);
}
