//! Integration tests for curvilinear lat/lon grids.
//!
//! Satellite-style swaths searched by hill climbing over great-circle
//! distance, including searches seeded from the previous cell.

use approx::assert_relative_eq;
use unitgrid::sets::{GriddedLatLonSet, GriddedSet, LatLonOrder, Set, SetError};

/// A slanted swath over North America, latitude first.
fn swath(nx: usize, ny: usize) -> Vec<Vec<f32>> {
    let mut lats = Vec::with_capacity(nx * ny);
    let mut lons = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let (x, y) = (i as f32, j as f32);
            lats.push(30.0 + 0.2 * y + 0.02 * x);
            lons.push(-100.0 + 0.25 * x - 0.03 * y);
        }
    }
    vec![lats, lons]
}

fn swath_set() -> GriddedLatLonSet {
    GriddedLatLonSet::new(swath(80, 60), 80, 60, LatLonOrder::LatLon).unwrap()
}

#[test]
fn test_swath_forward_inverse() {
    let set = swath_set();
    let grid = vec![vec![0.5, 12.25, 40.0, 78.6], vec![0.5, 33.75, 29.1, 58.2]];
    let values = set.grid_to_value(&grid).unwrap();
    let back = set.value_to_grid(&values).unwrap();
    for axis in 0..2 {
        for (g, b) in grid[axis].iter().zip(&back[axis]) {
            assert_relative_eq!(*g, *b, epsilon = 2e-3);
        }
    }
    assert_eq!(set.value_to_index(&values).unwrap()[2], Some(29 * 80 + 40));
}

#[test]
fn test_previous_cell_shortens_search() {
    let set = swath_set();
    let mut previous: Option<[usize; 2]> = None;

    for k in 0..10 {
        let target = [2.3 + 0.1 * k as f32, 3.4 + 0.07 * k as f32];
        let v = set.grid_to_value(&[vec![target[0]], vec![target[1]]]).unwrap();
        let value = [v[0][0], v[1][0]];

        let cold = set.locate(value, None).unwrap();
        let cold_grid = cold.grid.unwrap();
        assert_relative_eq!(cold_grid[0], target[0], epsilon = 2e-3);
        assert_relative_eq!(cold_grid[1], target[1], epsilon = 2e-3);

        if let Some(cell) = previous {
            let warm = set.locate(value, Some(cell)).unwrap();
            assert!(warm.iterations < cold.iterations);
            let warm_grid = warm.grid.unwrap();
            assert_relative_eq!(warm_grid[0], cold_grid[0], epsilon = 1e-5);
            assert_relative_eq!(warm_grid[1], cold_grid[1], epsilon = 1e-5);
        }
        previous = Some(cold.cell);
    }
}

#[test]
fn test_guess_is_updated_by_search() {
    let set = swath_set();
    let v = set.grid_to_value(&[vec![10.4], vec![50.6]]).unwrap();

    let mut guess = None;
    let g = set.value_to_grid_with_guess(&v, &mut guess).unwrap();
    assert_relative_eq!(g[0][0], 10.4, epsilon = 2e-3);
    let cell = guess.clone().unwrap();
    assert!(cell[0].abs_diff(10) <= 1 && cell[1].abs_diff(51) <= 1);

    // a stale guess still lands on the same point
    let mut stale = Some(vec![70, 2]);
    let again = set.value_to_grid_with_guess(&v, &mut stale).unwrap();
    assert_relative_eq!(again[1][0], 50.6, epsilon = 2e-3);
    assert_eq!(stale, guess);

    let mut bad = Some(vec![1, 2, 3]);
    assert!(matches!(
        set.value_to_grid_with_guess(&v, &mut bad),
        Err(SetError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_off_swath_points() {
    let set = swath_set();
    let g = set
        .value_to_grid(&[vec![10.0, 35.0, 35.0], vec![-95.0, 20.0, f32::NAN]])
        .unwrap();
    assert!(g[0].iter().all(|v| v.is_nan()));
    assert!(g[1].iter().all(|v| v.is_nan()));
}

#[test]
fn test_clone_and_equality() {
    let set = swath_set();
    let copy = set.clone();
    assert_eq!(copy, set);
    assert_eq!(copy.order(), LatLonOrder::LatLon);
    assert!(!copy.is_split());
    assert_eq!(copy.hash_code(), set.hash_code());
}

#[test]
fn test_single_row_and_column_swaths() {
    let column = GriddedLatLonSet::new(vec![vec![10.0, 11.0, 12.0], vec![5.0; 3]], 1, 3, LatLonOrder::LatLon).unwrap();
    let row = GriddedLatLonSet::new(vec![vec![10.0; 3], vec![5.0, 6.0, 7.0]], 3, 1, LatLonOrder::LatLon).unwrap();
    for set in [&column, &row] {
        assert!(matches!(
            set.grid_to_value(&[vec![-0.3], vec![-0.3]]),
            Err(SetError::DegenerateGrid(_))
        ));
        assert!(matches!(
            set.value_to_grid(&[vec![11.0], vec![5.0]]),
            Err(SetError::DegenerateGrid(_))
        ));
        assert!(matches!(
            set.locate([11.0, 5.0], None),
            Err(SetError::DegenerateGrid(_))
        ));
    }
}
