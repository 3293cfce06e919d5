//! Rectangular grid topology and the operations shared by all gridded sets.
//!
//! Samples are rasterized with axis 0 varying fastest. Grid coordinates are
//! real valued and zero based; the valid range along axis `j` is
//! `[-0.5, lengths[j] - 0.5]`.

use super::error::{Result, SetError};
use super::gridded_1d::Gridded1DSet;
use super::gridded_2d::Gridded2DSet;
use super::gridded_3d::Gridded3DSet;
use super::sampled::SampledSet;
use super::set::{Set, SetCore, SetOptions, point_count};

/// Sample indices and multilinear weights for one interpolated point.
///
/// The weights sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub indices: Vec<usize>,
    pub weights: Vec<f32>,
}

/// A set whose samples form a logical rectangular grid.
pub trait GriddedSet: Set {
    /// Number of samples along each manifold axis.
    fn lengths(&self) -> &[usize];

    fn length(&self, axis: usize) -> Option<usize> {
        self.lengths().get(axis).copied()
    }

    /// Map grid coordinates `[axis][point]` to values `[component][point]`.
    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;

    /// Map values to fractional grid coordinates; NaN where off the grid.
    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;

    /// Like [`GriddedSet::value_to_grid`], starting the search at `guess`.
    ///
    /// On return `guess` holds the grid cell of the last located point.
    /// Sets with closed-form inverses ignore the guess.
    fn value_to_grid_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Vec<f32>>> {
        let _ = guess;
        self.value_to_grid(value)
    }

    /// Interpolation indices and weights for each value, `None` off the grid.
    fn value_to_interp(&self, value: &[Vec<f32>]) -> Result<Vec<Option<Interpolation>>> {
        let grid = self.value_to_grid(value)?;
        Ok(interpolation_weights(self.lengths(), &grid))
    }

    fn value_to_interp_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Option<Interpolation>>> {
        let grid = self.value_to_grid_with_guess(value, guess)?;
        Ok(interpolation_weights(self.lengths(), &grid))
    }

    /// Zig-zag enumeration of all indices with good spatial coherence.
    fn wedge(&self) -> Vec<usize> {
        wedge(self.lengths())
    }

    /// Axis neighbors of every point, minus side before plus side per axis.
    fn neighbors(&self) -> Result<Vec<Vec<usize>>> {
        let lengths = self.lengths();
        if !(1..=3).contains(&lengths.len()) {
            return Err(SetError::Unimplemented("GriddedSet neighbors for manifold dimension > 3"));
        }
        let offsets = axis_offsets(lengths);
        let total: usize = lengths.iter().product();
        Ok((0..total)
            .map(|i| {
                let coords = decompose(i, lengths);
                let mut list = Vec::with_capacity(2 * lengths.len());
                for (axis, &c) in coords.iter().enumerate() {
                    if c > 0 {
                        list.push(i - offsets[axis]);
                    }
                    if c + 1 < lengths[axis] {
                        list.push(i + offsets[axis]);
                    }
                }
                list
            })
            .collect())
    }

    /// Neighbors of every point along one axis as `[decreasing, increasing]`.
    fn neighbors_along(&self, axis: usize) -> Result<Vec<[Option<usize>; 2]>> {
        let lengths = self.lengths();
        if axis >= lengths.len() {
            return Err(SetError::DimensionMismatch {
                context: "GriddedSet neighbors_along",
                expected: lengths.len(),
                found: axis,
            });
        }
        let offset = axis_offsets(lengths)[axis];
        let total: usize = lengths.iter().product();
        Ok((0..total)
            .map(|i| {
                let c = (i / offset) % lengths[axis];
                [
                    (c > 0).then(|| i - offset),
                    (c + 1 < lengths[axis]).then(|| i + offset),
                ]
            })
            .collect())
    }
}

/// Validate grid lengths and return their product.
pub(crate) fn grid_length(lengths: &[usize]) -> Result<usize> {
    if lengths.is_empty() {
        return Err(SetError::InvalidLength("grid needs at least one axis".to_string()));
    }
    if let Some(axis) = lengths.iter().position(|&n| n == 0) {
        return Err(SetError::InvalidLength(format!(
            "each grid length must be at least 1 (length #{axis} is 0)"
        )));
    }
    Ok(lengths.iter().product())
}

/// Interpolation needs two samples per axis unless the set is a singleton.
pub(crate) fn check_interpolable(context: &'static str, lengths: &[usize]) -> Result<()> {
    let total: usize = lengths.iter().product();
    if total > 1 && lengths.iter().any(|&n| n < 2) {
        return Err(SetError::DegenerateGrid(context));
    }
    Ok(())
}

/// Stride of each axis in the flattened sample array.
pub(crate) fn axis_offsets(lengths: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lengths.len());
    let mut stride = 1;
    for &n in lengths {
        offsets.push(stride);
        stride *= n;
    }
    offsets
}

/// Mixed-radix decomposition of a flat index, axis 0 fastest.
pub(crate) fn decompose(mut index: usize, lengths: &[usize]) -> Vec<usize> {
    let mut coords = Vec::with_capacity(lengths.len());
    for (j, &n) in lengths.iter().enumerate() {
        if j + 1 == lengths.len() {
            coords.push(index);
        } else {
            coords.push(index % n);
            index /= n;
        }
    }
    coords
}

/// Grid coordinates for flat indices; out of range indices map to -1.
pub(crate) fn index_to_grid(index: &[usize], lengths: &[usize]) -> Vec<Vec<f32>> {
    let total: usize = lengths.iter().product();
    let mut grid = vec![Vec::with_capacity(index.len()); lengths.len()];
    for &i in index {
        if i < total {
            for (axis, c) in decompose(i, lengths).into_iter().enumerate() {
                grid[axis].push(c as f32);
            }
        } else {
            for axis in grid.iter_mut() {
                axis.push(-1.0);
            }
        }
    }
    grid
}

/// Round grid coordinates to the nearest flat index.
pub(crate) fn grid_to_index(grid: &[Vec<f32>], lengths: &[usize]) -> Vec<Option<usize>> {
    let n = grid.first().map_or(0, Vec::len);
    (0..n)
        .map(|i| {
            let mut k = 0_usize;
            for axis in (0..lengths.len()).rev() {
                let g = grid[axis][i];
                if g.is_nan() || g <= -0.5 {
                    return None;
                }
                let c = (g + 0.5) as usize;
                if c >= lengths[axis] {
                    return None;
                }
                k = c + lengths[axis] * k;
            }
            Some(k)
        })
        .collect()
}

/// Default `index_to_value` for gridded sets: go through `grid_to_value`.
pub(crate) fn index_to_value_via_grid<S: GriddedSet + ?Sized>(
    set: &S,
    index: &[usize],
) -> Result<Vec<Vec<f32>>> {
    set.grid_to_value(&index_to_grid(index, set.lengths()))
}

/// Default `value_to_index` for gridded sets: round `value_to_grid`.
pub(crate) fn value_to_index_via_grid<S: GriddedSet + ?Sized>(
    set: &S,
    value: &[Vec<f32>],
) -> Result<Vec<Option<usize>>> {
    point_count("GriddedSet value_to_index", set.domain_dimension(), value)?;
    let grid = set.value_to_grid(value)?;
    Ok(grid_to_index(&grid, set.lengths()))
}

/// Multilinear interpolation weights from fractional grid coordinates.
///
/// Along every axis where the point lies between two valid grid
/// coordinates, each candidate index is split in two and its weight is
/// divided in proportion to the fractional offset.
pub fn interpolation_weights(lengths: &[usize], grid: &[Vec<f32>]) -> Vec<Option<Interpolation>> {
    let dim = lengths.len();
    let offsets = axis_offsets(lengths);
    let n = grid.first().map_or(0, Vec::len);
    let mut l = vec![0_usize; dim];
    let mut c = vec![0.0_f32; dim];

    (0..n)
        .map(|i| {
            let mut base = 0_usize;
            for j in (0..dim).rev() {
                let g = grid[j][i];
                if g.is_nan() || g + 0.5 < 0.0 {
                    return None;
                }
                let mut lj = (g + 0.5) as usize;
                if lj == lengths[j] {
                    lj -= 1;
                }
                if lj >= lengths[j] {
                    return None;
                }
                l[j] = lj;
                c[j] = g - lj as f32;
                base = lj + lengths[j] * base;
            }

            let mut indices = vec![base];
            let mut weights = vec![1.0_f32];
            for j in 0..dim {
                let at_low_edge = l[j] == 0 && c[j] <= 0.0;
                let at_high_edge = l[j] + 1 == lengths[j] && c[j] >= 0.0;
                if at_low_edge || at_high_edge {
                    continue;
                }
                let (up, a, b) = if c[j] >= 0.0 {
                    (true, 1.0 - c[j], c[j])
                } else {
                    (false, 1.0 + c[j], -c[j])
                };
                let count = indices.len();
                for k in 0..count {
                    let split = if up {
                        indices[k] + offsets[j]
                    } else {
                        indices[k] - offsets[j]
                    };
                    indices.push(split);
                    weights.push(weights[k] * b);
                    weights[k] *= a;
                }
            }
            Some(Interpolation { indices, weights })
        })
        .collect()
}

/// Boustrophedon enumeration: each axis sweep reverses the previous one.
pub fn wedge(lengths: &[usize]) -> Vec<usize> {
    let total: usize = lengths.iter().product();
    let mut wedge = Vec::with_capacity(total);
    let Some(&first) = lengths.first() else {
        return wedge;
    };
    wedge.extend(0..first);
    let mut len = first;
    for &n in &lengths[1..] {
        let mut flip = true;
        let mut base = len;
        for _ in 1..n {
            if flip {
                for i in (0..len).rev() {
                    wedge.push(wedge[i] + base);
                }
            } else {
                for i in 0..len {
                    wedge.push(wedge[i] + base);
                }
            }
            base += len;
            flip = !flip;
        }
        len *= n;
    }
    wedge
}

/// Gridded set of arbitrary dimension with no closed-form grid inverse.
///
/// Stores samples and topology only; grid/value conversion is reported as
/// unimplemented.
#[derive(Debug, Clone)]
pub struct GriddedNDSet {
    sampled: SampledSet,
    lengths: Vec<usize>,
}

impl GriddedNDSet {
    pub fn new(samples: Vec<Vec<f32>>, lengths: &[usize]) -> Result<Self> {
        Self::with_options(samples, lengths, SetOptions::default())
    }

    pub fn with_options(samples: Vec<Vec<f32>>, lengths: &[usize], options: SetOptions) -> Result<Self> {
        let length = grid_length(lengths)?;
        let core = options.into_core(samples.len(), lengths.len(), length)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(lengths);
        Ok(Self {
            sampled,
            lengths: lengths.to_vec(),
        })
    }

    pub fn sampled(&self) -> &SampledSet {
        &self.sampled
    }
}

impl Set for GriddedNDSet {
    fn core(&self) -> &SetCore {
        self.sampled.core()
    }

    fn low(&self) -> &[f32] {
        self.sampled.low()
    }

    fn hi(&self) -> &[f32] {
        self.sampled.hi()
    }

    fn hash_code(&self) -> u64 {
        self.sampled.hash_code()
    }

    fn samples(&self) -> Result<Vec<Vec<f32>>> {
        Ok(self.sampled.samples().to_vec())
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(self.sampled.values_at(index))
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        value_to_index_via_grid(self, value)
    }
}

impl GriddedSet for GriddedNDSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, _grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        check_interpolable("GriddedSet grid_to_value", &self.lengths)?;
        Err(SetError::Unimplemented("GriddedSet grid_to_value"))
    }

    fn value_to_grid(&self, _value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        check_interpolable("GriddedSet value_to_grid", &self.lengths)?;
        Err(SetError::Unimplemented("GriddedSet value_to_grid"))
    }
}

impl PartialEq for GriddedNDSet {
    fn eq(&self, other: &Self) -> bool {
        self.lengths == other.lengths && self.sampled.same_samples(&other.sampled)
    }
}

/// Build the most specific gridded set for the given samples and lengths.
///
/// One dimensional domains give a [`Gridded1DSet`], two dimensional
/// domains a [`Gridded2DSet`] (curve or surface), three dimensional
/// domains a [`Gridded3DSet`] (curve, surface or volume) and anything else
/// a [`GriddedNDSet`]. `test` enables the cell orientation check for 2-D
/// surfaces and 3-D volumes.
pub fn make_gridded_set(
    samples: Vec<Vec<f32>>,
    lengths: &[usize],
    options: SetOptions,
    test: bool,
) -> Result<Box<dyn GriddedSet>> {
    let domain = samples.len();
    let manifold = lengths.len();
    if manifold > domain {
        return Err(SetError::DimensionMismatch {
            context: "make_gridded_set manifold dimension",
            expected: domain,
            found: manifold,
        });
    }
    Ok(match (domain, lengths) {
        (1, &[n]) => Box::new(Gridded1DSet::with_options(samples, n, options)?),
        (2, &[n]) => Box::new(Gridded2DSet::curve_with_options(samples, n, options)?),
        (2, &[nx, ny]) => Box::new(Gridded2DSet::with_options(samples, nx, ny, options, test)?),
        (3, &[_]) | (3, &[_, _]) => Box::new(Gridded3DSet::embedded(samples, lengths, options)?),
        (3, &[nx, ny, nz]) => Box::new(Gridded3DSet::with_options(samples, nx, ny, nz, options, test)?),
        _ => Box::new(GriddedNDSet::with_options(samples, lengths, options)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wedge_zigzag() {
        assert_eq!(wedge(&[3, 2]), vec![0, 1, 2, 5, 4, 3]);
        assert_eq!(wedge(&[2, 3]), vec![0, 1, 3, 2, 4, 5]);
        let mut w = wedge(&[3, 2, 2]);
        assert_eq!(w.len(), 12);
        w.sort_unstable();
        assert_eq!(w, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_decompose_axis0_fastest() {
        assert_eq!(decompose(5, &[3, 2]), vec![2, 1]);
        assert_eq!(decompose(7, &[2, 2, 2]), vec![1, 1, 1]);
        let grid = index_to_grid(&[4, 99], &[3, 2]);
        assert_eq!(grid, vec![vec![1.0, -1.0], vec![1.0, -1.0]]);
        assert_eq!(grid_to_index(&grid, &[3, 2]), vec![Some(4), None]);
    }

    #[test]
    fn test_grid_to_index_half_cell_bounds() {
        // -0.5 and n - 0.5 are both outside
        let grid = vec![vec![-0.5, -0.49, 2.49, 2.5, f32::NAN]];
        assert_eq!(grid_to_index(&grid, &[3]), vec![None, Some(0), Some(2), None, None]);
    }

    #[test]
    fn test_interpolation_weights_bilinear() {
        let out = interpolation_weights(&[3, 3], &[vec![0.25], vec![1.5]]);
        let interp = out[0].as_ref().unwrap();
        assert_eq!(interp.indices.len(), 4);
        let total: f32 = interp.weights.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
        // (0.25, 1.5): l = (0, 2), c = (0.25, -0.5)
        assert_eq!(interp.indices, vec![6, 7, 3, 4]);
        assert_relative_eq!(interp.weights[0], 0.375, epsilon = 1e-6);
        assert_relative_eq!(interp.weights[3], 0.125, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolation_at_edges_and_outside() {
        let out = interpolation_weights(&[4], &[vec![-0.25, 3.0, 3.25, f32::NAN, -0.75]]);
        assert_eq!(out[0].as_ref().unwrap().indices, vec![0]);
        assert_eq!(out[1].as_ref().unwrap().indices, vec![3]);
        assert_eq!(out[2].as_ref().unwrap().indices, vec![3]);
        assert!(out[3].is_none());
        assert!(out[4].is_none());
    }

    #[test]
    fn test_weights_invariant_under_axis_swap() {
        let a = interpolation_weights(&[4, 5], &[vec![1.3], vec![2.6]]);
        let b = interpolation_weights(&[5, 4], &[vec![2.6], vec![1.3]]);
        let mut wa = a[0].as_ref().unwrap().weights.clone();
        let mut wb = b[0].as_ref().unwrap().weights.clone();
        wa.sort_by(f32::total_cmp);
        wb.sort_by(f32::total_cmp);
        for (x, y) in wa.iter().zip(&wb) {
            assert_relative_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_nd_set_topology() {
        let samples = vec![
            (0..8).map(|i| i as f32).collect(),
            vec![0.0; 8],
            vec![1.0; 8],
        ];
        let set = GriddedNDSet::new(samples, &[2, 2, 2]).unwrap();
        assert_eq!(set.len(), 8);
        assert_eq!(set.neighbors().unwrap()[0], vec![1, 2, 4]);
        assert_eq!(set.neighbors_along(2).unwrap()[5], [Some(1), None]);
        assert!(matches!(
            set.value_to_grid(&[vec![0.0], vec![0.0], vec![1.0]]),
            Err(SetError::Unimplemented(_))
        ));
        assert_eq!(set.index_to_value(&[3]).unwrap()[0], vec![3.0]);
    }

    #[test]
    fn test_degenerate_axis_rejected() {
        let set = GriddedNDSet::new(vec![vec![0.0, 1.0]; 3], &[2, 1, 1]).unwrap();
        assert!(matches!(
            set.grid_to_value(&[vec![0.0], vec![0.0], vec![0.0]]),
            Err(SetError::DegenerateGrid(_))
        ));
        assert!(GriddedNDSet::new(vec![vec![0.0]; 3], &[1, 0, 1]).is_err());
    }

    #[test]
    fn test_factory_dispatch() {
        let one = make_gridded_set(vec![vec![0.0, 1.0, 2.0]], &[3], SetOptions::default(), false).unwrap();
        assert_eq!(one.manifold_dimension(), 1);
        assert_eq!(one.value_to_grid(&[vec![1.5]]).unwrap()[0][0], 1.5);

        let surface = make_gridded_set(
            vec![vec![0.0, 1.0, 0.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
            &[2, 2],
            SetOptions::default(),
            true,
        )
        .unwrap();
        assert_eq!(surface.lengths(), &[2, 2]);

        let err = make_gridded_set(vec![vec![0.0]], &[1, 1], SetOptions::default(), false);
        assert!(err.is_err());
    }
}
