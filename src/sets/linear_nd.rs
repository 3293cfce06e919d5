//! Cross products of arithmetic progressions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, decompose};
use super::linear_1d::Linear1DSet;
use super::set::{ErrorEstimate, Set, SetCore, SetOptions, narrow, point_count, widen};

/// An N dimensional rectilinear grid built from one [`Linear1DSet`] per
/// axis. Samples are rasterized with the first axis varying fastest.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{GriddedSet, LinearNDSet, Set};
///
/// let set = LinearNDSet::new(&[0.0, 0.0], &[3.0, 3.0], &[4, 4]).unwrap();
/// assert_eq!(set.len(), 16);
/// assert_eq!(set.index_to_value(&[5]).unwrap(), vec![vec![1.0], vec![1.0]]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearNDSet {
    core: SetCore,
    axes: Vec<Linear1DSet>,
    lengths: Vec<usize>,
    low: Vec<f32>,
    hi: Vec<f32>,
    hash: u64,
}

impl LinearNDSet {
    pub fn new(firsts: &[f64], lasts: &[f64], lengths: &[usize]) -> Result<Self> {
        Self::with_options(firsts, lasts, lengths, SetOptions::default())
    }

    /// # Errors
    ///
    /// Fails if the three slices differ in length or any length is zero.
    pub fn with_options(firsts: &[f64], lasts: &[f64], lengths: &[usize], options: SetOptions) -> Result<Self> {
        let dim = lengths.len();
        if firsts.len() != dim || lasts.len() != dim {
            return Err(SetError::DimensionMismatch {
                context: "LinearNDSet firsts/lasts",
                expected: dim,
                found: firsts.len().min(lasts.len()),
            });
        }
        let axes = (0..dim)
            .map(|j| {
                let unit = options.units.as_ref().and_then(|u| u.get(j).cloned()).flatten();
                Linear1DSet::with_options(
                    firsts[j],
                    lasts[j],
                    lengths[j],
                    SetOptions::default().with_units(vec![unit]),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_axes(axes, options)
    }

    /// Compose existing progressions.
    ///
    /// When `options` carries a unit for an axis that differs from the
    /// axis' own unit, the axis end points are converted into it.
    pub fn from_axes(axes: Vec<Linear1DSet>, options: SetOptions) -> Result<Self> {
        let dim = axes.len();
        if dim == 0 {
            return Err(SetError::InvalidLength("LinearNDSet needs at least one axis".to_string()));
        }
        if let Some(units) = &options.units {
            if units.len() != dim {
                return Err(SetError::DimensionMismatch {
                    context: "LinearNDSet units",
                    expected: dim,
                    found: units.len(),
                });
            }
        }

        let mut converted = Vec::with_capacity(dim);
        let mut units = Vec::with_capacity(dim);
        for (j, axis) in axes.into_iter().enumerate() {
            let requested = options.units.as_ref().and_then(|u| u[j].clone());
            match requested {
                Some(unit) => {
                    converted.push(axis.in_unit(&unit)?);
                    units.push(Some(unit));
                }
                None => {
                    units.push(axis.units()[0].clone());
                    converted.push(axis);
                }
            }
        }

        let lengths: Vec<usize> = converted.iter().map(Set::len).collect();
        let length = lengths.iter().product();
        let mut core = SetOptions {
            units: Some(units),
            ..options
        }
        .into_core(dim, dim, length)?;

        let low: Vec<f32> = converted.iter().map(Linear1DSet::low_x).collect();
        let hi: Vec<f32> = converted.iter().map(Linear1DSet::hi_x).collect();
        for (j, error) in core.errors_mut().iter_mut().enumerate() {
            if let Some(e) = error {
                *e = ErrorEstimate {
                    mean: (f64::from(low[j]) + f64::from(hi[j])) / 2.0,
                    count: length,
                    ..e.clone()
                };
            }
        }

        let mut hasher = DefaultHasher::new();
        for axis in &converted {
            axis.hash_code().hash(&mut hasher);
        }
        Ok(Self {
            core,
            axes: converted,
            lengths,
            low,
            hi,
            hash: hasher.finish(),
        })
    }

    /// The progression along `axis`.
    pub fn axis(&self, axis: usize) -> Option<&Linear1DSet> {
        self.axes.get(axis)
    }

    pub(crate) fn axes(&self) -> &[Linear1DSet] {
        &self.axes
    }

    pub fn firsts(&self) -> Vec<f64> {
        self.axes.iter().map(Linear1DSet::first).collect()
    }

    pub fn lasts(&self) -> Vec<f64> {
        self.axes.iter().map(Linear1DSet::last).collect()
    }

    pub fn grid_to_double(&self, grid: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("LinearNDSet grid_to_double", self.axes.len(), grid)?;
        check_interpolable("LinearNDSet grid_to_double", &self.lengths)?;
        Ok(self
            .axes
            .iter()
            .zip(grid)
            .map(|(axis, g)| axis.grid_to_double_1d(g))
            .collect())
    }

    pub fn double_to_grid(&self, value: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("LinearNDSet double_to_grid", self.axes.len(), value)?;
        check_interpolable("LinearNDSet double_to_grid", &self.lengths)?;
        Ok(self
            .axes
            .iter()
            .zip(value)
            .map(|(axis, v)| axis.double_to_grid_1d(v))
            .collect())
    }
}

impl Set for LinearNDSet {
    fn core(&self) -> &SetCore {
        &self.core
    }

    fn low(&self) -> &[f32] {
        &self.low
    }

    fn hi(&self) -> &[f32] {
        &self.hi
    }

    fn hash_code(&self) -> u64 {
        self.hash
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.index_to_double(index)?))
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        self.double_to_index(&widen(value.to_vec()))
    }

    fn index_to_double(&self, index: &[usize]) -> Result<Vec<Vec<f64>>> {
        let dim = self.axes.len();
        let total = self.len();
        // per-axis indices; out of range flat indices stay out of range
        let mut per_axis = vec![Vec::with_capacity(index.len()); dim];
        for &i in index {
            if i < total {
                for (j, c) in decompose(i, &self.lengths).into_iter().enumerate() {
                    per_axis[j].push(c);
                }
            } else {
                for (j, axis) in per_axis.iter_mut().enumerate() {
                    axis.push(self.lengths[j]);
                }
            }
        }
        Ok(self
            .axes
            .iter()
            .zip(&per_axis)
            .map(|(axis, idx)| axis.index_to_double_1d(idx))
            .collect())
    }

    fn double_to_index(&self, value: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        let n = point_count("LinearNDSet double_to_index", self.axes.len(), value)?;
        let per_axis: Vec<Vec<Option<usize>>> = self
            .axes
            .iter()
            .zip(value)
            .map(|(axis, v)| axis.double_to_index_1d(v))
            .collect();
        Ok((0..n)
            .map(|i| {
                let mut k = 0;
                for j in (0..self.axes.len()).rev() {
                    k = per_axis[j][i]? + self.lengths[j] * k;
                }
                Some(k)
            })
            .collect())
    }
}

impl GriddedSet for LinearNDSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.grid_to_double(&widen(grid.to_vec()))?))
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.double_to_grid(&widen(value.to_vec()))?))
    }
}

impl PartialEq for LinearNDSet {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_shape(&other.core) && self.axes == other.axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Unit, UnitRegistry};
    use approx::assert_relative_eq;

    #[test]
    fn test_rasterization_first_axis_fastest() {
        let set = LinearNDSet::new(&[0.0, 10.0], &[2.0, 20.0], &[3, 2]).unwrap();
        let s = set.samples().unwrap();
        assert_eq!(s[0], vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
        assert_eq!(s[1], vec![10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
        assert_eq!(set.low(), &[0.0, 10.0]);
        assert_eq!(set.hi(), &[2.0, 20.0]);
    }

    #[test]
    fn test_value_to_index_and_back() {
        let set = LinearNDSet::new(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0], &[2, 3, 4]).unwrap();
        let idx = set
            .value_to_index(&[vec![0.9, 0.2], vec![1.1, 0.0], vec![2.2, 9.0]])
            .unwrap();
        assert_eq!(idx, vec![Some(1 + 2 * 1 + 6 * 2), None]);
        let back = set.index_to_value(&[15, 24]).unwrap();
        assert_eq!((back[0][0], back[1][0], back[2][0]), (1.0, 1.0, 2.0));
        assert!(back[0][1].is_nan());
    }

    #[test]
    fn test_grid_round_trip() {
        let set = LinearNDSet::new(&[-1.0, 5.0], &[1.0, -5.0], &[5, 11]).unwrap();
        let grid = vec![vec![0.3, 3.7], vec![9.9, 0.2]];
        let back = set.value_to_grid(&set.grid_to_value(&grid).unwrap()).unwrap();
        for j in 0..2 {
            for i in 0..2 {
                assert_relative_eq!(back[j][i], grid[j][i], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_degenerate_axis() {
        let set = LinearNDSet::new(&[0.0, 0.0], &[1.0, 0.0], &[2, 1]).unwrap();
        assert!(matches!(
            set.value_to_grid(&[vec![0.5], vec![0.0]]),
            Err(SetError::DegenerateGrid(_))
        ));
        assert!(LinearNDSet::new(&[0.0], &[1.0, 2.0], &[2]).is_err());
    }

    #[test]
    fn test_axis_units_converted() {
        let si = UnitRegistry::with_si();
        let m = Unit::from(si.quantity_to_unit("Length").unwrap());
        let km = m.scale(1000.0).unwrap();
        let x = Linear1DSet::with_options(0.0, 2.0, 3, SetOptions::default().with_units(vec![Some(km)])).unwrap();
        let y = Linear1DSet::new(0.0, 1.0, 2).unwrap();
        let options = SetOptions::default().with_units(vec![Some(m.clone()), None]);
        let set = LinearNDSet::from_axes(vec![x, y], options).unwrap();
        assert_eq!(set.lasts(), vec![2000.0, 1.0]);
        assert_eq!(set.units()[0].as_ref(), Some(&m));
        assert!(set.units()[1].is_none());
    }
}
