//! Arithmetic progressions.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::error::{Result, SetError};
use super::gridded::GriddedSet;
use super::set::{ErrorEstimate, Set, SetCore, SetOptions, narrow, point_count, widen};

/// The samples `first + i * step` for `i` in `0..length`.
///
/// Grid and value conversions are closed form. Everything is evaluated in
/// `f64`; the single precision entry points widen and narrow.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{GriddedSet, Linear1DSet, Set};
///
/// let set = Linear1DSet::new(0.0, 10.0, 11).unwrap();
/// assert_eq!(set.grid_to_value(&[vec![5.0]]).unwrap(), vec![vec![5.0]]);
/// assert_eq!(set.value_to_index(&[vec![12.0]]).unwrap(), vec![None]);
/// ```
#[derive(Debug, Clone)]
pub struct Linear1DSet {
    core: SetCore,
    first: f64,
    last: f64,
    step: f64,
    invstep: f64,
    lengths: [usize; 1],
    low: [f32; 1],
    hi: [f32; 1],
    hash: u64,
}

impl Linear1DSet {
    pub fn new(first: f64, last: f64, length: usize) -> Result<Self> {
        Self::with_options(first, last, length, SetOptions::default())
    }

    /// # Errors
    ///
    /// [`SetError::InvalidLength`] if `length` is zero.
    pub fn with_options(first: f64, last: f64, length: usize, options: SetOptions) -> Result<Self> {
        if length < 1 {
            return Err(SetError::InvalidLength(format!(
                "Linear1DSet: number of samples ({length}) must be greater than 0"
            )));
        }
        let mut core = options.into_core(1, 1, length)?;
        let step = if length < 2 {
            1.0
        } else {
            (last - first) / (length - 1) as f64
        };
        let end = first + step * (length - 1) as f64;
        let low = first.min(end) as f32;
        let hi = first.max(end) as f32;
        for error in core.errors_mut().iter_mut().flatten() {
            *error = ErrorEstimate {
                mean: (f64::from(low) + f64::from(hi)) / 2.0,
                count: length,
                ..error.clone()
            };
        }

        let mut hasher = DefaultHasher::new();
        first.to_bits().hash(&mut hasher);
        last.to_bits().hash(&mut hasher);
        length.hash(&mut hasher);
        Ok(Self {
            core,
            first,
            last,
            step,
            invstep: 1.0 / step,
            lengths: [length],
            low: [low],
            hi: [hi],
            hash: hasher.finish(),
        })
    }

    pub fn first(&self) -> f64 {
        self.first
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn invstep(&self) -> f64 {
        self.invstep
    }

    pub fn low_x(&self) -> f32 {
        self.low[0]
    }

    pub fn hi_x(&self) -> f32 {
        self.hi[0]
    }

    /// The same progression expressed in `unit`.
    ///
    /// The end points are converted from the current unit when there is
    /// one; otherwise the unit is simply attached.
    pub(crate) fn in_unit(&self, unit: &crate::units::Unit) -> Result<Self> {
        let current = self.core.units()[0].as_ref();
        if current == Some(unit) {
            return Ok(self.clone());
        }
        let (first, last) = match current {
            Some(from) => (unit.to_this_value(self.first, from)?, unit.to_this_value(self.last, from)?),
            None => (self.first, self.last),
        };
        let mut options = SetOptions::default().with_units(vec![Some(unit.clone())]);
        options.errors = Some(self.core.errors().to_vec());
        Self::with_options(first, last, self.len(), options)
    }

    fn grid_bounds(&self) -> (f64, f64) {
        (-0.5, self.len() as f64 - 0.5)
    }

    fn value_bounds(&self) -> (f64, f64) {
        let l = self.first - 0.5 * self.step;
        let h = self.first + (self.len() as f64 - 0.5) * self.step;
        if h < l { (h, l) } else { (l, h) }
    }

    pub(crate) fn grid_to_double_1d(&self, grid: &[f64]) -> Vec<f64> {
        let (l, h) = self.grid_bounds();
        grid.iter()
            .map(|&g| if l < g && g < h { self.first + g * self.step } else { f64::NAN })
            .collect()
    }

    pub(crate) fn double_to_grid_1d(&self, value: &[f64]) -> Vec<f64> {
        let (l, h) = self.value_bounds();
        value
            .iter()
            .map(|&v| if l < v && v < h { (v - self.first) * self.invstep } else { f64::NAN })
            .collect()
    }

    pub(crate) fn double_to_index_1d(&self, value: &[f64]) -> Vec<Option<usize>> {
        let length = self.len() as f64;
        value
            .iter()
            .map(|&v| {
                let di = 0.5 + (v - self.first) * self.invstep;
                (0.0 < di && di < length).then(|| di as usize)
            })
            .collect()
    }

    pub(crate) fn index_to_double_1d(&self, index: &[usize]) -> Vec<f64> {
        index
            .iter()
            .map(|&i| {
                if i < self.len() {
                    self.first + i as f64 * self.step
                } else {
                    f64::NAN
                }
            })
            .collect()
    }

    pub fn grid_to_double(&self, grid: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("Linear1DSet grid_to_double", 1, grid)?;
        Ok(vec![self.grid_to_double_1d(&grid[0])])
    }

    /// Grid coordinates in double precision; values beyond half a step
    /// outside the progression are NaN.
    pub fn double_to_grid(&self, value: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("Linear1DSet double_to_grid", 1, value)?;
        Ok(vec![self.double_to_grid_1d(&value[0])])
    }

    /// Parallel version of [`GriddedSet::value_to_grid`] using Rayon.
    #[cfg(feature = "parallel")]
    pub fn value_to_grid_parallel(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        use rayon::prelude::*;

        point_count("Linear1DSet value_to_grid", 1, value)?;
        let (l, h) = self.value_bounds();
        Ok(vec![
            value[0]
                .par_iter()
                .map(|&v| {
                    let v = f64::from(v);
                    if l < v && v < h {
                        ((v - self.first) * self.invstep) as f32
                    } else {
                        f32::NAN
                    }
                })
                .collect(),
        ])
    }
}

impl Set for Linear1DSet {
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
        Ok(vec![self.index_to_double_1d(index)])
    }

    fn double_to_index(&self, value: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        point_count("Linear1DSet double_to_index", 1, value)?;
        Ok(self.double_to_index_1d(&value[0]))
    }
}

impl GriddedSet for Linear1DSet {
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

impl PartialEq for Linear1DSet {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_shape(&other.core) && self.first == other.first && self.last == other.last
    }
}
