//! Irregular, monotonic one dimensional grids.

use num_traits::Float;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, grid_to_index, grid_length};
use super::sampled::SampledSet;
use super::set::{Set, SetCore, SetOptions, point_count};

/// Locate `values` in a monotonic sample sequence.
///
/// Bisection from the midpoint (or the cell found for the previous value)
/// until the bracketing cell is found, then linear inverse interpolation.
/// Results outside `(-0.5, len - 0.5)` are NaN.
pub(crate) fn locate_monotonic<T: Float>(samples: &[T], ascending: bool, values: &[T]) -> Vec<T> {
    let len = samples.len();
    let half = T::from(0.5).unwrap_or_else(T::nan);
    let upper_limit = T::from(len).unwrap_or_else(T::nan) - half;
    let middle = len.saturating_sub(1) / 2;
    let mut ig = middle;

    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                return T::nan();
            }
            if len == 1 {
                return T::zero();
            }
            let mut lower = 0;
            let mut upper = len - 1;
            while lower < upper {
                if (v - samples[ig]) * (v - samples[ig + 1]) <= T::zero() {
                    break;
                }
                let beyond_next = if ascending {
                    samples[ig + 1] < v
                } else {
                    samples[ig + 1] > v
                };
                let before_this = if ascending {
                    samples[ig] > v
                } else {
                    samples[ig] < v
                };
                if beyond_next {
                    lower = ig + 1;
                } else if before_this {
                    upper = ig;
                } else {
                    // unordered samples bracket nothing
                    break;
                }
                if lower < upper {
                    ig = (lower + upper) / 2;
                }
            }
            let offset = (v - samples[ig]) / (samples[ig + 1] - samples[ig]);
            let solv = T::from(ig).unwrap_or_else(T::nan) + offset;
            if solv > -half && solv < upper_limit {
                solv
            } else {
                ig = middle;
                T::nan()
            }
        })
        .collect()
}

/// Piecewise linear sample value at fractional grid coordinates.
pub(crate) fn interpolate_monotonic<T: Float>(samples: &[T], grid: &[T]) -> Vec<T> {
    let len = samples.len();
    let half = T::from(0.5).unwrap_or_else(T::nan);
    let upper_limit = T::from(len).unwrap_or_else(T::nan) - half;
    grid.iter()
        .map(|&g| {
            if g.is_nan() || g < -half || g > upper_limit {
                return T::nan();
            }
            if len == 1 {
                return samples[0];
            }
            let last_cell = len - 2;
            let ig = if g < T::zero() {
                0
            } else {
                g.to_usize().unwrap_or(last_cell).min(last_cell)
            };
            let a = g - T::from(ig).unwrap_or_else(T::nan);
            (T::one() - a) * samples[ig] + a * samples[ig + 1]
        })
        .collect()
}

/// A one dimensional set of strictly monotonic single precision samples.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{Gridded1DSet, GriddedSet};
///
/// let set = Gridded1DSet::new(vec![vec![0.0, 1.0, 4.0, 9.0]], 4).unwrap();
/// let grid = set.value_to_grid(&[vec![2.5]]).unwrap();
/// assert!((grid[0][0] - 1.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Gridded1DSet {
    sampled: SampledSet,
    lengths: [usize; 1],
    ascending: bool,
}

impl Gridded1DSet {
    pub fn new(samples: Vec<Vec<f32>>, length: usize) -> Result<Self> {
        Self::with_options(samples, length, SetOptions::default())
    }

    /// # Errors
    ///
    /// - [`SetError::MissingSample`] if a sample is NaN or infinite.
    /// - [`SetError::InvalidGrid`] if the samples are not strictly
    ///   increasing or strictly decreasing.
    pub fn with_options(samples: Vec<Vec<f32>>, length: usize, options: SetOptions) -> Result<Self> {
        grid_length(&[length])?;
        let core = options.into_core(1, 1, length)?;
        let mut sampled = SampledSet::new(core, samples)?;
        sampled.rehash(&[length]);

        let s = &sampled.samples()[0];
        if let Some(index) = s.iter().position(|v| v.is_nan()) {
            return Err(SetError::MissingSample { index });
        }
        let mut ascending = true;
        if length > 1 {
            let decreasing = s[1] <= s[0];
            for i in 1..length {
                if (s[i] <= s[i - 1]) != decreasing {
                    return Err(SetError::InvalidGrid(format!(
                        "Gridded1DSet samples do not form a valid grid ({i})"
                    )));
                }
            }
            ascending = !decreasing;
        }
        Ok(Self {
            sampled,
            lengths: [length],
            ascending,
        })
    }

    pub fn sampled(&self) -> &SampledSet {
        &self.sampled
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn low_x(&self) -> f32 {
        self.sampled.low()[0]
    }

    pub fn hi_x(&self) -> f32 {
        self.sampled.hi()[0]
    }
}

impl Set for Gridded1DSet {
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
        let grid = self.value_to_grid(value)?;
        Ok(grid_to_index(&grid, &self.lengths))
    }
}

impl GriddedSet for Gridded1DSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        point_count("Gridded1DSet grid_to_value", 1, grid)?;
        check_interpolable("Gridded1DSet grid_to_value", &self.lengths)?;
        Ok(vec![interpolate_monotonic(&self.sampled.samples()[0], &grid[0])])
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        point_count("Gridded1DSet value_to_grid", 1, value)?;
        check_interpolable("Gridded1DSet value_to_grid", &self.lengths)?;
        Ok(vec![locate_monotonic(
            &self.sampled.samples()[0],
            self.ascending,
            &value[0],
        )])
    }
}

impl PartialEq for Gridded1DSet {
    fn eq(&self, other: &Self) -> bool {
        self.sampled.same_samples(&other.sampled)
    }
}
