//! Double precision three dimensional grids.

use std::sync::Mutex;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, grid_length, grid_to_index};
use super::gridded_3d::{check_orientation, evaluate_all, locate_all};
use super::sampled::sample_hash;
use super::set::{Set, SetCore, SetOptions, narrow, point_count, widen};

/// A three dimensional grid volume of `f64` samples.
///
/// Shares the tetrahedral split and cell walk of
/// [`Gridded3DSet`](super::Gridded3DSet) but keeps samples and queries in
/// double precision. Non-finite samples are stored as NaN.
#[derive(Debug)]
pub struct Gridded3DDoubleSet {
    core: SetCore,
    samples: Vec<Vec<f64>>,
    lengths: [usize; 3],
    low: Vec<f32>,
    hi: Vec<f32>,
    pos: bool,
    hash: u64,
    last_cell: Mutex<Option<[usize; 3]>>,
}

impl Clone for Gridded3DDoubleSet {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            samples: self.samples.clone(),
            lengths: self.lengths,
            low: self.low.clone(),
            hi: self.hi.clone(),
            pos: self.pos,
            hash: self.hash,
            last_cell: Mutex::new(*self.last_cell.lock().unwrap_or_else(|e| e.into_inner())),
        }
    }
}

impl Gridded3DDoubleSet {
    pub fn new(samples: Vec<Vec<f64>>, nx: usize, ny: usize, nz: usize) -> Result<Self> {
        Self::with_options(samples, nx, ny, nz, SetOptions::default(), true)
    }

    /// # Errors
    ///
    /// - [`SetError::DimensionMismatch`] or [`SetError::LengthMismatch`]
    ///   if `samples` is not `[3][nx * ny * nz]`.
    /// - With `test`: [`SetError::MissingSample`] for a non-finite sample
    ///   and [`SetError::InvalidGrid`] for a cell whose orientation differs
    ///   from the first.
    pub fn with_options(
        mut samples: Vec<Vec<f64>>,
        nx: usize,
        ny: usize,
        nz: usize,
        options: SetOptions,
        test: bool,
    ) -> Result<Self> {
        let lengths = [nx, ny, nz];
        let length = grid_length(&lengths)?;
        let mut core = options.into_core(3, 3, length)?;
        let n = point_count("Gridded3DDoubleSet", 3, &samples)?;
        if n != length {
            return Err(SetError::LengthMismatch {
                context: "Gridded3DDoubleSet",
                expected: length,
                found: n,
            });
        }

        if test {
            if let Some(index) = samples.iter().flat_map(|c| c.iter().position(|v| !v.is_finite())).min() {
                return Err(SetError::MissingSample { index });
            }
        }
        let mut low = vec![f64::INFINITY; 3];
        let mut hi = vec![f64::NEG_INFINITY; 3];
        for (j, component) in samples.iter_mut().enumerate() {
            for v in component.iter_mut() {
                if v.is_finite() {
                    low[j] = low[j].min(*v);
                    hi[j] = hi[j].max(*v);
                } else {
                    *v = f64::NAN;
                }
            }
        }
        for (j, error) in core.errors_mut().iter_mut().enumerate() {
            if let Some(e) = error {
                let as_f32: Vec<f32> = samples[j].iter().map(|&v| v as f32).collect();
                *e = e.with_samples(&as_f32);
            }
        }

        let mut pos = false;
        if lengths.iter().all(|&l| l > 1) {
            let (positive, invalid) = check_orientation(samples.as_slice(), lengths);
            if let (true, Some([i, j, k])) = (test, invalid) {
                return Err(SetError::InvalidGrid(format!(
                    "Gridded3DDoubleSet samples do not form a valid grid ({i},{j},{k})"
                )));
            }
            pos = positive;
        }

        let hash = sample_hash(&core, &lengths, &samples);
        Ok(Self {
            core,
            samples,
            lengths,
            low: low.iter().map(|&v| v as f32).collect(),
            hi: hi.iter().map(|&v| v as f32).collect(),
            pos,
            hash,
            last_cell: Mutex::new(None),
        })
    }

    /// Borrow the samples, laid out `[component][point]`.
    pub fn doubles(&self) -> &[Vec<f64>] {
        &self.samples
    }

    /// Whether the grid axes form a right handed frame.
    pub fn is_positive(&self) -> bool {
        self.pos
    }

    pub fn grid_to_double(&self, grid: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_interpolable("Gridded3DDoubleSet grid_to_double", &self.lengths)?;
        point_count("Gridded3DDoubleSet grid_to_double", 3, grid)?;
        Ok(evaluate_all(self.samples.as_slice(), self.lengths, grid))
    }

    pub fn double_to_grid(&self, value: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let mut last = self.last_cell.lock().unwrap_or_else(|e| e.into_inner());
        self.search(value, &mut last)
    }

    /// Like [`Gridded3DDoubleSet::double_to_grid`], starting from `guess`.
    pub fn double_to_grid_with_guess(
        &self,
        value: &[Vec<f64>],
        guess: &mut Option<[usize; 3]>,
    ) -> Result<Vec<Vec<f64>>> {
        self.search(value, guess)
    }

    fn search(&self, value: &[Vec<f64>], cell: &mut Option<[usize; 3]>) -> Result<Vec<Vec<f64>>> {
        check_interpolable("Gridded3DDoubleSet double_to_grid", &self.lengths)?;
        point_count("Gridded3DDoubleSet double_to_grid", 3, value)?;
        Ok(locate_all(self.samples.as_slice(), self.lengths, value, cell))
    }
}

impl Set for Gridded3DDoubleSet {
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

    fn samples(&self) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.samples))
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.index_to_double(index)?))
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        self.double_to_index(&widen(value.to_vec()))
    }

    fn index_to_double(&self, index: &[usize]) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .samples
            .iter()
            .map(|component| {
                index
                    .iter()
                    .map(|&i| component.get(i).copied().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect())
    }

    fn double_to_index(&self, value: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        let grid = self.double_to_grid(value)?;
        Ok(grid_to_index(&narrow(&grid), &self.lengths))
    }
}

impl GriddedSet for Gridded3DDoubleSet {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.grid_to_double(&widen(grid.to_vec()))?))
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.double_to_grid(&widen(value.to_vec()))?))
    }

    fn value_to_grid_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut cell = match guess.as_deref() {
            Some(&[x, y, z]) => Some([x, y, z]),
            Some(other) => {
                return Err(SetError::DimensionMismatch {
                    context: "Gridded3DDoubleSet guess",
                    expected: 3,
                    found: other.len(),
                });
            }
            None => None,
        };
        let grid = self.search(&widen(value.to_vec()), &mut cell)?;
        if let Some(found) = cell {
            *guess = Some(found.to_vec());
        }
        Ok(narrow(&grid))
    }
}

impl PartialEq for Gridded3DDoubleSet {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_shape(&other.core)
            && self.lengths == other.lengths
            && self.samples.iter().zip(&other.samples).all(|(a, b)| {
                a.iter()
                    .zip(b)
                    .all(|(x, y)| if x.is_nan() { y.is_nan() } else { x == y })
            })
    }
}
