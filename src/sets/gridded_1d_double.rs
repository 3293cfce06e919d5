//! Double precision one dimensional grids and their interning cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, Interpolation, grid_length, grid_to_index, interpolation_weights};
use super::gridded_1d::{interpolate_monotonic, locate_monotonic};
use super::sampled::sample_hash;
use super::set::{Set, SetCore, SetOptions, narrow, point_count, widen};

/// A one dimensional set of monotonic `f64` samples.
///
/// Samples may repeat (non-strict monotonicity) but may not be missing.
/// Single precision queries are widened, answered in double precision and
/// narrowed again.
#[derive(Debug, Clone)]
pub struct Gridded1DDoubleSet {
    core: SetCore,
    samples: Vec<f64>,
    lengths: [usize; 1],
    low: [f32; 1],
    hi: [f32; 1],
    low_x: f64,
    hi_x: f64,
    ascending: bool,
    hash: u64,
}

impl Gridded1DDoubleSet {
    pub fn new(samples: Vec<f64>) -> Result<Self> {
        Self::with_options(samples, SetOptions::default())
    }

    /// # Errors
    ///
    /// - [`SetError::MissingSample`] if a sample is NaN or infinite.
    /// - [`SetError::NotMonotonic`] if the samples change direction.
    pub fn with_options(samples: Vec<f64>, options: SetOptions) -> Result<Self> {
        let length = samples.len();
        grid_length(&[length])?;
        let mut core = options.into_core(1, 1, length)?;

        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(SetError::MissingSample { index });
        }
        let ascending = samples[length - 1] > samples[0];
        let monotonic = samples.windows(2).all(|w| {
            if ascending { w[1] >= w[0] } else { w[1] <= w[0] }
        });
        if !monotonic {
            return Err(SetError::NotMonotonic("Gridded1DDoubleSet"));
        }

        let low_x = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let hi_x = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let as_f32: Vec<f32> = samples.iter().map(|&v| v as f32).collect();
        for error in core.errors_mut().iter_mut().flatten() {
            *error = error.with_samples(&as_f32);
        }
        let hash = sample_hash(&core, &[length], std::slice::from_ref(&samples));
        Ok(Self {
            core,
            samples,
            lengths: [length],
            low: [low_x as f32],
            hi: [hi_x as f32],
            low_x,
            hi_x,
            ascending,
            hash,
        })
    }

    /// Build from single precision samples.
    pub fn from_floats(samples: &[f32], options: SetOptions) -> Result<Self> {
        Self::with_options(samples.iter().map(|&v| f64::from(v)).collect(), options)
    }

    /// Borrow the samples.
    pub fn doubles(&self) -> &[f64] {
        &self.samples
    }

    pub fn low_x(&self) -> f64 {
        self.low_x
    }

    pub fn hi_x(&self) -> f64 {
        self.hi_x
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    pub fn grid_to_double(&self, grid: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("Gridded1DDoubleSet grid_to_double", 1, grid)?;
        Ok(vec![interpolate_monotonic(&self.samples, &grid[0])])
    }

    pub fn double_to_grid(&self, value: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        point_count("Gridded1DDoubleSet double_to_grid", 1, value)?;
        Ok(vec![locate_monotonic(&self.samples, self.ascending, &value[0])])
    }

    /// Double precision interpolation weights.
    pub fn double_to_interp(&self, value: &[Vec<f64>]) -> Result<Vec<Option<(Vec<usize>, Vec<f64>)>>> {
        let grid = self.double_to_grid(value)?;
        // The split weights are linear in the fractional offset, so they can
        // be recomputed in f64 from the narrow indices.
        let narrow_grid = narrow(&grid);
        Ok(interpolation_weights(&self.lengths, &narrow_grid)
            .into_iter()
            .zip(&grid[0])
            .map(|(interp, &g)| {
                interp.map(|Interpolation { indices, .. }| {
                    let weights = if indices.len() == 1 {
                        vec![1.0]
                    } else {
                        indices
                            .iter()
                            .map(|&k| 1.0 - (g - k as f64).abs().min(1.0))
                            .collect()
                    };
                    (indices, weights)
                })
            })
            .collect())
    }
}

impl Set for Gridded1DDoubleSet {
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
        Ok(vec![self.samples.iter().map(|&v| v as f32).collect()])
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        Ok(narrow(&self.index_to_double(index)?))
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        self.double_to_index(&widen(value.to_vec()))
    }

    fn index_to_double(&self, index: &[usize]) -> Result<Vec<Vec<f64>>> {
        Ok(vec![
            index
                .iter()
                .map(|&i| self.samples.get(i).copied().unwrap_or(f64::NAN))
                .collect(),
        ])
    }

    fn double_to_index(&self, value: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        let grid = self.double_to_grid(value)?;
        Ok(grid_to_index(&narrow(&grid), &self.lengths))
    }
}

impl GriddedSet for Gridded1DDoubleSet {
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

impl PartialEq for Gridded1DDoubleSet {
    fn eq(&self, other: &Self) -> bool {
        self.core.same_shape(&other.core) && self.samples == other.samples
    }
}

/// Interning table for [`Gridded1DDoubleSet`].
///
/// Structurally identical sets created through the same cache share one
/// allocation while any caller holds them. Entries are weak references, so
/// the cache never keeps a set alive; dead entries are purged on every call
/// to [`Gridded1DDoubleSetCache::create`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use unitgrid::sets::{Gridded1DDoubleSetCache, SetOptions};
///
/// let cache = Gridded1DDoubleSetCache::new();
/// let a = cache.create(vec![0.0, 1.0, 2.0], SetOptions::default()).unwrap();
/// let b = cache.create(vec![0.0, 1.0, 2.0], SetOptions::default()).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct Gridded1DDoubleSetCache {
    entries: Mutex<HashMap<u64, Vec<Weak<Gridded1DDoubleSet>>>>,
}

impl Gridded1DDoubleSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a shared set equal to one built from `samples`.
    pub fn create(&self, samples: Vec<f64>, options: SetOptions) -> Result<Arc<Gridded1DDoubleSet>> {
        let candidate = Gridded1DDoubleSet::with_options(samples, options)?;
        let hash = candidate.hash_code();

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before: usize = entries.values().map(Vec::len).sum();
        entries.retain(|_, bucket| {
            bucket.retain(|w| w.strong_count() > 0);
            !bucket.is_empty()
        });
        let after: usize = entries.values().map(Vec::len).sum();
        if after < before {
            tracing::trace!(purged = before - after, "purged dead grid cache entries");
        }

        let bucket = entries.entry(hash).or_default();
        if let Some(existing) = bucket
            .iter()
            .filter_map(Weak::upgrade)
            .find(|set| **set == candidate)
        {
            tracing::debug!(hash, len = candidate.len(), "grid cache hit");
            return Ok(existing);
        }

        let set = Arc::new(candidate);
        bucket.push(Arc::downgrade(&set));
        tracing::debug!(hash, len = set.len(), "grid cache miss");
        Ok(set)
    }

    /// Number of live interned sets.
    pub fn live_count(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .flatten()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}
