//! Explicit sample storage shared by the irregular and gridded sets.

use std::collections::hash_map::DefaultHasher;
use std::f32::consts::PI;
use std::hash::{Hash, Hasher};

use super::error::{Result, SetError};
use super::set::{SetCore, point_count};

/// Sample coordinates with their eagerly computed bounds and hash.
///
/// Non-finite samples are stored as NaN (missing). `low` and `hi` only
/// consider valid samples; a component with no valid samples has
/// `low = +inf` and `hi = -inf`.
#[derive(Debug, Clone)]
pub struct SampledSet {
    core: SetCore,
    samples: Vec<Vec<f32>>,
    low: Vec<f32>,
    hi: Vec<f32>,
    hash: u64,
}

impl SampledSet {
    /// Take ownership of `samples`, laid out `[component][point]`.
    ///
    /// # Errors
    ///
    /// Fails if the number of components differs from the domain dimension
    /// or if any component length differs from the set length.
    pub fn new(mut core: SetCore, mut samples: Vec<Vec<f32>>) -> Result<Self> {
        let n = point_count("SampledSet", core.domain_dimension(), &samples)?;
        if n != core.len() {
            return Err(SetError::LengthMismatch {
                context: "SampledSet",
                expected: core.len(),
                found: n,
            });
        }

        let dim = core.domain_dimension();
        let mut low = vec![f32::INFINITY; dim];
        let mut hi = vec![f32::NEG_INFINITY; dim];
        for (j, component) in samples.iter_mut().enumerate() {
            for v in component.iter_mut() {
                if v.is_finite() {
                    low[j] = low[j].min(*v);
                    hi[j] = hi[j].max(*v);
                } else {
                    *v = f32::NAN;
                }
            }
        }
        for (j, error) in core.errors_mut().iter_mut().enumerate() {
            if let Some(e) = error {
                *e = e.with_samples(&samples[j]);
            }
        }

        let hash = sample_hash(&core, &[], &samples);
        Ok(Self {
            core,
            samples,
            low,
            hi,
            hash,
        })
    }

    pub fn core(&self) -> &SetCore {
        &self.core
    }

    /// Borrow the stored samples.
    pub fn samples(&self) -> &[Vec<f32>] {
        &self.samples
    }

    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn hi(&self) -> &[f32] {
        &self.hi
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
    }

    pub(crate) fn rehash(&mut self, lengths: &[usize]) {
        self.hash = sample_hash(&self.core, lengths, &self.samples);
    }

    /// Mark samples as missing where `select` is false.
    ///
    /// Only the first component is overwritten, which is enough for every
    /// consumer to treat the point as missing.
    pub fn cram_missing(&mut self, select: &[bool]) {
        if let Some(first) = self.samples.first_mut() {
            for (v, &keep) in first.iter_mut().zip(select) {
                if !keep {
                    *v = f32::NAN;
                }
            }
        }
    }

    /// Sample values at `index`, NaN when out of range.
    pub(crate) fn values_at(&self, index: &[usize]) -> Vec<Vec<f32>> {
        self.samples
            .iter()
            .map(|component| {
                index
                    .iter()
                    .map(|&i| component.get(i).copied().unwrap_or(f32::NAN))
                    .collect()
            })
            .collect()
    }

    /// Gaussian distance weights for precomputed neighbor lists.
    ///
    /// Each weight is `exp(-d²/λ²)` with `λ² = 4d²/π²`. Coincident points get
    /// weight one.
    pub fn neighbor_weights(&self, neighbors: &[Vec<usize>]) -> Vec<Vec<f32>> {
        neighbors
            .iter()
            .enumerate()
            .map(|(i, list)| {
                list.iter()
                    .map(|&k| {
                        let d2: f32 = self
                            .samples
                            .iter()
                            .map(|c| {
                                let diff = c[i] - c[k];
                                diff * diff
                            })
                            .sum();
                        if d2 == 0.0 {
                            return 1.0;
                        }
                        let lambda2 = d2 * 4.0 / (PI * PI);
                        (-(d2 / lambda2)).exp()
                    })
                    .collect()
            })
            .collect()
    }

    /// Same dimensions, units and NaN-aware sample equality.
    pub(crate) fn same_samples(&self, other: &SampledSet) -> bool {
        self.core.same_shape(&other.core)
            && self.samples.iter().zip(&other.samples).all(|(a, b)| {
                a.iter()
                    .zip(b)
                    .all(|(x, y)| if x.is_nan() { y.is_nan() } else { x == y })
            })
    }
}

pub(crate) fn sample_hash<T: Copy + Into<f64>>(core: &SetCore, lengths: &[usize], samples: &[Vec<T>]) -> u64 {
    let mut hasher = DefaultHasher::new();
    core.domain_dimension().hash(&mut hasher);
    core.manifold_dimension().hash(&mut hasher);
    core.len().hash(&mut hasher);
    lengths.hash(&mut hasher);
    for component in samples {
        for &v in component {
            let v: f64 = v.into();
            // Canonical NaN so that all missing values hash alike
            let bits = if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() };
            bits.hash(&mut hasher);
        }
    }
    hasher.finish()
}
