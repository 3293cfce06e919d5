//! The `Set` contract shared by every sampled domain.

use std::fmt;
use std::sync::Arc;

use super::error::{Result, SetError};
use crate::units::Unit;

/// Transform between a set's own coordinates and a reference frame.
///
/// Arrays are laid out `[component][point]`.
pub trait CoordinateSystem: fmt::Debug + Send + Sync {
    /// Number of components on both sides of the transform.
    fn dimension(&self) -> usize;

    /// Units of the reference coordinates, one per component.
    fn reference_units(&self) -> Vec<Option<Unit>> {
        vec![None; self.dimension()]
    }

    fn to_reference(&self, values: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>>;

    fn from_reference(&self, values: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>>;
}

/// Uncertainty attached to one component of a set.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEstimate {
    pub error: f64,
    pub mean: f64,
    pub count: usize,
    pub unit: Option<Unit>,
}

impl ErrorEstimate {
    pub fn new(error: f64, unit: Option<Unit>) -> Self {
        Self {
            error,
            mean: f64::NAN,
            count: 0,
            unit,
        }
    }

    /// Same error, with the mean recomputed from `values`.
    ///
    /// Missing values do not contribute to the mean.
    pub(crate) fn with_samples(&self, values: &[f32]) -> Self {
        let (sum, n) = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0_f64, 0_usize), |(s, n), &v| (s + f64::from(v), n + 1));
        Self {
            error: self.error,
            mean: if n > 0 { sum / n as f64 } else { f64::NAN },
            count: values.len(),
            unit: self.unit.clone(),
        }
    }
}

/// Dimensions and per-component metadata common to all sets.
#[derive(Debug, Clone)]
pub struct SetCore {
    domain_dimension: usize,
    manifold_dimension: usize,
    length: usize,
    units: Vec<Option<Unit>>,
    errors: Vec<Option<ErrorEstimate>>,
    coordinate_system: Option<Arc<dyn CoordinateSystem>>,
}

impl SetCore {
    /// # Errors
    ///
    /// Fails if the domain dimension is zero or smaller than the manifold
    /// dimension.
    pub fn new(domain_dimension: usize, manifold_dimension: usize, length: usize) -> Result<Self> {
        if domain_dimension == 0 {
            return Err(SetError::DimensionMismatch {
                context: "Set",
                expected: 1,
                found: 0,
            });
        }
        if manifold_dimension > domain_dimension {
            return Err(SetError::DimensionMismatch {
                context: "Set manifold dimension",
                expected: domain_dimension,
                found: manifold_dimension,
            });
        }
        Ok(Self {
            domain_dimension,
            manifold_dimension,
            length,
            units: vec![None; domain_dimension],
            errors: vec![None; domain_dimension],
            coordinate_system: None,
        })
    }

    pub fn with_units(mut self, units: Vec<Option<Unit>>) -> Result<Self> {
        if units.len() != self.domain_dimension {
            return Err(SetError::DimensionMismatch {
                context: "Set units",
                expected: self.domain_dimension,
                found: units.len(),
            });
        }
        self.units = units;
        Ok(self)
    }

    pub fn with_errors(mut self, errors: Vec<Option<ErrorEstimate>>) -> Result<Self> {
        if errors.len() != self.domain_dimension {
            return Err(SetError::DimensionMismatch {
                context: "Set errors",
                expected: self.domain_dimension,
                found: errors.len(),
            });
        }
        self.errors = errors;
        Ok(self)
    }

    pub fn with_coordinate_system(mut self, cs: Arc<dyn CoordinateSystem>) -> Result<Self> {
        if cs.dimension() != self.domain_dimension {
            return Err(SetError::DimensionMismatch {
                context: "Set coordinate system",
                expected: self.domain_dimension,
                found: cs.dimension(),
            });
        }
        self.coordinate_system = Some(cs);
        Ok(self)
    }

    pub fn domain_dimension(&self) -> usize {
        self.domain_dimension
    }

    pub fn manifold_dimension(&self) -> usize {
        self.manifold_dimension
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn units(&self) -> &[Option<Unit>] {
        &self.units
    }

    pub fn errors(&self) -> &[Option<ErrorEstimate>] {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut [Option<ErrorEstimate>] {
        &mut self.errors
    }

    pub fn coordinate_system(&self) -> Option<&Arc<dyn CoordinateSystem>> {
        self.coordinate_system.as_ref()
    }

    /// Units, coordinate system and dimensions agree.
    pub(crate) fn same_shape(&self, other: &SetCore) -> bool {
        let same_cs = match (&self.coordinate_system, &other.coordinate_system) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_cs
            && self.domain_dimension == other.domain_dimension
            && self.manifold_dimension == other.manifold_dimension
            && self.length == other.length
            && self.units == other.units
    }
}

/// Optional metadata supplied when constructing a set.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{Gridded1DSet, Set, SetOptions};
/// use unitgrid::units::{Unit, UnitRegistry};
///
/// let si = UnitRegistry::with_si();
/// let m = Unit::from(si.quantity_to_unit("Length").unwrap());
/// let options = SetOptions::default().with_units(vec![Some(m)]);
/// let set = Gridded1DSet::with_options(vec![vec![0.0, 1.0, 3.0]], 3, options).unwrap();
/// assert!(set.units()[0].is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    pub units: Option<Vec<Option<Unit>>>,
    pub errors: Option<Vec<Option<ErrorEstimate>>>,
    pub coordinate_system: Option<Arc<dyn CoordinateSystem>>,
}

impl SetOptions {
    pub fn with_units(mut self, units: Vec<Option<Unit>>) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_errors(mut self, errors: Vec<Option<ErrorEstimate>>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_coordinate_system(mut self, cs: Arc<dyn CoordinateSystem>) -> Self {
        self.coordinate_system = Some(cs);
        self
    }

    /// Validate the options against the set's dimensions.
    pub fn into_core(self, domain_dimension: usize, manifold_dimension: usize, length: usize) -> Result<SetCore> {
        let mut core = SetCore::new(domain_dimension, manifold_dimension, length)?;
        if let Some(units) = self.units {
            core = core.with_units(units)?;
        }
        if let Some(errors) = self.errors {
            core = core.with_errors(errors)?;
        }
        if let Some(cs) = self.coordinate_system {
            core = core.with_coordinate_system(cs)?;
        }
        Ok(core)
    }
}

/// A finite set of points in R^n.
///
/// Arrays are laid out `[component][point]`. Missing values are NaN and
/// indices that do not correspond to a sample are `None`.
pub trait Set: fmt::Debug + Send + Sync {
    fn core(&self) -> &SetCore;

    fn domain_dimension(&self) -> usize {
        self.core().domain_dimension()
    }

    fn manifold_dimension(&self) -> usize {
        self.core().manifold_dimension()
    }

    /// Number of samples.
    fn len(&self) -> usize {
        self.core().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn units(&self) -> &[Option<Unit>] {
        self.core().units()
    }

    fn errors(&self) -> &[Option<ErrorEstimate>] {
        self.core().errors()
    }

    fn coordinate_system(&self) -> Option<&Arc<dyn CoordinateSystem>> {
        self.core().coordinate_system()
    }

    /// Per-component minimum over valid samples.
    fn low(&self) -> &[f32];

    /// Per-component maximum over valid samples.
    fn hi(&self) -> &[f32];

    /// Structural hash over dimensions and sample values.
    fn hash_code(&self) -> u64;

    /// Copy of all sample coordinates.
    fn samples(&self) -> Result<Vec<Vec<f32>>> {
        let all: Vec<usize> = (0..self.len()).collect();
        self.index_to_value(&all)
    }

    /// Sample coordinates for each index; out of range indices give NaN.
    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>>;

    /// Index of the sample nearest to each value, if any.
    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>>;

    fn index_to_double(&self, index: &[usize]) -> Result<Vec<Vec<f64>>> {
        Ok(widen(self.index_to_value(index)?))
    }

    fn double_to_index(&self, value: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        self.value_to_index(&narrow(value))
    }
}

pub(crate) fn widen(values: Vec<Vec<f32>>) -> Vec<Vec<f64>> {
    values
        .into_iter()
        .map(|c| c.into_iter().map(f64::from).collect())
        .collect()
}

pub(crate) fn narrow(values: &[Vec<f64>]) -> Vec<Vec<f32>> {
    values
        .iter()
        .map(|c| c.iter().map(|&v| v as f32).collect())
        .collect()
}

/// Check a `[component][point]` array and return its point count.
pub(crate) fn point_count<T>(context: &'static str, expected: usize, value: &[Vec<T>]) -> Result<usize> {
    if value.len() != expected {
        return Err(SetError::DimensionMismatch {
            context,
            expected,
            found: value.len(),
        });
    }
    let n = value.first().map_or(0, Vec::len);
    for component in value {
        if component.len() != n {
            return Err(SetError::LengthMismatch {
                context,
                expected: n,
                found: component.len(),
            });
        }
    }
    Ok(n)
}
