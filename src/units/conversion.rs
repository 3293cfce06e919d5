//! Numeric value conversion between convertible units.
//!
//! Conversion always passes through the derived (canonical) unit:
//! a value in `that` is mapped to its derived value and then into `self`.
//! For an offset unit this means the offset is subtracted last when
//! converting into it and added first when converting out of it.
//!
//! Two flavours are provided for each direction:
//!
//! - allocating (`to_this`, `to_that`): borrow the input, return a new `Vec`;
//! - consuming (`to_this_owned`, `to_that_owned`): take ownership and convert
//!   in place.
//!
//! NaN inputs are passed through untouched.

use num_traits::Float;

use super::error::{Result, UnitError};
use super::unit::Unit;

impl Unit {
    fn check_convertible(&self, that: &Unit) -> Result<()> {
        if self.is_convertible(that) {
            Ok(())
        } else {
            Err(UnitError::NotConvertible {
                from: that.to_string(),
                to: self.to_string(),
            })
        }
    }

    /// True when values pass through unchanged.
    fn is_identity_with(&self, that: &Unit) -> bool {
        self == that || matches!(self, Unit::Promiscuous) || matches!(that, Unit::Promiscuous)
    }

    #[inline]
    fn convert_from<T: Float>(&self, that: &Unit, value: T) -> T {
        if value.is_nan() {
            return value;
        }
        let x = value.to_f64().unwrap_or(f64::NAN);
        let y = self.from_derived_value(that.to_derived_value(x));
        <T as num_traits::NumCast>::from(y).unwrap_or_else(T::nan)
    }

    /// Convert a single value expressed in `that` into this unit.
    pub fn to_this_value<T: Float>(&self, value: T, that: &Unit) -> Result<T> {
        if self.is_identity_with(that) {
            return Ok(value);
        }
        self.check_convertible(that)?;
        Ok(self.convert_from(that, value))
    }

    /// Convert a single value expressed in this unit into `that`.
    pub fn to_that_value<T: Float>(&self, value: T, that: &Unit) -> Result<T> {
        that.to_this_value(value, self)
    }

    /// Convert values expressed in `that` into this unit.
    ///
    /// # Errors
    ///
    /// [`UnitError::NotConvertible`] if the units have different dimensions.
    pub fn to_this<T: Float>(&self, values: &[T], that: &Unit) -> Result<Vec<T>> {
        if self.is_identity_with(that) {
            return Ok(values.to_vec());
        }
        self.check_convertible(that)?;
        Ok(values.iter().map(|&v| self.convert_from(that, v)).collect())
    }

    /// Consuming variant of [`Unit::to_this`]; reuses the buffer.
    pub fn to_this_owned<T: Float>(&self, mut values: Vec<T>, that: &Unit) -> Result<Vec<T>> {
        if self.is_identity_with(that) {
            return Ok(values);
        }
        self.check_convertible(that)?;
        for v in values.iter_mut() {
            *v = self.convert_from(that, *v);
        }
        Ok(values)
    }

    /// Convert values expressed in this unit into `that`.
    pub fn to_that<T: Float>(&self, values: &[T], that: &Unit) -> Result<Vec<T>> {
        that.to_this(values, self)
    }

    /// Consuming variant of [`Unit::to_that`].
    pub fn to_that_owned<T: Float>(&self, values: Vec<T>, that: &Unit) -> Result<Vec<T>> {
        that.to_this_owned(values, self)
    }

    /// Parallel version of [`Unit::to_this`] using Rayon.
    #[cfg(feature = "parallel")]
    pub fn to_this_parallel<T: Float + Send + Sync>(
        &self,
        values: &[T],
        that: &Unit,
    ) -> Result<Vec<T>> {
        use rayon::prelude::*;

        if self.is_identity_with(that) {
            return Ok(values.to_vec());
        }
        self.check_convertible(that)?;
        Ok(values
            .par_iter()
            .map(|&v| self.convert_from(that, v))
            .collect())
    }

    /// Convert a tuple of component arrays between unit lists.
    ///
    /// `values[i]` is expressed in `units_in[i]` and is converted into
    /// `units_out[i]`. A missing unit on either side leaves the component
    /// untouched.
    pub fn convert_tuple<T: Float>(
        values: Vec<Vec<T>>,
        units_in: &[Option<Unit>],
        units_out: &[Option<Unit>],
    ) -> Result<Vec<Vec<T>>> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, component)| {
                let from = units_in.get(i).and_then(Option::as_ref);
                let to = units_out.get(i).and_then(Option::as_ref);
                match (from, to) {
                    (Some(from), Some(to)) => to.to_this_owned(component, from),
                    _ => Ok(component),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitRegistry;
    use approx::assert_relative_eq;

    fn units() -> (Unit, Unit, Unit) {
        let si = UnitRegistry::with_si();
        let k = Unit::from(si.quantity_to_unit("Temperature").unwrap());
        let c = k.shift(273.15).unwrap();
        let f = k.scale(5.0 / 9.0).unwrap().shift(459.67).unwrap();
        (k, c, f)
    }

    #[test]
    fn test_offset_order() {
        let (k, c, f) = units();
        // degC from kelvin subtracts the offset after delegating
        let celsius = c.to_this(&[273.15_f64, 373.15], &k).unwrap();
        assert_relative_eq!(celsius[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(celsius[1], 100.0, epsilon = 1e-10);

        // and adds it first when leaving
        let kelvin = c.to_that(&[0.0_f64, -273.15], &k).unwrap();
        assert_relative_eq!(kelvin[0], 273.15, epsilon = 1e-10);
        assert_relative_eq!(kelvin[1], 0.0, epsilon = 1e-10);

        let fahrenheit = f.to_this(&[100.0_f64], &c).unwrap();
        assert_relative_eq!(fahrenheit[0], 212.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_passthrough() {
        let (k, c, _) = units();
        let out = c.to_this(&[1.0_f32, f32::NAN, 3.0], &k).unwrap();
        assert!(out[1].is_nan());
        assert!(!out[0].is_nan());
    }

    #[test]
    fn test_owned_reuses_buffer() {
        let (k, c, _) = units();
        let values = vec![0.0_f64; 4];
        let ptr = values.as_ptr();
        let out = k.to_this_owned(values, &c).unwrap();
        assert_eq!(out.as_ptr(), ptr);
        assert_relative_eq!(out[3], 273.15);
    }

    #[test]
    fn test_not_convertible() {
        let si = UnitRegistry::with_si();
        let m = Unit::from(si.quantity_to_unit("Length").unwrap());
        let s = Unit::from(si.quantity_to_unit("Time").unwrap());
        let err = m.to_this(&[1.0_f64], &s).unwrap_err();
        assert!(matches!(err, UnitError::NotConvertible { .. }));
        assert!(m.to_this_value(1.0_f64, &Unit::Promiscuous).is_ok());
    }

    #[test]
    fn test_convert_tuple() {
        let (k, c, _) = units();
        let out = Unit::convert_tuple(
            vec![vec![0.0_f64], vec![5.0]],
            &[Some(c), None],
            &[Some(k), None],
        )
        .unwrap();
        assert_relative_eq!(out[0][0], 273.15);
        assert_eq!(out[1][0], 5.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_conversion() {
        let (k, c, f) = units();
        let values: Vec<f64> = (0..1000).map(|i| i as f64 * 0.25).collect();
        assert_eq!(f.to_this_parallel(&values, &c).unwrap(), f.to_this(&values, &c).unwrap());
        assert_eq!(k.to_this_parallel(&values, &k).unwrap(), values);
    }
}
