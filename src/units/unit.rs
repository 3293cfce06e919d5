//! The `Unit` sum type and its arithmetic.

use std::f64::consts::E;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;

use super::derived::DerivedUnit;
use super::error::{Result, UnitError};
use super::registry::BaseUnit;

/// Milliseconds from the Unix epoch to 2001-01-01T00:00:00Z, the origin
/// used when printing time offsets.
const TIME_ORIGIN_MILLIS: i64 = 978_307_200_000;

/// A multiplicative rescaling of a base, derived or logarithmic unit.
#[derive(Debug, Clone)]
pub struct ScaledUnit {
    amount: f64,
    under: Box<Unit>,
    identifier: Option<String>,
}

impl ScaledUnit {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn under(&self) -> &Unit {
        &self.under
    }
}

/// A unit whose zero is displaced from its underlying unit's zero.
///
/// A value `x` in this unit is `x + offset` in the underlying unit.
#[derive(Debug, Clone)]
pub struct OffsetUnit {
    offset: f64,
    under: Box<Unit>,
    identifier: Option<String>,
}

impl OffsetUnit {
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn under(&self) -> &Unit {
        &self.under
    }
}

/// Logarithm of the ratio to a reference level, e.g. the bel.
#[derive(Debug, Clone)]
pub struct LogarithmicUnit {
    base: f64,
    reference: Box<Unit>,
    identifier: Option<String>,
}

impl LogarithmicUnit {
    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn reference(&self) -> &Unit {
        &self.reference
    }
}

/// A physical unit.
///
/// All arithmetic returns canonical values: scaling by one and shifting by
/// zero return the operand unchanged, nested scalings and nested offsets are
/// folded together.
///
/// # Example
///
/// ```
/// use unitgrid::units::{Unit, UnitRegistry};
///
/// let si = UnitRegistry::with_si();
/// let kelvin = Unit::from(si.quantity_to_unit("Temperature").unwrap());
/// let celsius = kelvin.shift(273.15).unwrap();
///
/// // 0 degC expressed in kelvin
/// let k = kelvin.to_this(&[0.0_f64], &celsius).unwrap();
/// assert!((k[0] - 273.15).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub enum Unit {
    Base(Arc<BaseUnit>),
    Derived(DerivedUnit),
    Scaled(ScaledUnit),
    Offset(OffsetUnit),
    Logarithmic(LogarithmicUnit),
    /// Wildcard unit convertible with everything
    Promiscuous,
}

impl From<Arc<BaseUnit>> for Unit {
    fn from(base: Arc<BaseUnit>) -> Self {
        Unit::Base(base)
    }
}

impl From<DerivedUnit> for Unit {
    fn from(derived: DerivedUnit) -> Self {
        Unit::Derived(derived)
    }
}

impl Unit {
    /// The dimensionless unit "one".
    pub fn one() -> Self {
        Unit::Derived(DerivedUnit::one())
    }

    pub fn promiscuous() -> Self {
        Unit::Promiscuous
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Unit::Base(b) => b.abbreviation(),
            Unit::Derived(d) => d.identifier(),
            Unit::Scaled(s) => s.identifier.as_deref(),
            Unit::Offset(o) => o.identifier.as_deref(),
            Unit::Logarithmic(l) => l.identifier.as_deref(),
            Unit::Promiscuous => None,
        }
    }

    /// Copy of this unit carrying a display name.
    ///
    /// An empty identifier removes any existing one. Base units keep the
    /// abbreviation they were registered with.
    pub fn with_identifier(&self, identifier: &str) -> Result<Unit> {
        let id = (!identifier.is_empty()).then(|| identifier.to_string());
        Ok(match self {
            Unit::Base(_) => return Err(UnitError::BaseIdentifier),
            Unit::Derived(d) => Unit::Derived(d.clone().with_identifier(id)),
            Unit::Scaled(s) => Unit::Scaled(ScaledUnit {
                identifier: id,
                ..s.clone()
            }),
            Unit::Offset(o) => Unit::Offset(OffsetUnit {
                identifier: id,
                ..o.clone()
            }),
            Unit::Logarithmic(l) => Unit::Logarithmic(LogarithmicUnit {
                identifier: id,
                ..l.clone()
            }),
            Unit::Promiscuous => Unit::Promiscuous,
        })
    }

    /// Dimensional form used for convertibility checks.
    pub fn derived_unit(&self) -> DerivedUnit {
        match self {
            Unit::Base(b) => DerivedUnit::from_base(Arc::clone(b)),
            Unit::Derived(d) => d.clone().with_identifier(None),
            Unit::Scaled(s) => s.under.derived_unit(),
            Unit::Offset(o) => o.under.derived_unit(),
            Unit::Logarithmic(l) => l.reference.derived_unit(),
            Unit::Promiscuous => DerivedUnit::one(),
        }
    }

    /// This unit without any offset.
    pub fn absolute_unit(&self) -> Unit {
        match self {
            Unit::Offset(o) => o.under.absolute_unit(),
            other => other.clone(),
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        match self {
            Unit::Logarithmic(_) | Unit::Promiscuous => true,
            other => other.derived_unit().is_dimensionless(),
        }
    }

    /// Whether values in `other` can be converted into this unit.
    pub fn is_convertible(&self, other: &Unit) -> bool {
        if matches!(self, Unit::Promiscuous) || matches!(other, Unit::Promiscuous) {
            return true;
        }
        self.derived_unit().same_dimensionality(&other.derived_unit())
    }

    /// Convertibility where `None` stands for an unknown unit.
    ///
    /// Two unknown units are compatible, an unknown and a known unit are
    /// not. The promiscuous unit counts as unknown here.
    pub fn can_convert(a: Option<&Unit>, b: Option<&Unit>) -> bool {
        let a = a.filter(|u| !matches!(u, Unit::Promiscuous));
        let b = b.filter(|u| !matches!(u, Unit::Promiscuous));
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_convertible(b),
            _ => false,
        }
    }

    /// Element-wise [`Unit::can_convert`]; a missing array is all unknown.
    pub fn can_convert_array(a: Option<&[Option<Unit>]>, b: Option<&[Option<Unit>]>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| Unit::can_convert(x.as_ref(), y.as_ref()))
            }
            (Some(units), None) | (None, Some(units)) => units
                .iter()
                .all(|u| Unit::can_convert(u.as_ref(), None)),
        }
    }

    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Unit whose magnitude is `amount` of this unit.
    pub fn scale(&self, amount: f64) -> Result<Unit> {
        if amount == 0.0 {
            return Err(UnitError::ZeroScale);
        }
        if amount == 1.0 {
            return Ok(self.clone());
        }
        Ok(match self {
            Unit::Promiscuous => Unit::Promiscuous,
            Unit::Scaled(s) => {
                let total = s.amount * amount;
                if total == 1.0 {
                    (*s.under).clone()
                } else {
                    Unit::Scaled(ScaledUnit {
                        amount: total,
                        under: s.under.clone(),
                        identifier: None,
                    })
                }
            }
            Unit::Offset(o) => Unit::Offset(OffsetUnit {
                offset: o.offset / amount,
                under: Box::new(o.under.scale(amount)?),
                identifier: None,
            }),
            other => Unit::Scaled(ScaledUnit {
                amount,
                under: Box::new(other.anonymous()),
                identifier: None,
            }),
        })
    }

    /// Unit whose origin is displaced by `offset` of this unit.
    pub fn shift(&self, offset: f64) -> Result<Unit> {
        if offset == 0.0 {
            return Ok(self.clone());
        }
        Ok(match self {
            Unit::Promiscuous => Unit::Promiscuous,
            Unit::Offset(o) => {
                let total = o.offset + offset;
                if total == 0.0 {
                    (*o.under).clone()
                } else {
                    Unit::Offset(OffsetUnit {
                        offset: total,
                        under: o.under.clone(),
                        identifier: None,
                    })
                }
            }
            other => Unit::Offset(OffsetUnit {
                offset,
                under: Box::new(other.anonymous()),
                identifier: None,
            }),
        })
    }

    /// Logarithmic unit with this unit as reference level.
    pub fn log(&self, base: f64) -> Result<Unit> {
        if base != 2.0 && base != E && base != 10.0 {
            return Err(UnitError::InvalidLogBase(base));
        }
        match self {
            Unit::Logarithmic(_) => Err(UnitError::Logarithmic(format!(
                "can't form logarithmic unit from logarithmic unit \"{self}\""
            ))),
            Unit::Promiscuous => Err(UnitError::Logarithmic(
                "can't form logarithmic unit from the promiscuous unit".to_string(),
            )),
            other => Ok(Unit::Logarithmic(LogarithmicUnit {
                base,
                reference: Box::new(other.anonymous()),
                identifier: None,
            })),
        }
    }

    fn anonymous(&self) -> Unit {
        match self {
            Unit::Base(_) | Unit::Promiscuous => self.clone(),
            other => other
                .with_identifier("")
                .unwrap_or_else(|_| other.clone()),
        }
    }

    fn is_logarithmic(&self) -> bool {
        match self {
            Unit::Logarithmic(_) => true,
            Unit::Scaled(s) => s.under.is_logarithmic(),
            Unit::Offset(o) => o.under.is_logarithmic(),
            _ => false,
        }
    }

    /// `(amount, dimensions)` for non-logarithmic units with offsets removed.
    fn scaled_derived(&self) -> (f64, DerivedUnit) {
        match self {
            Unit::Scaled(s) => {
                let (a, d) = s.under.scaled_derived();
                (a * s.amount, d)
            }
            Unit::Offset(o) => o.under.scaled_derived(),
            other => (1.0, other.derived_unit()),
        }
    }

    fn from_scaled_derived(amount: f64, derived: DerivedUnit) -> Result<Unit> {
        Unit::Derived(derived).scale(amount)
    }

    /// Pure numeric factor, if this unit has no dimensions at all.
    fn numeric_factor(&self) -> Option<f64> {
        if self.is_logarithmic() {
            return None;
        }
        let (amount, derived) = self.scaled_derived();
        derived.factors().is_empty().then_some(amount)
    }

    // ---------------------------------------------------------------
    // Arithmetic
    // ---------------------------------------------------------------

    pub fn multiply(&self, other: &Unit) -> Result<Unit> {
        match (self, other) {
            (Unit::Promiscuous, u) | (u, Unit::Promiscuous) => Ok(u.clone()),
            (a, b) if a.is_logarithmic() && b.is_logarithmic() => {
                Err(UnitError::Logarithmic(format!("can't multiply \"{a}\" by \"{b}\"")))
            }
            (log, k) | (k, log) if log.is_logarithmic() => match k.numeric_factor() {
                Some(amount) => log.scale(amount),
                None => Err(UnitError::NotDimensionless(k.to_string())),
            },
            (a, b) => {
                let (a1, d1) = a.scaled_derived();
                let (a2, d2) = b.scaled_derived();
                let product = d1
                    .multiply(&d2)
                    .ok_or_else(|| UnitError::ExponentOverflow(format!("{a}.{b}")))?;
                Unit::from_scaled_derived(a1 * a2, product)
            }
        }
    }

    pub fn divide(&self, other: &Unit) -> Result<Unit> {
        match (self, other) {
            (Unit::Promiscuous, u) | (u, Unit::Promiscuous) => Ok(u.clone()),
            (a, b) if b.is_logarithmic() => Err(UnitError::Logarithmic(format!(
                "can't divide \"{a}\" by \"{b}\""
            ))),
            (log, k) if log.is_logarithmic() => match k.numeric_factor() {
                Some(amount) => log.scale(1.0 / amount),
                None => Err(UnitError::NotDimensionless(k.to_string())),
            },
            (a, b) => {
                let (a1, d1) = a.scaled_derived();
                let (a2, d2) = b.scaled_derived();
                let quotient = d1
                    .divide(&d2)
                    .ok_or_else(|| UnitError::ExponentOverflow(format!("{a}/{b}")))?;
                Unit::from_scaled_derived(a1 / a2, quotient)
            }
        }
    }

    /// Raise to an integer power. Offsets are discarded.
    pub fn pow(&self, power: i32) -> Result<Unit> {
        match self {
            Unit::Promiscuous => Ok(Unit::Promiscuous),
            Unit::Base(b) => DerivedUnit::from_base(Arc::clone(b))
                .pow(power)
                .map(Unit::Derived)
                .ok_or_else(|| UnitError::ExponentOverflow(format!("{self}^{power}"))),
            Unit::Derived(d) if power == 1 => Ok(Unit::Derived(d.clone())),
            Unit::Derived(d) => d
                .pow(power)
                .map(Unit::Derived)
                .ok_or_else(|| UnitError::ExponentOverflow(format!("{self}^{power}"))),
            Unit::Scaled(s) => s.under.pow(power)?.scale(s.amount.powi(power)),
            Unit::Offset(o) => o.under.pow(power),
            Unit::Logarithmic(_) => match power {
                0 => Ok(Unit::one()),
                1 => Ok(self.clone()),
                _ => Err(UnitError::Logarithmic(format!(
                    "invalid power {power} of \"{self}\""
                ))),
            },
        }
    }

    /// Raise to a real power that is an integer or the reciprocal of one.
    pub fn pow_f64(&self, power: f64) -> Result<Unit> {
        if power == 0.0 {
            return self.pow(0);
        }
        if matches!(self, Unit::Derived(d) if d.factors().is_empty()) {
            return Ok(self.clone());
        }
        if power.abs() > 1.0 {
            match nearly_integral(power) {
                Some(p) => self.pow(p),
                None => Err(UnitError::NonIntegralPower {
                    unit: self.to_string(),
                    power,
                }),
            }
        } else {
            match nearly_integral(1.0 / power) {
                Some(r) => self.root(r),
                None => Err(UnitError::NonIntegralPower {
                    unit: self.to_string(),
                    power,
                }),
            }
        }
    }

    /// N-th root. Every exponent must be divisible by `root`.
    pub fn root(&self, root: i32) -> Result<Unit> {
        if root == 0 {
            return Err(UnitError::ZeroRoot(self.to_string()));
        }
        match self {
            Unit::Promiscuous => Ok(Unit::Promiscuous),
            Unit::Base(_) | Unit::Derived(_) if root == 1 => Ok(self.clone()),
            Unit::Base(_) | Unit::Derived(_) => self
                .derived_unit()
                .root(root)
                .map(Unit::Derived)
                .ok_or_else(|| UnitError::NonIntegralRoot {
                    unit: self.to_string(),
                    root,
                }),
            Unit::Scaled(s) => s.under.root(root)?.scale(s.amount.powf(1.0 / f64::from(root))),
            Unit::Offset(o) => o.under.root(root),
            Unit::Logarithmic(_) if root == 1 => Ok(self.clone()),
            Unit::Logarithmic(_) => Err(UnitError::Logarithmic(format!(
                "invalid root {root} of \"{self}\""
            ))),
        }
    }

    pub fn sqrt(&self) -> Result<Unit> {
        self.root(2)
    }

    // ---------------------------------------------------------------
    // Canonical values
    // ---------------------------------------------------------------

    /// Express a value in this unit in terms of its derived (SI) unit.
    pub fn to_derived_value(&self, x: f64) -> f64 {
        match self {
            Unit::Base(_) | Unit::Derived(_) | Unit::Promiscuous => x,
            Unit::Scaled(s) => s.under.to_derived_value(x * s.amount),
            Unit::Offset(o) => o.under.to_derived_value(x + o.offset),
            Unit::Logarithmic(l) => l.reference.to_derived_value((x * l.base.ln()).exp()),
        }
    }

    /// Inverse of [`Unit::to_derived_value`].
    pub fn from_derived_value(&self, y: f64) -> f64 {
        match self {
            Unit::Base(_) | Unit::Derived(_) | Unit::Promiscuous => y,
            Unit::Scaled(s) => s.under.from_derived_value(y) / s.amount,
            Unit::Offset(o) => o.under.from_derived_value(y) - o.offset,
            Unit::Logarithmic(l) => l.reference.from_derived_value(y).ln() / l.base.ln(),
        }
    }

    /// Whether this is a time unit (seconds to the first power).
    fn is_time(&self) -> bool {
        let derived = self.derived_unit();
        matches!(derived.factors(), [f] if f.power == 1 && f.base.quantity_name() == "Time")
    }

    /// Definition string ignoring any identifier, e.g. `"m.s-1"`.
    pub fn definition(&self) -> String {
        match self {
            Unit::Base(b) => b.symbol().to_string(),
            Unit::Derived(d) => d.to_string(),
            Unit::Scaled(s) => {
                let under = s.under.to_string();
                if under.is_empty() {
                    format!("{}", s.amount)
                } else {
                    format!("{} {}", s.amount, under)
                }
            }
            Unit::Offset(o) => {
                let mut under = o.under.to_string();
                if under.contains(' ') {
                    under = format!("({under})");
                }
                if o.under.is_time() {
                    let millis = o.under.to_derived_value(o.offset) * 1000.0;
                    match DateTime::from_timestamp_millis(TIME_ORIGIN_MILLIS + millis as i64) {
                        Some(t) => format!(
                            "{under} since {}",
                            t.format("%Y-%m-%d %H:%M:%S%.3f UTC")
                        ),
                        None => format!("{under} @ {}", o.offset),
                    }
                } else {
                    format!("{under} @ {}", o.offset)
                }
            }
            Unit::Logarithmic(l) => {
                let prefix = if l.base == 2.0 {
                    "lb"
                } else if l.base == E {
                    "ln"
                } else {
                    "lg"
                };
                format!("{prefix}(re {})", l.reference)
            }
            Unit::Promiscuous => "UniversalUnit".to_string(),
        }
    }
}

/// `Some(n)` if `x` is within one unit in the last place of integer `n`.
fn nearly_integral(x: f64) -> Option<i32> {
    let n = x.round();
    if !n.is_finite() || n.abs() > f64::from(i32::MAX) {
        return None;
    }
    ((x - n).abs() <= f64::EPSILON * n.abs().max(1.0)).then_some(n as i32)
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Unit::Base(a), Unit::Base(b)) => a == b,
            (Unit::Base(b), Unit::Derived(d)) | (Unit::Derived(d), Unit::Base(b)) => {
                d.as_base().is_some_and(|base| base == b)
            }
            (Unit::Derived(a), Unit::Derived(b)) => a == b,
            (Unit::Scaled(a), Unit::Scaled(b)) => a.amount == b.amount && a.under == b.under,
            (Unit::Offset(a), Unit::Offset(b)) => a.offset == b.offset && a.under == b.under,
            (Unit::Logarithmic(a), Unit::Logarithmic(b)) => {
                a.base == b.base && a.reference == b.reference
            }
            (Unit::Promiscuous, Unit::Promiscuous) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identifier() {
            Some(id) => f.write_str(id),
            None => f.write_str(&self.definition()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitRegistry;
    use approx::assert_relative_eq;

    fn base(registry: &UnitRegistry, quantity: &str) -> Unit {
        Unit::from(registry.quantity_to_unit(quantity).unwrap())
    }

    #[test]
    fn test_scale_collapses() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        assert_eq!(m.scale(1.0).unwrap(), m);
        assert!(matches!(m.scale(1.0).unwrap(), Unit::Base(_)));
        assert_eq!(m.scale(0.0), Err(UnitError::ZeroScale));

        let km = m.scale(1000.0).unwrap();
        let mm = m.scale(0.001).unwrap();
        assert_eq!(km.scale(0.001).unwrap().scale(1.0).unwrap(), km.scale(0.001).unwrap());
        assert_eq!(mm.scale(1000.0).unwrap(), m);
    }

    #[test]
    fn test_shift_collapses() {
        let si = UnitRegistry::with_si();
        let k = base(&si, "Temperature");
        assert_eq!(k.shift(0.0).unwrap(), k);
        let c = k.shift(273.15).unwrap();
        let back = c.shift(-273.15).unwrap();
        assert_eq!(back, k);
        match k.shift(100.0).unwrap().shift(173.15).unwrap() {
            Unit::Offset(o) => assert_relative_eq!(o.offset(), 273.15),
            other => panic!("expected offset unit, got {other:?}"),
        }
    }

    #[test]
    fn test_scale_of_offset() {
        let si = UnitRegistry::with_si();
        let k = base(&si, "Temperature");
        // degree Fahrenheit as a scaled-then-shifted kelvin
        let rankine = k.scale(5.0 / 9.0).unwrap();
        let fahrenheit = rankine.shift(459.67).unwrap();
        assert_relative_eq!(fahrenheit.to_derived_value(32.0), 273.15, epsilon = 1e-9);

        // scaling an offset unit keeps the same physical origin
        let half_f = fahrenheit.scale(2.0).unwrap();
        assert_relative_eq!(half_f.to_derived_value(16.0), 273.15, epsilon = 1e-9);
    }

    #[test]
    fn test_multiply_and_divide() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        let s = base(&si, "Time");
        let speed = m.divide(&s).unwrap();
        assert_eq!(speed.to_string(), "m.s-1");
        assert_eq!(speed.multiply(&s).unwrap(), m);

        let mph = m.scale(1609.344).unwrap().divide(&s.scale(3600.0).unwrap()).unwrap();
        assert!(mph.is_convertible(&speed));
        assert_relative_eq!(mph.to_derived_value(1.0), 0.44704, max_relative = 1e-12);
        assert_eq!(speed.scale(0.44704).unwrap().to_string(), "0.44704 m.s-1");
    }

    #[test]
    fn test_offset_stripped_by_multiply() {
        let si = UnitRegistry::with_si();
        let k = base(&si, "Temperature");
        let c = k.shift(273.15).unwrap();
        assert_eq!(c.multiply(&Unit::one()).unwrap(), k);
        assert_eq!(c.pow(2).unwrap(), k.pow(2).unwrap());
    }

    #[test]
    fn test_promiscuous() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        assert_eq!(Unit::Promiscuous.multiply(&m).unwrap(), m);
        assert_eq!(m.divide(&Unit::Promiscuous).unwrap(), m);
        assert!(m.is_convertible(&Unit::Promiscuous));
        assert!(!Unit::can_convert(Some(&m), Some(&Unit::Promiscuous)));
        assert!(Unit::can_convert(Some(&Unit::Promiscuous), None));
    }

    #[test]
    fn test_pow_and_root() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        let s = base(&si, "Time");
        let speed = m.divide(&s).unwrap();
        let speed2 = speed.pow(2).unwrap();
        assert_eq!(speed2.sqrt().unwrap(), speed);
        assert_eq!(speed2.pow_f64(0.5).unwrap(), speed);
        assert_eq!(speed.pow_f64(2.0 + f64::EPSILON).unwrap(), speed2);
        assert!(speed.pow_f64(2.5).is_err());
        assert!(matches!(speed.root(2), Err(UnitError::NonIntegralRoot { .. })));
        assert!(matches!(speed.root(0), Err(UnitError::ZeroRoot(_))));
        assert_eq!(m.pow(0).unwrap(), Unit::one());

        let km2 = m.scale(1000.0).unwrap().pow(2).unwrap();
        assert_relative_eq!(km2.to_derived_value(1.0), 1.0e6);
        assert_relative_eq!(km2.sqrt().unwrap().to_derived_value(1.0), 1000.0);
    }

    #[test]
    fn test_exponent_overflow() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        let huge = m.pow(i32::MAX).unwrap();
        assert!(matches!(huge.pow(2), Err(UnitError::ExponentOverflow(_))));
        assert!(matches!(huge.multiply(&m), Err(UnitError::ExponentOverflow(_))));
        assert!(matches!(
            huge.scale(2.0).unwrap().pow(3),
            Err(UnitError::ExponentOverflow(_))
        ));

        let tiny = m.pow(i32::MIN).unwrap();
        assert!(matches!(Unit::one().divide(&tiny), Err(UnitError::ExponentOverflow(_))));
        assert!(matches!(tiny.root(-1), Err(UnitError::NonIntegralRoot { .. })));
    }

    #[test]
    fn test_logarithmic_rules() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        let watt_like = m.pow(3).unwrap().scale(1e-18).unwrap();
        let bel = watt_like.log(10.0).unwrap();
        assert_eq!(bel.to_string(), format!("lg(re {watt_like})"));
        assert!(bel.is_dimensionless());

        assert!(matches!(m.log(3.0), Err(UnitError::InvalidLogBase(_))));
        assert!(bel.log(10.0).is_err());
        assert!(bel.multiply(&bel).is_err());
        assert!(bel.multiply(&m).is_err());
        assert!(m.divide(&bel).is_err());
        assert!(bel.pow(2).is_err());
        assert_eq!(bel.pow(0).unwrap(), Unit::one());
        assert_eq!(bel.multiply(&Unit::one()).unwrap(), bel);

        let decibel = bel.multiply(&Unit::one().scale(0.1).unwrap()).unwrap();
        assert_relative_eq!(
            decibel.to_derived_value(10.0),
            bel.to_derived_value(1.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_equality_ignores_identifier() {
        let si = UnitRegistry::with_si();
        let m = base(&si, "Length");
        let km = m.scale(1000.0).unwrap();
        let named = km.with_identifier("km").unwrap();
        assert_eq!(named.to_string(), "km");
        assert_eq!(named, km);
        assert_eq!(m.with_identifier("metre"), Err(UnitError::BaseIdentifier));
        assert_eq!(m.pow(1).unwrap(), m);
    }

    #[test]
    fn test_time_offset_display() {
        let si = UnitRegistry::with_si();
        let s = base(&si, "Time");
        let epoch = s.shift(86_400.0).unwrap();
        assert_eq!(epoch.to_string(), "s since 2001-01-02 00:00:00.000 UTC");

        let k = base(&si, "Temperature");
        assert_eq!(k.shift(273.15).unwrap().to_string(), "K @ 273.15");
    }
}
