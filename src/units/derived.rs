//! Products of base units raised to integer powers.

use std::fmt;
use std::sync::Arc;

use super::registry::BaseUnit;

/// A base unit raised to a non-zero integer power.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    pub base: Arc<BaseUnit>,
    pub power: i32,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.power == 1 {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}{}", self.base, self.power)
        }
    }
}

/// Canonical dimensional form of every unit: `Π base_i ^ power_i`.
///
/// Factors are kept sorted by base unit name with zero powers removed,
/// so structural equality is exponent-vector equality. The optional
/// identifier only affects printing.
#[derive(Debug, Clone, Default)]
pub struct DerivedUnit {
    factors: Vec<Factor>,
    identifier: Option<String>,
}

impl PartialEq for DerivedUnit {
    fn eq(&self, other: &Self) -> bool {
        self.factors == other.factors
    }
}

impl Eq for DerivedUnit {}

impl DerivedUnit {
    /// The dimensionless unit "one".
    pub fn one() -> Self {
        Self::default()
    }

    pub fn from_base(base: Arc<BaseUnit>) -> Self {
        Self {
            factors: vec![Factor { base, power: 1 }],
            identifier: None,
        }
    }

    /// Build from arbitrary factors, merging duplicates.
    ///
    /// Returns `None` if a merged exponent overflows `i32`.
    pub fn from_factors(factors: impl IntoIterator<Item = (Arc<BaseUnit>, i32)>) -> Option<Self> {
        let mut out = Self::one();
        for (base, power) in factors {
            out.accumulate(&base, power)?;
        }
        Some(out)
    }

    fn accumulate(&mut self, base: &Arc<BaseUnit>, power: i32) -> Option<()> {
        if power == 0 {
            return Some(());
        }
        match self
            .factors
            .binary_search_by(|f| factor_key(&f.base).cmp(&factor_key(base)))
        {
            Ok(i) => {
                self.factors[i].power = self.factors[i].power.checked_add(power)?;
                if self.factors[i].power == 0 {
                    self.factors.remove(i);
                }
            }
            Err(i) => self.factors.insert(
                i,
                Factor {
                    base: Arc::clone(base),
                    power,
                },
            ),
        }
        Some(())
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub(crate) fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Exactly one base unit to the first power.
    pub fn as_base(&self) -> Option<&Arc<BaseUnit>> {
        match self.factors.as_slice() {
            [f] if f.power == 1 => Some(&f.base),
            _ => None,
        }
    }

    /// True when every remaining factor is a dimensionless base unit.
    pub fn is_dimensionless(&self) -> bool {
        self.factors.iter().all(|f| f.base.is_dimensionless())
    }

    /// Whether both units have the same exponents for every dimensional base.
    pub fn same_dimensionality(&self, other: &DerivedUnit) -> bool {
        let mut a = self.factors.iter().filter(|f| !f.base.is_dimensionless());
        let mut b = other.factors.iter().filter(|f| !f.base.is_dimensionless());
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => {}
                _ => return false,
            }
        }
    }

    /// Product of two units, or `None` on exponent overflow.
    pub fn multiply(&self, other: &DerivedUnit) -> Option<DerivedUnit> {
        let mut out = self.anonymous();
        for f in &other.factors {
            out.accumulate(&f.base, f.power)?;
        }
        Some(out)
    }

    /// Quotient of two units, or `None` on exponent overflow.
    pub fn divide(&self, other: &DerivedUnit) -> Option<DerivedUnit> {
        let mut out = self.anonymous();
        for f in &other.factors {
            out.accumulate(&f.base, f.power.checked_neg()?)?;
        }
        Some(out)
    }

    fn anonymous(&self) -> DerivedUnit {
        Self {
            factors: self.factors.clone(),
            identifier: None,
        }
    }

    /// Integer power, or `None` if an exponent overflows `i32`.
    pub fn pow(&self, power: i32) -> Option<DerivedUnit> {
        if power == 0 {
            return Some(Self::one());
        }
        let factors = self
            .factors
            .iter()
            .map(|f| {
                Some(Factor {
                    base: Arc::clone(&f.base),
                    power: f.power.checked_mul(power)?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            identifier: None,
            factors,
        })
    }

    /// N-th root, or `None` if some exponent is not divisible by `root`
    /// (or `root` is zero, or the quotient overflows).
    pub(crate) fn root(&self, root: i32) -> Option<DerivedUnit> {
        if root == 0 {
            return None;
        }
        let factors = self
            .factors
            .iter()
            .map(|f| match f.power.checked_rem(root)? {
                0 => Some(Factor {
                    base: Arc::clone(&f.base),
                    power: f.power.checked_div(root)?,
                }),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            identifier: None,
            factors,
        })
    }
}

fn factor_key(base: &BaseUnit) -> (&str, &str) {
    (base.unit_name(), base.quantity_name())
}

impl fmt::Display for DerivedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{factor}")?;
        }
        Ok(())
    }
}
