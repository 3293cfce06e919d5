//! Base units and the registry that owns them.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::{Result, UnitError};

/// An atomic, named physical unit such as the meter or the second.
///
/// Base units are only created through [`UnitRegistry::add_base_unit`],
/// which guarantees at most one base unit per quantity.
#[derive(Debug, Clone)]
pub struct BaseUnit {
    quantity_name: String,
    unit_name: String,
    abbreviation: Option<String>,
    dimensionless: bool,
}

impl BaseUnit {
    /// Name of the physical quantity, e.g. `"Length"`.
    pub fn quantity_name(&self) -> &str {
        &self.quantity_name
    }

    /// Full unit name, e.g. `"meter"`.
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.abbreviation.as_deref()
    }

    /// Whether the quantity is dimensionless (e.g. plane angle).
    ///
    /// Dimensionless base units do not take part in convertibility checks.
    pub fn is_dimensionless(&self) -> bool {
        self.dimensionless
    }

    /// Symbol used when printing unit definitions.
    pub fn symbol(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.unit_name)
    }

    fn same_parameters(&self, unit_name: &str, abbrev: Option<&str>, dimless: bool) -> bool {
        self.unit_name == unit_name
            && self.abbreviation.as_deref() == abbrev
            && self.dimensionless == dimless
    }
}

impl PartialEq for BaseUnit {
    fn eq(&self, other: &Self) -> bool {
        self.quantity_name == other.quantity_name
            && self.unit_name == other.unit_name
            && self.dimensionless == other.dimensionless
    }
}

impl Eq for BaseUnit {}

impl fmt::Display for BaseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Table of base units keyed by quantity name.
///
/// A registry is an ordinary value: create one per unit system and pass
/// it to whatever needs to look up or define base units. All methods take
/// `&self`; the table is guarded by a mutex so a registry can be shared
/// through an `Arc` across threads.
///
/// # Example
///
/// ```
/// use unitgrid::units::UnitRegistry;
///
/// let registry = UnitRegistry::new();
/// let m1 = registry.add_base_unit("Length", "meter", Some("m"), false).unwrap();
/// let m2 = registry.add_base_unit("Length", "meter", Some("m"), false).unwrap();
/// assert_eq!(m1, m2);
///
/// // A different unit for an existing quantity is rejected
/// assert!(registry.add_base_unit("Length", "foot", Some("ft"), false).is_err());
/// ```
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Mutex<Vec<Arc<BaseUnit>>>,
}

impl UnitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the SI base units and the radian.
    pub fn with_si() -> Self {
        let registry = Self::new();
        {
            let mut units = registry.lock();
            for (quantity, name, abbrev, dimless) in SI_BASE_UNITS {
                units.push(Arc::new(BaseUnit {
                    quantity_name: quantity.to_string(),
                    unit_name: name.to_string(),
                    abbreviation: Some(abbrev.to_string()),
                    dimensionless: *dimless,
                }));
            }
        }
        registry
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<BaseUnit>>> {
        // The table is append-only, so a poisoned lock still holds valid data
        self.units.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a base unit for `quantity_name`.
    ///
    /// Re-registering with identical parameters returns the existing unit.
    ///
    /// # Errors
    ///
    /// - [`UnitError::EmptyName`] if the quantity or unit name is empty.
    /// - [`UnitError::Redefinition`] if the quantity already has a base unit
    ///   with different parameters.
    pub fn add_base_unit(
        &self,
        quantity_name: &str,
        unit_name: &str,
        abbreviation: Option<&str>,
        dimensionless: bool,
    ) -> Result<Arc<BaseUnit>> {
        if quantity_name.is_empty() {
            return Err(UnitError::EmptyName("quantity name"));
        }
        if unit_name.is_empty() {
            return Err(UnitError::EmptyName("unit name"));
        }
        if abbreviation.is_some_and(str::is_empty) {
            return Err(UnitError::EmptyName("abbreviation"));
        }

        let mut units = self.lock();
        if let Some(existing) = units.iter().find(|u| u.quantity_name == quantity_name) {
            if existing.same_parameters(unit_name, abbreviation, dimensionless) {
                return Ok(Arc::clone(existing));
            }
            return Err(UnitError::Redefinition {
                quantity: quantity_name.to_string(),
                existing: existing.unit_name.clone(),
            });
        }

        let unit = Arc::new(BaseUnit {
            quantity_name: quantity_name.to_string(),
            unit_name: unit_name.to_string(),
            abbreviation: abbreviation.map(str::to_string),
            dimensionless,
        });
        units.push(Arc::clone(&unit));
        tracing::debug!(quantity = quantity_name, unit = unit_name, dimensionless, "registered base unit");
        Ok(unit)
    }

    /// Base unit registered for a quantity.
    pub fn quantity_to_unit(&self, quantity_name: &str) -> Option<Arc<BaseUnit>> {
        self.lock()
            .iter()
            .find(|u| u.quantity_name == quantity_name)
            .cloned()
    }

    /// Base unit with the given name or abbreviation.
    pub fn unit_name_to_unit(&self, name: &str) -> Option<Arc<BaseUnit>> {
        self.lock()
            .iter()
            .find(|u| u.unit_name == name || u.abbreviation.as_deref() == Some(name))
            .cloned()
    }

    /// Snapshot of all registered base units in registration order.
    pub fn base_units(&self) -> Vec<Arc<BaseUnit>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

const SI_BASE_UNITS: &[(&str, &str, &str, bool)] = &[
    ("ElectricCurrent", "ampere", "A", false),
    ("LuminousIntensity", "candela", "cd", false),
    ("Temperature", "kelvin", "K", false),
    ("Mass", "kilogram", "kg", false),
    ("Length", "meter", "m", false),
    ("Time", "second", "s", false),
    ("AmountOfSubstance", "mole", "mol", false),
    ("Angle", "radian", "rad", true),
];
