//! Regular latitude/longitude grids with longitude wraparound.

use std::f64::consts::PI;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, Interpolation, check_interpolable};
use super::linear_1d::Linear1DSet;
use super::linear_nd::LinearNDSet;
use super::set::{Set, SetCore, SetOptions, point_count};
use crate::units::{Unit, UnitError};

/// Which component of a lat/lon set holds latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatLonOrder {
    /// `(latitude, longitude)`
    #[default]
    LatLon,
    /// `(longitude, latitude)`
    LonLat,
}

impl LatLonOrder {
    pub(crate) fn lat_index(self) -> usize {
        match self {
            LatLonOrder::LatLon => 0,
            LatLonOrder::LonLat => 1,
        }
    }

    pub(crate) fn lon_index(self) -> usize {
        1 - self.lat_index()
    }
}

/// Double the candidate lists along one axis, splitting each weight into
/// `a` for the existing index and `b` for the neighbor.
fn split(indices: &mut Vec<usize>, weights: &mut Vec<f32>, up: bool, off: usize, a: f32, b: f32) {
    for k in 0..indices.len() {
        indices.push(if up { indices[k] + off } else { indices[k] - off });
        weights.push(weights[k] * b);
        weights[k] *= a;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Wrap {
    /// Longitude gap between the last sample and the first one a full
    /// circle later.
    step: f64,
    /// Grid step over gap step; rescales grid coordinates in the gap.
    factor: f64,
}

/// A cross product of a latitude and a longitude progression.
///
/// When the longitudes (nearly) circle the globe, values in the gap
/// between the last and first longitude interpolate across the seam
/// instead of falling off the grid. Angles are in degrees unless the set
/// carries dimensionless angle units.
///
/// # Example
///
/// ```
/// use unitgrid::sets::{GriddedSet, LatLonOrder, LinearLatLonSet};
///
/// let set = LinearLatLonSet::new(LatLonOrder::LatLon, [-90.0, 0.0], [90.0, 350.0], [19, 36]).unwrap();
/// assert!(set.longitude_wrap());
/// let interp = set.value_to_interp(&[vec![90.0], vec![356.0]]).unwrap();
/// assert_eq!(interp[0].as_ref().unwrap().indices.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LinearLatLonSet {
    grid: LinearNDSet,
    order: LatLonOrder,
    half_pi_lat: f64,
    two_pi_lon: f64,
    wrap: Option<Wrap>,
}

/// `angle` radians expressed in `unit`, or in degrees without a unit.
fn angle_in(unit: Option<&Unit>, angle: f64) -> Result<f64> {
    match unit {
        None => Ok(angle.to_degrees()),
        Some(u) if u.is_dimensionless() => Ok(u.from_derived_value(angle)),
        Some(u) => Err(UnitError::NotDimensionless(u.to_string()).into()),
    }
}

impl LinearLatLonSet {
    /// Build from end points and lengths given in component order.
    pub fn new(order: LatLonOrder, firsts: [f64; 2], lasts: [f64; 2], lengths: [usize; 2]) -> Result<Self> {
        Self::with_options(order, firsts, lasts, lengths, SetOptions::default())
    }

    pub fn with_options(
        order: LatLonOrder,
        firsts: [f64; 2],
        lasts: [f64; 2],
        lengths: [usize; 2],
        options: SetOptions,
    ) -> Result<Self> {
        let grid = LinearNDSet::with_options(&firsts, &lasts, &lengths, options)?;
        Self::from_grid(order, grid)
    }

    /// Wrap an existing pair of progressions given in component order.
    pub fn from_axes(order: LatLonOrder, axes: [Linear1DSet; 2], options: SetOptions) -> Result<Self> {
        let grid = LinearNDSet::from_axes(axes.into(), options)?;
        Self::from_grid(order, grid)
    }

    fn from_grid(order: LatLonOrder, grid: LinearNDSet) -> Result<Self> {
        let (lat_i, lon_i) = (order.lat_index(), order.lon_index());
        let units = grid.units();
        let half_pi_lat = angle_in(units[lat_i].as_ref(), 0.5 * PI)?;
        let two_pi_lon = angle_in(units[lon_i].as_ref(), 2.0 * PI)?;

        let (low, hi) = (grid.low(), grid.hi());
        let (low_lat, hi_lat) = (f64::from(low[lat_i]), f64::from(hi[lat_i]));
        let (low_lon, hi_lon) = (f64::from(low[lon_i]), f64::from(hi[lon_i]));
        // Longitudes may run up to a full circle past the positive
        // meridian so that ranges like [350, 370] are representable.
        if low_lat < -half_pi_lat
            || hi_lat > half_pi_lat
            || low_lon < -two_pi_lon
            || hi_lon > 2.0 * two_pi_lon
            || hi_lon - low_lon > two_pi_lon
        {
            return Err(SetError::OutOfBounds(format!(
                "LinearLatLonSet latitude [{low_lat}, {hi_lat}] or longitude [{low_lon}, {hi_lon}]"
            )));
        }

        let lon = grid.axis(lon_i).ok_or(SetError::DimensionMismatch {
            context: "LinearLatLonSet",
            expected: 2,
            found: lon_i,
        })?;
        let mut wraps = lon.len() > 1 && (hi_lon - low_lon) + 2.0 * lon.step().abs() >= two_pi_lon;
        if lon.len() > 1 && lon.first() > 0.0 && lon.last() < 0.0 {
            wraps = true;
        }
        let wrap = wraps.then(|| {
            let step = two_pi_lon - (hi_lon - low_lon);
            Wrap {
                step,
                factor: lon.step().abs() / step,
            }
        });
        if wrap.is_some() {
            tracing::debug!(low_lon, hi_lon, "longitude wraparound enabled");
        }

        Ok(Self {
            grid,
            order,
            half_pi_lat,
            two_pi_lon,
            wrap,
        })
    }

    pub fn order(&self) -> LatLonOrder {
        self.order
    }

    /// Whether values between the last and first longitude interpolate
    /// across the seam.
    pub fn longitude_wrap(&self) -> bool {
        self.wrap.is_some()
    }

    /// Half a circle of latitude in the set's latitude unit.
    pub fn half_pi_lat(&self) -> f64 {
        self.half_pi_lat
    }

    /// A full circle of longitude in the set's longitude unit.
    pub fn two_pi_lon(&self) -> f64 {
        self.two_pi_lon
    }

    fn lat(&self) -> &Linear1DSet {
        &self.grid.axes()[self.order.lat_index()]
    }

    fn lon(&self) -> &Linear1DSet {
        &self.grid.axes()[self.order.lon_index()]
    }

    fn check(&self, context: &'static str, arrays: &[Vec<f32>]) -> Result<usize> {
        let n = point_count(context, 2, arrays)?;
        check_interpolable(context, self.grid.lengths())?;
        Ok(n)
    }

    fn lon_to_grid(&self, values: &[f32]) -> Vec<f32> {
        let lon = self.lon();
        let (first, step) = (lon.first(), lon.step());
        let len = lon.len() as f64;
        let mut l = first - 0.5 * step;
        let mut h = first + (len - 0.5) * step;
        if h < l {
            std::mem::swap(&mut l, &mut h);
        }
        if let Some(wrap) = self.wrap {
            l = l + 0.5 * step.abs() - 0.5 * wrap.step;
            h = l + self.two_pi_lon;
        }

        values
            .iter()
            .map(|&value| {
                let mut v = f64::from(value) % self.two_pi_lon;
                if v <= l {
                    v += self.two_pi_lon;
                } else if h <= v {
                    v -= self.two_pi_lon;
                }
                let mut g = if l < v && v < h {
                    (v - first) * lon.invstep()
                } else {
                    f64::NAN
                };
                if let Some(wrap) = self.wrap {
                    let last = len - 1.0;
                    if g > last {
                        g = last + (g - last) * wrap.factor;
                        if g > len - 0.5 {
                            g -= len;
                        }
                    } else if g < 0.0 {
                        g *= wrap.factor;
                        if g < -0.5 {
                            g += len;
                        }
                    }
                }
                g as f32
            })
            .collect()
    }

    fn grid_to_lon(&self, grid: &[f32]) -> Vec<f32> {
        let lon = self.lon();
        let adjusted: Vec<f64> = match self.wrap {
            None => grid.iter().map(|&g| f64::from(g)).collect(),
            Some(wrap) => {
                let len = lon.len() as f64;
                let last = len - 1.0;
                grid.iter()
                    .map(|&g| {
                        let mut g = f64::from(g);
                        if g > last {
                            g = last + (g - last) / wrap.factor;
                            if g > len - 0.5 {
                                g -= len;
                            }
                        } else if g < 0.0 {
                            g /= wrap.factor;
                            if g < -0.5 {
                                g += len;
                            }
                        }
                        g
                    })
                    .collect()
            }
        };
        lon.grid_to_double_1d(&adjusted).into_iter().map(|v| v as f32).collect()
    }
}

impl Set for LinearLatLonSet {
    fn core(&self) -> &SetCore {
        self.grid.core()
    }

    fn low(&self) -> &[f32] {
        self.grid.low()
    }

    fn hi(&self) -> &[f32] {
        self.grid.hi()
    }

    fn hash_code(&self) -> u64 {
        self.grid.hash_code()
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        self.grid.index_to_value(index)
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        point_count("LinearLatLonSet value_to_index", 2, value)?;
        let grid = self.value_to_grid(value)?;
        Ok(super::gridded::grid_to_index(&grid, self.grid.lengths()))
    }
}

impl GriddedSet for LinearLatLonSet {
    fn lengths(&self) -> &[usize] {
        self.grid.lengths()
    }

    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.check("LinearLatLonSet grid_to_value", grid)?;
        let (lat_i, lon_i) = (self.order.lat_index(), self.order.lon_index());
        let lat: Vec<f64> = grid[lat_i].iter().map(|&g| f64::from(g)).collect();
        let mut value = vec![Vec::new(), Vec::new()];
        value[lat_i] = self.lat().grid_to_double_1d(&lat).into_iter().map(|v| v as f32).collect();
        value[lon_i] = self.grid_to_lon(&grid[lon_i]);
        Ok(value)
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        self.check("LinearLatLonSet value_to_grid", value)?;
        let (lat_i, lon_i) = (self.order.lat_index(), self.order.lon_index());
        let lat: Vec<f64> = value[lat_i].iter().map(|&v| f64::from(v)).collect();
        let mut grid = vec![Vec::new(), Vec::new()];
        grid[lat_i] = self.lat().double_to_grid_1d(&lat).into_iter().map(|g| g as f32).collect();
        grid[lon_i] = self.lon_to_grid(&value[lon_i]);
        Ok(grid)
    }

    /// Bilinear weights, with longitude neighbors taken across the seam
    /// when the set wraps.
    fn value_to_interp(&self, value: &[Vec<f32>]) -> Result<Vec<Option<Interpolation>>> {
        let grid = self.value_to_grid(value)?;
        let lengths = self.grid.lengths();
        let (lat_i, lon_i) = (self.order.lat_index(), self.order.lon_index());
        let offsets = [1, lengths[0]];
        let at_edge = |axis: usize, l: usize, c: f32| (l == 0 && c <= 0.0) || (l + 1 == lengths[axis] && c >= 0.0);

        Ok((0..grid[0].len())
            .map(|i| {
                let (g_lon, g_lat) = (grid[lon_i][i], grid[lat_i][i]);
                if g_lon.is_nan() || g_lat.is_nan() || g_lon + 0.5 < 0.0 || g_lat + 0.5 < 0.0 {
                    return None;
                }
                let l_lon = (g_lon + 0.5) as usize;
                let c_lon = g_lon - l_lon as f32;
                let l_lat = (g_lat + 0.5) as usize;
                let c_lat = g_lat - l_lat as f32;
                if l_lon >= lengths[lon_i] || l_lat >= lengths[lat_i] {
                    return None;
                }
                let lon_edge = at_edge(lon_i, l_lon, c_lon);
                let wrap_this = lon_edge && self.wrap.is_some();

                let mut indices = vec![offsets[lat_i] * l_lat + offsets[lon_i] * l_lon];
                let mut weights = vec![1.0_f32];

                if !at_edge(lat_i, l_lat, c_lat) {
                    if c_lat >= 0.0 {
                        split(&mut indices, &mut weights, true, offsets[lat_i], 1.0 - c_lat, c_lat);
                    } else {
                        split(&mut indices, &mut weights, false, offsets[lat_i], 1.0 + c_lat, -c_lat);
                    }
                }
                if wrap_this || !lon_edge {
                    let seam = offsets[lon_i] * (lengths[lon_i] - 1);
                    if wrap_this && l_lon == 0 {
                        split(&mut indices, &mut weights, true, seam, 1.0 + c_lon, -c_lon);
                    } else if wrap_this && l_lon + 1 == lengths[lon_i] {
                        split(&mut indices, &mut weights, false, seam, 1.0 - c_lon, c_lon);
                    } else if c_lon >= 0.0 {
                        split(&mut indices, &mut weights, true, offsets[lon_i], 1.0 - c_lon, c_lon);
                    } else {
                        split(&mut indices, &mut weights, false, offsets[lon_i], 1.0 + c_lon, -c_lon);
                    }
                }
                Some(Interpolation { indices, weights })
            })
            .collect())
    }
}

impl PartialEq for LinearLatLonSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.grid == other.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitRegistry;
    use approx::assert_relative_eq;

    fn global() -> LinearLatLonSet {
        LinearLatLonSet::new(LatLonOrder::LatLon, [-90.0, 0.0], [90.0, 357.5], [73, 144]).unwrap()
    }

    #[test]
    fn test_wrap_detection() {
        assert!(global().longitude_wrap());
        let regional = LinearLatLonSet::new(LatLonOrder::LatLon, [0.0, 10.0], [10.0, 20.0], [11, 11]).unwrap();
        assert!(!regional.longitude_wrap());
        let across = LinearLatLonSet::new(LatLonOrder::LonLat, [170.0, 0.0], [-170.0, 10.0], [3, 11]).unwrap();
        assert!(across.longitude_wrap());
    }

    #[test]
    fn test_out_of_bounds() {
        let err = LinearLatLonSet::new(LatLonOrder::LatLon, [-100.0, 0.0], [90.0, 10.0], [3, 3]).unwrap_err();
        assert!(matches!(err, SetError::OutOfBounds(_)));
        assert!(LinearLatLonSet::new(LatLonOrder::LatLon, [0.0, -10.0], [10.0, 400.0], [3, 3]).is_err());
    }

    #[test]
    fn test_seam_grid_coordinates() {
        let set = global();
        let g = set.value_to_grid(&[vec![0.0, 0.0, 0.0], vec![359.0, -1.0, 720.5]]).unwrap();
        assert_relative_eq!(g[0][0], 36.0);
        assert_relative_eq!(g[1][0], -0.4, epsilon = 1e-5);
        assert_relative_eq!(g[1][1], -0.4, epsilon = 1e-5);
        assert_relative_eq!(g[1][2], 0.2, epsilon = 1e-5);

        let v = set.grid_to_value(&[vec![36.0], vec![-0.4]]).unwrap();
        assert_relative_eq!(v[1][0], -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_interp_across_seam() {
        let set = global();
        // at the pole row no latitude split happens
        let interp = set.value_to_interp(&[vec![90.0], vec![359.0]]).unwrap();
        let interp = interp[0].as_ref().unwrap();
        let row = 72;
        assert_eq!(interp.indices, vec![row, row + 143 * 73]);
        assert_relative_eq!(interp.weights[0], 0.6, epsilon = 1e-5);
        assert_relative_eq!(interp.weights[1], 0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_radian_units() {
        let si = UnitRegistry::with_si();
        let rad = Unit::from(si.quantity_to_unit("Angle").unwrap());
        let options = SetOptions::default().with_units(vec![Some(rad.clone()), Some(rad)]);
        let set = LinearLatLonSet::with_options(LatLonOrder::LatLon, [-1.0, 0.0], [1.0, 6.0], [3, 13], options).unwrap();
        assert_relative_eq!(set.two_pi_lon(), 2.0 * PI);
        assert!(set.longitude_wrap());

        let m = Unit::from(si.quantity_to_unit("Length").unwrap());
        let options = SetOptions::default().with_units(vec![Some(m), None]);
        let err = LinearLatLonSet::with_options(LatLonOrder::LatLon, [0.0, 0.0], [1.0, 1.0], [2, 2], options).unwrap_err();
        assert!(matches!(err, SetError::Unit(UnitError::NotDimensionless(_))));
    }
}
