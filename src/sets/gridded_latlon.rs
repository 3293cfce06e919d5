//! Curvilinear latitude/longitude grids such as satellite swaths.
//!
//! The inverse search is a greedy hill climb on great-circle distance over
//! the 8-connected neighborhood of a grid point, followed by a
//! point-in-triangle test on the unit sphere and linear reverse
//! interpolation inside the matching triangle.

use std::sync::Mutex;

use super::error::{Result, SetError};
use super::gridded::{GriddedSet, check_interpolable, grid_to_index};
use super::gridded_2d::Gridded2DSet;
use super::linear_latlon::LatLonOrder;
use super::set::{Set, SetCore, SetOptions, point_count};

/// Accumulated great-circle angle along the track, in degrees, beyond
/// which the grid is searched as two separate halves.
pub const GRANULE_SPLIT_DEGREES: f64 = 270.0;

/// Longitude span of a grid cell, in degrees, beyond which the cell is
/// assumed to straddle the dateline.
pub const DATELINE_SPAN_DEGREES: f32 = 300.0;

/// Hill-climb neighbor order: up, down, right, left, then the diagonals.
const NEIGHBORS: [(isize, isize); 8] = [(0, 1), (0, -1), (1, 0), (-1, 0), (-1, 1), (1, 1), (-1, -1), (1, -1)];

const CC: (isize, isize) = (0, 0);
const UU: (isize, isize) = (0, 1);
const DD: (isize, isize) = (0, -1);
const LL: (isize, isize) = (-1, 0);
const RR: (isize, isize) = (1, 0);
const UR: (isize, isize) = (1, 1);

/// Great-circle angle in radians between two points given in degrees.
pub fn great_circle_angle(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> f64 {
    let (lon_a, lat_a, lon_b, lat_b) = (
        lon_a.to_radians(),
        lat_a.to_radians(),
        lon_b.to_radians(),
        lat_b.to_radians(),
    );
    let s = ((lat_a - lat_b) / 2.0).sin();
    let t = ((lon_a - lon_b) / 2.0).sin();
    (2.0 * (s * s + lat_a.cos() * lat_b.cos() * t * t).sqrt().asin()).abs()
}

/// Unit-sphere Cartesian coordinates of a point given in degrees.
pub fn to_xyz(lat: f64, lon: f64) -> [f64; 3] {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    [lon.cos() * lat.cos(), lon.sin() * lat.cos(), lat.sin()]
}

fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Whether the ray from the origin through `pt` crosses the planar
/// triangle `(a, b, c)`.
///
/// `pt` is projected along the ray onto the triangle's plane, then tested
/// against the three edges. Either winding is accepted.
pub fn inside_triangle(a: [f64; 3], b: [f64; 3], c: [f64; 3], pt: [f64; 3]) -> bool {
    let ab = sub3(b, a);
    let bc = sub3(c, b);
    let ca = sub3(a, c);
    let normal = cross3(ab, sub3(c, a));
    let denom = dot3(normal, pt);
    let p = if denom != 0.0 {
        let t = dot3(normal, a) / denom;
        [pt[0] * t, pt[1] * t, pt[2] * t]
    } else {
        pt
    };
    let t0 = dot3(cross3(sub3(p, a), ab), normal) > 0.0;
    let t1 = dot3(cross3(sub3(p, b), bc), normal) > 0.0;
    let t2 = dot3(cross3(sub3(p, c), ca), normal) > 0.0;
    (t0 && t1 && t2) || (!t0 && !t1 && !t2)
}

/// Result of locating one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Fractional grid coordinates, `None` when the point is off the grid.
    pub grid: Option<[f32; 2]>,
    /// Grid point where the search stopped.
    pub cell: [usize; 2],
    /// Hill-climb steps taken.
    pub iterations: usize,
}

/// One of the two triangles of a grid cell, corners as `(lon, lat)`.
struct Triangle {
    cell: [isize; 2],
    lower: bool,
    /// Lower: `(0,0)`, `(1,0)`, `(0,1)`. Upper: `(1,1)`, `(1,0)`, `(0,1)`.
    corners: [[f32; 2]; 3],
}

impl Triangle {
    fn spans_dateline(&self) -> bool {
        let lons = self.corners.map(|c| c[0]);
        let min = lons.iter().copied().fold(f32::INFINITY, f32::min);
        let max = lons.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        max - min > DATELINE_SPAN_DEGREES
    }

    fn reverse_interpolate(&self, p: [f32; 2]) -> [f32; 2] {
        let [gx, gy] = [self.cell[0] as f32, self.cell[1] as f32];
        if self.spans_dateline() {
            return [gx, gy];
        }
        if self.lower {
            let [v0, v1, v2] = self.corners;
            [
                ((p[0] - v0[0]) * (v2[1] - v0[1]) + (v0[1] - p[1]) * (v2[0] - v0[0]))
                    / ((v1[0] - v0[0]) * (v2[1] - v0[1]) + (v0[1] - v1[1]) * (v2[0] - v0[0]))
                    + gx,
                ((p[0] - v0[0]) * (v1[1] - v0[1]) + (v0[1] - p[1]) * (v1[0] - v0[0]))
                    / ((v2[0] - v0[0]) * (v1[1] - v0[1]) + (v0[1] - v2[1]) * (v1[0] - v0[0]))
                    + gy,
            ]
        } else {
            let [v3, v1, v2] = self.corners;
            [
                ((v3[0] - p[0]) * (v1[1] - v3[1]) + (p[1] - v3[1]) * (v1[0] - v3[0]))
                    / ((v2[0] - v3[0]) * (v1[1] - v3[1]) - (v2[1] - v3[1]) * (v1[0] - v3[0]))
                    + gx
                    + 1.0,
                ((v2[1] - v3[1]) * (v3[0] - p[0]) + (v2[0] - v3[0]) * (p[1] - v3[1]))
                    / ((v1[0] - v3[0]) * (v2[1] - v3[1]) - (v2[0] - v3[0]) * (v1[1] - v3[1]))
                    + gy
                    + 1.0,
            ]
        }
    }
}

/// A contiguous band of rows searched on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Granule {
    y_start: usize,
    rows: usize,
}

/// Borrowed view of one granule's coordinates.
struct Track<'a> {
    lats: &'a [f32],
    lons: &'a [f32],
    nx: usize,
    ny: usize,
}

impl Track<'_> {
    fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.nx && (y as usize) < self.ny
    }

    fn index(&self, x: isize, y: isize) -> usize {
        y as usize * self.nx + x as usize
    }

    fn valid(&self, x: isize, y: isize) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let k = self.index(x, y);
        !self.lons[k].is_nan() && !self.lats[k].is_nan() && self.lats[k].abs() <= 90.0
    }

    fn center(&self) -> [usize; 2] {
        [(self.nx - 1) / 2, (self.ny - 1) / 2]
    }

    /// Nearest valid grid point to `start` along the axes through it.
    fn find_valid(&self, start: [usize; 2]) -> Option<[usize; 2]> {
        let (gx, gy) = (start[0] as isize, start[1] as isize);
        let limit = (self.nx.min(self.ny) / 2).saturating_sub(2).max(1) as isize;
        (0..limit).find_map(|cnt| {
            [(gx, gy + cnt), (gx, gy - cnt), (gx + cnt, gy), (gx - cnt, gy)]
                .into_iter()
                .find(|&(x, y)| self.valid(x, y))
                .map(|(x, y)| [x as usize, y as usize])
        })
    }

    fn xyz(&self, x: isize, y: isize) -> [f64; 3] {
        let k = self.index(x, y);
        to_xyz(f64::from(self.lats[k]), f64::from(self.lons[k]))
    }

    fn lonlat(&self, cell: [isize; 2], offset: (isize, isize)) -> [f32; 2] {
        let k = self.index(cell[0] + offset.0, cell[1] + offset.1);
        [self.lons[k], self.lats[k]]
    }

    /// Triangle test with corners given as offsets from `cell`; corners
    /// off the grid fail.
    fn inside(&self, cell: [isize; 2], corners: [(isize, isize); 3], pt: [f64; 3]) -> bool {
        let points = corners.map(|(dx, dy)| (cell[0] + dx, cell[1] + dy));
        if points.iter().any(|&(x, y)| !self.in_bounds(x, y)) {
            return false;
        }
        let [a, b, c] = points.map(|(x, y)| self.xyz(x, y));
        inside_triangle(a, b, c, pt)
    }

    /// Which of the six triangles around grid point `g` contains `pt`.
    fn which_triangle(&self, g: [isize; 2], pt: [f64; 3]) -> Option<Triangle> {
        let candidates = [
            ([g[0], g[1]], true),
            ([g[0] - 1, g[1] - 1], false),
            ([g[0], g[1] - 1], true),
            ([g[0], g[1] - 1], false),
            ([g[0] - 1, g[1]], true),
            ([g[0] - 1, g[1]], false),
        ];
        candidates.into_iter().find_map(|(cell, lower)| {
            let corners = if lower { [CC, UU, RR] } else { [UU, UR, RR] };
            self.inside(cell, corners, pt).then(|| Triangle {
                cell,
                lower,
                corners: if lower {
                    [self.lonlat(cell, CC), self.lonlat(cell, RR), self.lonlat(cell, UU)]
                } else {
                    [self.lonlat(cell, UR), self.lonlat(cell, RR), self.lonlat(cell, UU)]
                },
            })
        })
    }

    /// Edge and corner grid points only own part of the surrounding
    /// triangles; reject targets beyond the grid boundary.
    fn off_grid(&self, g: [isize; 2], pt: [f64; 3]) -> bool {
        let (last_x, last_y) = (self.nx as isize - 1, self.ny as isize - 1);
        let corners = match (g[0], g[1]) {
            (0, 0) => [CC, UU, RR],
            (0, y) if y == last_y => [CC, DD, RR],
            (x, 0) if x == last_x => [CC, UU, LL],
            (x, y) if x == last_x && y == last_y => [CC, LL, DD],
            (_, 0) => [LL, UU, RR],
            (_, y) if y == last_y => [LL, DD, RR],
            (0, _) => [UU, RR, DD],
            (x, _) if x == last_x => [UU, LL, DD],
            _ => return false,
        };
        !self.inside(g, corners, pt)
    }

    /// Hill climb from `start` toward `(lat, lon)`.
    fn walk(&self, lat: f32, lon: f32, start: [usize; 2]) -> Result<Location> {
        let start = if self.valid(start[0] as isize, start[1] as isize) {
            start
        } else {
            self.find_valid(start).ok_or_else(|| {
                SetError::InvalidGrid("initial grid guess cannot be invalid or missing".to_string())
            })?
        };
        let (t_lon, t_lat) = (f64::from(lon), f64::from(lat));
        let (mut gx, mut gy) = (start[0] as isize, start[1] as isize);
        let mut last_step = (0, 0);
        let max_iterations = 2 * (self.nx + self.ny);

        for iteration in 1..=max_iterations {
            let k = self.index(gx, gy);
            let mut best = great_circle_angle(t_lon, t_lat, f64::from(self.lons[k]), f64::from(self.lats[k]));
            let mut step = (0, 0);
            let mut blocked = false;
            for (dx, dy) in NEIGHBORS {
                let (x, y) = (gx + dx, gy + dy);
                if !self.in_bounds(x, y) {
                    continue;
                }
                let k = self.index(x, y);
                if self.lats[k].abs() > 90.0 {
                    blocked = true;
                    break;
                }
                let angle = great_circle_angle(f64::from(self.lons[k]), f64::from(self.lats[k]), t_lon, t_lat);
                if angle < best {
                    best = angle;
                    step = (dx, dy);
                }
            }
            if blocked {
                // repeat the previous step to walk over invalid coordinates
                gx = (gx + last_step.0).clamp(0, self.nx as isize - 1);
                gy = (gy + last_step.1).clamp(0, self.ny as isize - 1);
                continue;
            }

            gx += step.0;
            gy += step.1;
            last_step = step;
            if step == (0, 0) {
                let g = [gx, gy];
                let pt = to_xyz(t_lat, t_lon);
                let grid = if self.off_grid(g, pt) {
                    None
                } else {
                    self.which_triangle(g, pt).map(|tri| tri.reverse_interpolate([lon, lat]))
                };
                return Ok(Location {
                    grid,
                    cell: [gx as usize, gy as usize],
                    iterations: iteration,
                });
            }
        }
        Ok(Location {
            grid: None,
            cell: [gx as usize, gy as usize],
            iterations: max_iterations,
        })
    }
}

/// A two dimensional grid of sampled latitudes and longitudes in degrees.
///
/// Latitudes with magnitude above 90 mark invalid samples; the inverse
/// search walks over them. Tracks that wind more than
/// [`GRANULE_SPLIT_DEGREES`] around the globe are searched as two halves.
#[derive(Debug)]
pub struct GriddedLatLonSet {
    grid: Gridded2DSet,
    order: LatLonOrder,
    granules: Vec<Granule>,
    last_found: Mutex<Option<[usize; 2]>>,
}

impl GriddedLatLonSet {
    /// Samples in component order; the cell orientation test is skipped.
    pub fn new(samples: Vec<Vec<f32>>, nx: usize, ny: usize, order: LatLonOrder) -> Result<Self> {
        Self::with_options(samples, nx, ny, order, SetOptions::default(), false)
    }

    pub fn with_options(
        samples: Vec<Vec<f32>>,
        nx: usize,
        ny: usize,
        order: LatLonOrder,
        options: SetOptions,
        test: bool,
    ) -> Result<Self> {
        let grid = Gridded2DSet::with_options(samples, nx, ny, options, test)?;
        let mut set = Self {
            grid,
            order,
            granules: vec![Granule { y_start: 0, rows: ny }],
            last_found: Mutex::new(None),
        };

        let accumulated = set.track_angle();
        if accumulated > GRANULE_SPLIT_DEGREES.to_radians() && ny >= 4 && nx >= 2 {
            let half = ny / 2;
            set.granules = vec![
                Granule { y_start: 0, rows: half },
                Granule {
                    y_start: half,
                    rows: ny - half,
                },
            ];
            tracing::debug!(
                degrees = accumulated.to_degrees(),
                split_row = half,
                "track split into two granules"
            );
        }
        Ok(set)
    }

    pub fn order(&self) -> LatLonOrder {
        self.order
    }

    /// Whether the track is searched as two halves.
    pub fn is_split(&self) -> bool {
        self.granules.len() > 1
    }

    fn lats(&self) -> &[f32] {
        &self.grid.sampled().samples()[self.order.lat_index()]
    }

    fn lons(&self) -> &[f32] {
        &self.grid.sampled().samples()[self.order.lon_index()]
    }

    fn nx(&self) -> usize {
        self.grid.lengths()[0]
    }

    fn ny(&self) -> usize {
        self.grid.lengths()[1]
    }

    /// Great-circle angle accumulated down the first column.
    fn track_angle(&self) -> f64 {
        let (lats, lons, nx) = (self.lats(), self.lons(), self.nx());
        (0..self.ny().saturating_sub(1))
            .map(|k| (k * nx, (k + 1) * nx))
            .filter(|&(a, b)| {
                let ok = |v: f32| !v.is_nan() && v.abs() <= 90.0;
                ok(lats[a]) && ok(lats[b])
            })
            .map(|(a, b)| {
                great_circle_angle(
                    f64::from(lons[b]),
                    f64::from(lats[b]),
                    f64::from(lons[a]),
                    f64::from(lats[a]),
                )
            })
            .sum()
    }

    fn track(&self, granule: Granule) -> Track<'_> {
        let nx = self.nx();
        let range = granule.y_start * nx..(granule.y_start + granule.rows) * nx;
        Track {
            lats: &self.lats()[range.clone()],
            lons: &self.lons()[range],
            nx,
            ny: granule.rows,
        }
    }

    /// Locate one point, starting the search in `start` (whole grid
    /// coordinates) when it falls in the granule being searched.
    fn locate_from(&self, lat: f32, lon: f32, start: Option<[usize; 2]>) -> Result<Location> {
        let mut iterations = 0;
        let mut last = None;
        for &granule in &self.granules {
            let track = self.track(granule);
            let local = start
                .filter(|s| s[0] < track.nx && s[1] >= granule.y_start && s[1] < granule.y_start + granule.rows)
                .map(|s| [s[0], s[1] - granule.y_start])
                .unwrap_or_else(|| track.center());
            let mut found = track.walk(lat, lon, local)?;
            iterations += found.iterations;
            found.cell[1] += granule.y_start;
            if let Some(g) = found.grid.as_mut() {
                g[1] += granule.y_start as f32;
            }
            found.iterations = iterations;
            if found.grid.is_some() {
                return Ok(found);
            }
            last = Some(found);
        }
        last.ok_or(SetError::DegenerateGrid("GriddedLatLonSet has no rows"))
    }

    /// Locate a single point given in component order.
    ///
    /// Without a guess the search starts at the grid center. The returned
    /// [`Location`] reports how many hill-climb steps were needed.
    pub fn locate(&self, value: [f32; 2], guess: Option<[usize; 2]>) -> Result<Location> {
        check_interpolable("GriddedLatLonSet locate", self.grid.lengths())?;
        let (lat, lon) = self.lat_lon(value);
        if lat.is_nan() || lon.is_nan() {
            return Ok(Location {
                grid: None,
                cell: guess.unwrap_or([0, 0]),
                iterations: 0,
            });
        }
        if self.len() == 1 {
            return Ok(Location {
                grid: Some([0.0, 0.0]),
                cell: [0, 0],
                iterations: 0,
            });
        }
        self.locate_from(lat, lon, guess)
    }

    fn lat_lon(&self, value: [f32; 2]) -> (f32, f32) {
        (value[self.order.lat_index()], value[self.order.lon_index()])
    }

    /// Grid coordinates of every point, plus the cell of the last point
    /// that landed on the grid (`start` if none did).
    fn locate_all(&self, value: &[Vec<f32>], start: Option<[usize; 2]>) -> Result<(Vec<Vec<f32>>, Option<[usize; 2]>)> {
        let n = point_count("GriddedLatLonSet value_to_grid", 2, value)?;
        check_interpolable("GriddedLatLonSet value_to_grid", self.grid.lengths())?;
        let mut grid = vec![vec![f32::NAN; n]; 2];
        let mut cell = start;
        let mut last_valid = start;

        for i in 0..n {
            let (lat, lon) = self.lat_lon([value[0][i], value[1][i]]);
            if lat.is_nan() || lon.is_nan() {
                continue;
            }
            if self.len() == 1 {
                grid[0][i] = 0.0;
                grid[1][i] = 0.0;
                continue;
            }
            if i != 0 && grid[0][i - 1].is_nan() && last_valid.is_some() {
                cell = last_valid;
            }
            let found = self.locate_from(lat, lon, cell)?;
            cell = Some(found.cell);
            if let Some([gx, gy]) = found.grid {
                grid[0][i] = gx;
                grid[1][i] = gy;
                last_valid = Some(found.cell);
            }
        }
        Ok((grid, last_valid))
    }
}

impl Clone for GriddedLatLonSet {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid.clone(),
            order: self.order,
            granules: self.granules.clone(),
            last_found: Mutex::new(*self.last_found.lock().unwrap_or_else(|e| e.into_inner())),
        }
    }
}

impl Set for GriddedLatLonSet {
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

    fn samples(&self) -> Result<Vec<Vec<f32>>> {
        self.grid.samples()
    }

    fn index_to_value(&self, index: &[usize]) -> Result<Vec<Vec<f32>>> {
        self.grid.index_to_value(index)
    }

    fn value_to_index(&self, value: &[Vec<f32>]) -> Result<Vec<Option<usize>>> {
        let grid = self.value_to_grid(value)?;
        Ok(grid_to_index(&grid, self.grid.lengths()))
    }
}

impl GriddedSet for GriddedLatLonSet {
    fn lengths(&self) -> &[usize] {
        self.grid.lengths()
    }

    /// Triangle interpolation, falling back to the nearest grid point in
    /// cells that straddle the dateline.
    fn grid_to_value(&self, grid: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let n = point_count("GriddedLatLonSet grid_to_value", 2, grid)?;
        let (nx, ny) = (self.nx(), self.ny());
        let lons = self.lons();
        let mut snapped = grid.to_vec();
        // degenerate axes are rejected (or the singleton returned) below
        if nx >= 2 && ny >= 2 {
            for i in 0..n {
                let (gx, gy) = (grid[0][i], grid[1][i]);
                if gx.is_nan() || gy.is_nan() || gx < -0.5 || gy < -0.5 {
                    continue;
                }
                let igx = (gx.max(0.0) as usize).min(nx - 2);
                let igy = (gy.max(0.0) as usize).min(ny - 2);
                let k = igy * nx + igx;
                let corners = [lons[k], lons[k + 1], lons[k + nx], lons[k + nx + 1]];
                let min = corners.iter().copied().fold(f32::MAX, f32::min);
                let max = corners.iter().copied().fold(-f32::MAX, f32::max);
                if max - min > DATELINE_SPAN_DEGREES {
                    snapped[0][i] = (gx + 0.5).floor();
                    snapped[1][i] = (gy + 0.5).floor();
                }
            }
        }
        self.grid.grid_to_value(&snapped)
    }

    fn value_to_grid(&self, value: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        let mut last = self.last_found.lock().unwrap_or_else(|e| e.into_inner());
        let (grid, cell) = self.locate_all(value, *last)?;
        if cell.is_some() {
            *last = cell;
        }
        Ok(grid)
    }

    fn value_to_grid_with_guess(
        &self,
        value: &[Vec<f32>],
        guess: &mut Option<Vec<usize>>,
    ) -> Result<Vec<Vec<f32>>> {
        let start = match guess.as_deref() {
            Some(&[x, y]) => Some([x, y]),
            Some(other) => {
                return Err(SetError::DimensionMismatch {
                    context: "GriddedLatLonSet guess",
                    expected: 2,
                    found: other.len(),
                });
            }
            None => None,
        };
        let (grid, cell) = self.locate_all(value, start)?;
        if let Some(cell) = cell {
            *guess = Some(cell.to_vec());
        }
        Ok(grid)
    }
}

impl PartialEq for GriddedLatLonSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.grid == other.grid
    }
}
