// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiling grids: grid sets, their cached subsets and tile index ranges.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A coordinate reference system, identified by its EPSG code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Srs(u32);

impl Srs {
    /// Geographic WGS 84 (longitude, latitude).
    pub const WGS84: Self = Self(4326);
    /// Spherical web mercator.
    pub const WEB_MERCATOR: Self = Self(3857);

    /// The system with EPSG code `code`.
    pub const fn epsg(code: u32) -> Self {
        Self(code)
    }

    /// The EPSG code.
    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Srs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// An inclusive rectangle of tile indices at one zoom level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRange {
    /// Smallest column.
    pub min_x: i64,
    /// Smallest row.
    pub min_y: i64,
    /// Largest column.
    pub max_x: i64,
    /// Largest row.
    pub max_y: i64,
}

impl TileRange {
    /// A range, `None` when it holds no tile.
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Option<Self> {
        (min_x <= max_x && min_y <= max_y).then_some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Whether tile `(x, y)` is in the range.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Number of columns.
    pub fn width(&self) -> u64 {
        self.max_x.abs_diff(self.min_x) + 1
    }

    /// Number of rows.
    pub fn height(&self) -> u64 {
        self.max_y.abs_diff(self.min_y) + 1
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> u64 {
        self.width().saturating_mul(self.height())
    }

    /// The tiles in both ranges.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        )
    }

    /// Every tile, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }
}

/// Tile index of `value` along one axis: rounds towards negative infinity.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Tile indices are i64; out-of-range values saturate."
)]
#[inline]
fn tile_coord(value: f64, origin: f64, span: f64) -> i64 {
    ((value - origin) / span).floor() as i64
}

/// Like [`tile_coord`], but a value on a tile edge belongs to the tile below it.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Tile indices are i64; out-of-range values saturate."
)]
#[inline]
fn tile_coord_upper(value: f64, origin: f64, span: f64) -> i64 {
    ((value - origin) / span).ceil() as i64 - 1
}

/// A tiling scheme: a coordinate system, an extent, a tile size in pixels and
/// the ground resolution of each zoom level.
///
/// Tile `(0, 0)` sits at the bottom-left corner of the extent; rows grow
/// upwards.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSet {
    name: String,
    srs: Srs,
    extent: Rect,
    tile_width: u32,
    tile_height: u32,
    resolutions: Vec<f64>,
}

impl GridSet {
    /// Validate and create a grid set.
    ///
    /// Resolutions are in map units per pixel, one per zoom level, coarsest first.
    pub fn new(
        name: impl Into<String>,
        srs: Srs,
        extent: Rect,
        tile_width: u32,
        tile_height: u32,
        resolutions: Vec<f64>,
    ) -> Result<Self, PlanError> {
        let name = name.into();
        if tile_width == 0 || tile_height == 0 {
            return Err(PlanError::InvalidConfig(format!(
                "grid set '{name}': tile size must be positive"
            )));
        }
        if resolutions.is_empty() || resolutions.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(PlanError::InvalidConfig(format!(
                "grid set '{name}': resolutions must be finite and positive"
            )));
        }
        let extent = extent.abs();
        if !extent.is_finite() || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "grid set '{name}': extent must have a positive area"
            )));
        }
        Ok(Self {
            name,
            srs,
            extent,
            tile_width,
            tile_height,
            resolutions,
        })
    }

    /// Grid set name, used as the grid id of tasks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate system of the grid.
    pub fn srs(&self) -> Srs {
        self.srs
    }

    /// Area covered by the grid.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Tile width in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Tile height in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Number of zoom levels.
    pub fn num_levels(&self) -> usize {
        self.resolutions.len()
    }

    /// Map units per pixel at zoom level `z`.
    pub fn resolution(&self, z: usize) -> Option<f64> {
        self.resolutions.get(z).copied()
    }

    /// Width and height of one tile at zoom level `z`, in map units.
    pub fn tile_span(&self, z: usize) -> Option<(f64, f64)> {
        let res = self.resolution(z)?;
        Some((
            res * f64::from(self.tile_width),
            res * f64::from(self.tile_height),
        ))
    }

    /// Bounds of tile `(x, y)` at zoom level `z`.
    pub fn tile_bounds(&self, x: i64, y: i64, z: usize) -> Option<Rect> {
        let (w, h) = self.tile_span(z)?;
        let x0 = self.extent.x0 + x as f64 * w;
        let y0 = self.extent.y0 + y as f64 * h;
        Some(Rect::new(x0, y0, x0 + w, y0 + h))
    }
}

/// The part of a [`GridSet`] a layer caches: a zoom range and an extent.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSubset {
    gridset: Arc<GridSet>,
    zoom_start: usize,
    zoom_stop: usize,
    extent: Rect,
}

impl GridSubset {
    /// Every level and the whole extent of `gridset`.
    pub fn full(gridset: Arc<GridSet>) -> Self {
        Self {
            zoom_start: 0,
            zoom_stop: gridset.num_levels() - 1,
            extent: gridset.extent(),
            gridset,
        }
    }

    /// A subset of `gridset`.
    ///
    /// Missing bounds default to the grid set's. The extent is clipped to the
    /// grid set's extent.
    pub fn new(
        gridset: Arc<GridSet>,
        zoom_start: Option<usize>,
        zoom_stop: Option<usize>,
        extent: Option<Rect>,
    ) -> Result<Self, PlanError> {
        let last = gridset.num_levels() - 1;
        let zoom_start = zoom_start.unwrap_or(0);
        let zoom_stop = zoom_stop.unwrap_or(last);
        if zoom_start > zoom_stop || zoom_stop > last {
            return Err(PlanError::InvalidConfig(format!(
                "grid subset of '{}': zoom range {zoom_start}..={zoom_stop} outside 0..={last}",
                gridset.name()
            )));
        }
        let full = gridset.extent();
        let extent = match extent {
            Some(e) => {
                let clipped = e.abs().intersect(full);
                if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
                    return Err(PlanError::InvalidConfig(format!(
                        "grid subset of '{}': extent does not overlap the grid set",
                        gridset.name()
                    )));
                }
                clipped
            }
            None => full,
        };
        Ok(Self {
            gridset,
            zoom_start,
            zoom_stop,
            extent,
        })
    }

    /// Name of the underlying grid set.
    pub fn name(&self) -> &str {
        self.gridset.name()
    }

    /// The underlying grid set.
    pub fn gridset(&self) -> &Arc<GridSet> {
        &self.gridset
    }

    /// First cached zoom level.
    pub fn zoom_start(&self) -> usize {
        self.zoom_start
    }

    /// Last cached zoom level (inclusive).
    pub fn zoom_stop(&self) -> usize {
        self.zoom_stop
    }

    /// Cached extent, in the grid set's coordinates.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Bounds of tile `(x, y)` at level `z`.
    pub fn tile_bounds(&self, x: i64, y: i64, z: usize) -> Option<Rect> {
        self.gridset.tile_bounds(x, y, z)
    }

    /// Tiles covering the subset's extent at level `z`.
    pub fn coverage(&self, z: usize) -> Option<TileRange> {
        if z < self.zoom_start || z > self.zoom_stop {
            return None;
        }
        let (w, h) = self.gridset.tile_span(z)?;
        let origin = self.gridset.extent();
        TileRange::new(
            tile_coord(self.extent.x0, origin.x0, w),
            tile_coord(self.extent.y0, origin.y0, h),
            tile_coord_upper(self.extent.x1, origin.x0, w),
            tile_coord_upper(self.extent.y1, origin.y0, h),
        )
    }

    /// Tiles of level `z` touching `bounds`, within the subset's coverage.
    ///
    /// Bounds lying on a tile edge include the tile on either side.
    pub fn coverage_intersection(&self, z: usize, bounds: Rect) -> Option<TileRange> {
        let coverage = self.coverage(z)?;
        let (w, h) = self.gridset.tile_span(z)?;
        let origin = self.gridset.extent();
        let bounds = bounds.abs();
        let touching = TileRange::new(
            tile_coord(bounds.x0, origin.x0, w),
            tile_coord(bounds.y0, origin.y0, h),
            tile_coord(bounds.x1, origin.x0, w),
            tile_coord(bounds.y1, origin.y0, h),
        )?;
        coverage.intersect(&touching)
    }
}

/// Grid sets by name.
#[derive(Clone, Debug, Default)]
pub struct GridSetBroker {
    gridsets: HashMap<String, Arc<GridSet>>,
}

impl GridSetBroker {
    /// An empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a grid set, replacing one with the same name.
    pub fn insert(&mut self, gridset: GridSet) -> Arc<GridSet> {
        let gridset = Arc::new(gridset);
        self.gridsets
            .insert(gridset.name().to_owned(), Arc::clone(&gridset));
        gridset
    }

    /// The grid set called `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<GridSet>> {
        self.gridsets.get(name)
    }

    /// Number of registered grid sets.
    pub fn len(&self) -> usize {
        self.gridsets.len()
    }

    /// Whether no grid set is registered.
    pub fn is_empty(&self) -> bool {
        self.gridsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> Arc<GridSet> {
        Arc::new(
            GridSet::new(
                "unit",
                Srs::epsg(404000),
                Rect::new(0.0, 0.0, 256.0, 256.0),
                256,
                256,
                vec![0.25, 1.0 / 64.0, 1.0 / 256.0],
            )
            .unwrap(),
        )
    }

    #[test]
    fn tile_bounds_start_at_the_bottom_left() {
        let g = unit_grid();
        assert_eq!(g.tile_span(0), Some((64.0, 64.0)));
        assert_eq!(g.tile_bounds(1, 2, 0), Some(Rect::new(64.0, 128.0, 128.0, 192.0)));
        assert_eq!(g.tile_bounds(50, 50, 2), Some(Rect::new(50.0, 50.0, 51.0, 51.0)));
        assert_eq!(g.tile_bounds(0, 0, 3), None);
    }

    #[test]
    fn full_coverage() {
        let s = GridSubset::full(unit_grid());
        assert_eq!(s.coverage(0), TileRange::new(0, 0, 3, 3));
        assert_eq!(s.coverage(2).map(|r| r.tile_count()), Some(256 * 256));
        assert_eq!(s.coverage(3), None);
    }

    #[test]
    fn coverage_intersection_is_clamped() {
        let s = GridSubset::full(unit_grid());
        assert_eq!(
            s.coverage_intersection(2, Rect::new(48.0, 48.5, 52.0, 51.5)),
            TileRange::new(48, 48, 52, 51)
        );
        assert_eq!(
            s.coverage_intersection(0, Rect::new(-100.0, -100.0, 1000.0, 10.0)),
            TileRange::new(0, 0, 3, 0)
        );
        assert_eq!(
            s.coverage_intersection(0, Rect::new(-100.0, -100.0, -50.0, -50.0)),
            None
        );
    }

    #[test]
    fn subset_validation() {
        let g = unit_grid();
        assert!(GridSubset::new(g.clone(), Some(2), Some(1), None).is_err());
        assert!(GridSubset::new(g.clone(), None, Some(3), None).is_err());
        assert!(
            GridSubset::new(g.clone(), None, None, Some(Rect::new(300.0, 300.0, 400.0, 400.0)))
                .is_err()
        );
        let s = GridSubset::new(g, Some(1), None, Some(Rect::new(-10.0, 0.0, 128.0, 128.0))).unwrap();
        assert_eq!(s.extent(), Rect::new(0.0, 0.0, 128.0, 128.0));
        assert_eq!(s.coverage(0), None);
        assert_eq!(s.coverage(1), TileRange::new(0, 0, 31, 31));
    }

    #[test]
    fn invalid_grid_sets_are_rejected() {
        let e = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(GridSet::new("a", Srs::WGS84, e, 0, 256, vec![1.0]).is_err());
        assert!(GridSet::new("a", Srs::WGS84, e, 256, 256, vec![]).is_err());
        assert!(GridSet::new("a", Srs::WGS84, e, 256, 256, vec![-1.0]).is_err());
        assert!(GridSet::new("a", Srs::WGS84, Rect::ZERO, 256, 256, vec![1.0]).is_err());
    }

    #[test]
    fn tile_range_iteration() {
        let r = TileRange::new(1, 1, 2, 3).unwrap();
        assert_eq!(r.tile_count(), 6);
        let tiles: Vec<_> = r.tiles().collect();
        assert_eq!(tiles.first(), Some(&(1, 1)));
        assert_eq!(tiles.last(), Some(&(2, 3)));
        assert!(TileRange::new(2, 0, 1, 0).is_none());
    }

    #[test]
    fn srs_display() {
        assert_eq!(Srs::WEB_MERCATOR.to_string(), "EPSG:3857");
    }
}
