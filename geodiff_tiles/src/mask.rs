// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-level tile coverage of a geometry.

use geo::{Geometry, Intersects};
use geodiff_geom::{bounding_rect, rect_to_polygon};

use crate::grid::{GridSubset, TileRange};

/// The tiles of a grid subset that a geometry may affect.
///
/// Built once per geometry and grid. For every cached zoom level it keeps the
/// range of tiles touching the geometry's envelope, which answers most
/// [`lookup`](Self::lookup)s without geometry tests. Tiles inside the range
/// are tested against the geometry after being grown by one tile on every
/// side, so that precision lost upstream never causes a tile to be missed.
///
/// ```rust
/// use std::sync::Arc;
/// use geo::{Geometry, Point};
/// use geodiff_tiles::{GridSet, GridSubset, Srs, TileCoverageMask};
/// use kurbo::Rect;
///
/// let grid = GridSet::new("unit", Srs::epsg(404000), Rect::new(0.0, 0.0, 64.0, 64.0), 256, 256, vec![1.0 / 256.0])
///     .unwrap();
/// let subset = GridSubset::full(Arc::new(grid));
/// let mask = TileCoverageMask::build(Geometry::Point(Point::new(10.5, 10.5)), &subset);
///
/// assert!(mask.lookup(10, 10, 0));
/// assert!(!mask.lookup(11, 10, 0)); // outside the envelope's range
/// assert_eq!(mask.tile_count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TileCoverageMask {
    geometry: Geometry<f64>,
    subset: GridSubset,
    /// Indexed by zoom level; `None` below `zoom_start` or where nothing is covered.
    coverages: Vec<Option<TileRange>>,
}

impl TileCoverageMask {
    /// Compute the coverage of `geometry`, expressed in the subset's coordinates.
    pub fn build(geometry: Geometry<f64>, subset: &GridSubset) -> Self {
        let envelope = bounding_rect(&geometry);
        let coverages = (0..=subset.zoom_stop())
            .map(|z| envelope.and_then(|env| subset.coverage_intersection(z, env)))
            .collect();
        Self {
            geometry,
            subset: subset.clone(),
            coverages,
        }
    }

    /// Whether tile `(x, y)` of level `z` may be affected.
    #[inline]
    pub fn lookup(&self, x: i64, y: i64, z: usize) -> bool {
        self.lookup_with_buffer(x, y, z, 1)
    }

    /// Like [`lookup`](Self::lookup) with a ring of `tiles` tiles instead of one.
    ///
    /// Monotonic in `tiles`: a larger ring never drops a tile.
    pub fn lookup_with_buffer(&self, x: i64, y: i64, z: usize, tiles: u32) -> bool {
        let Some(range) = self.coverage(z) else {
            return false;
        };
        if !range.contains(x, y) {
            return false;
        }
        let Some(bounds) = self.subset.tile_bounds(x, y, z) else {
            return false;
        };
        let ring = f64::from(tiles);
        let probe = bounds.inflate(bounds.width() * ring, bounds.height() * ring);
        self.geometry.intersects(&rect_to_polygon(probe))
    }

    /// The tile range of level `z`, if anything is covered there.
    pub fn coverage(&self, z: usize) -> Option<TileRange> {
        self.coverages.get(z).copied().flatten()
    }

    /// Tile ranges indexed by zoom level.
    pub fn coverages(&self) -> &[Option<TileRange>] {
        &self.coverages
    }

    /// First zoom level of the grid subset.
    pub fn zoom_start(&self) -> usize {
        self.subset.zoom_start()
    }

    /// Last zoom level of the grid subset.
    pub fn zoom_stop(&self) -> usize {
        self.subset.zoom_stop()
    }

    /// Whether no level has a covered tile.
    pub fn is_empty(&self) -> bool {
        self.coverages.iter().all(Option::is_none)
    }

    /// Upper bound of the number of tiles to invalidate, over all levels.
    pub fn tile_count(&self) -> u64 {
        self.coverages
            .iter()
            .flatten()
            .map(TileRange::tile_count)
            .fold(0, u64::saturating_add)
    }

    /// The tiles of level `z` for which [`lookup`](Self::lookup) holds.
    pub fn tiles(&self, z: usize) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.coverage(z)
            .into_iter()
            .flat_map(|range| {
                (range.min_y..=range.max_y)
                    .flat_map(move |y| (range.min_x..=range.max_x).map(move |x| (x, y)))
            })
            .filter(move |&(x, y)| self.lookup(x, y, z))
    }

    /// The mask geometry.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// The grid subset the mask was built for.
    pub fn grid_subset(&self) -> &GridSubset {
        &self.subset
    }
}
