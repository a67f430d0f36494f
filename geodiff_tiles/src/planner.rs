// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a diff geometry into tile invalidation tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo::algorithm::buffer::{BufferStyle, LineCap, LineJoin};
use geo::{
    Buffer, Coord, CoordsIter, Geometry, MultiPolygon, Point, Polygon, SimplifyVwPreserve,
    unary_union,
};
use geodiff_geom::DiffGeometry;
use geodiff_geom::{bounding_rect, rect_to_polygon};
use kurbo::Rect;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::config::{GridSubsetConfig, LayerConfig, PlannerConfig, STYLES_PARAMETER};
use crate::error::{DispatchError, PlanError};
use crate::grid::{GridSetBroker, GridSubset};
use crate::mask::TileCoverageMask;
use crate::reproject::{Reprojector, TransformRegistry};

/// A request to drop the cached tiles of one layer, grid, style and format
/// that fall inside a mask.
#[derive(Clone, Debug)]
pub struct InvalidationTask {
    /// Layer name.
    pub layer: String,
    /// Grid set name.
    pub gridset_id: String,
    /// First zoom level to invalidate.
    pub zoom_start: usize,
    /// Last zoom level to invalidate (inclusive).
    pub zoom_stop: usize,
    /// Output format, such as `image/png`.
    pub format: String,
    /// Request parameters selecting the cached variant; empty for the default style.
    pub parameters: BTreeMap<String, String>,
    /// Tiles to invalidate, shared by every task of the same grid.
    pub mask: Arc<TileCoverageMask>,
}

/// Why a grid produced no task.
#[derive(Debug)]
pub enum SkipReason {
    /// The buffered geometry does not reach the cached extent.
    OutsideCoverage,
    /// Planning for the grid failed.
    Failed(PlanError),
}

/// A grid of the layer that produced no task.
#[derive(Debug)]
pub struct SkippedGrid {
    /// Grid set name.
    pub gridset_id: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of [`InvalidationPlanner::plan`].
#[derive(Debug, Default)]
pub struct InvalidationPlan {
    /// Tasks to dispatch.
    pub tasks: Vec<InvalidationTask>,
    /// Grids without tasks.
    pub skipped: Vec<SkippedGrid>,
}

impl InvalidationPlan {
    /// Whether there is nothing to dispatch.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Plans the invalidations caused by a diff geometry.
///
/// For every grid the layer is cached on, the geometry is reprojected into the
/// grid's coordinates, buffered by a couple of tiles of the finest level used
/// for buffering, simplified without changing its topology and turned into a
/// [`TileCoverageMask`]. Each cached style and output format of the layer
/// then gets one task over the grid's cached zoom range.
#[derive(Clone, Debug)]
pub struct InvalidationPlanner<R = TransformRegistry> {
    gridsets: GridSetBroker,
    reprojector: R,
    config: PlannerConfig,
}

impl<R: Reprojector> InvalidationPlanner<R> {
    /// A planner with the default [`PlannerConfig`].
    pub fn new(gridsets: GridSetBroker, reprojector: R) -> Self {
        Self {
            gridsets,
            reprojector,
            config: PlannerConfig::default(),
        }
    }

    /// Replace the planner's tunables.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// The planner's tunables.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The known grid sets.
    pub fn gridsets(&self) -> &GridSetBroker {
        &self.gridsets
    }

    /// Plan the invalidation of `layer` for a diff geometry in the layer's coordinates.
    ///
    /// A failure on one grid is logged and recorded in
    /// [`InvalidationPlan::skipped`]; the other grids are still planned.
    pub fn plan(&self, geometry: &DiffGeometry, layer: &LayerConfig) -> InvalidationPlan {
        let mut plan = InvalidationPlan::default();
        if geometry.is_empty() {
            debug!(layer = %layer.name, "empty diff, nothing to invalidate");
            return plan;
        }
        let source = Geometry::GeometryCollection(geometry.geometry().clone());
        let variants = style_parameters(layer);

        for subset in &layer.grid_subsets {
            match self.mask_for(&source, layer, subset) {
                Ok(Some(mask)) => {
                    let mask = Arc::new(mask);
                    for parameters in &variants {
                        for format in &layer.formats {
                            plan.tasks.push(InvalidationTask {
                                layer: layer.name.clone(),
                                gridset_id: subset.gridset.clone(),
                                zoom_start: mask.zoom_start(),
                                zoom_stop: mask.zoom_stop(),
                                format: format.clone(),
                                parameters: parameters.clone(),
                                mask: Arc::clone(&mask),
                            });
                        }
                    }
                }
                Ok(None) => {
                    debug!(
                        layer = %layer.name,
                        gridset = %subset.gridset,
                        "diff does not intersect the cached extent"
                    );
                    plan.skipped.push(SkippedGrid {
                        gridset_id: subset.gridset.clone(),
                        reason: SkipReason::OutsideCoverage,
                    });
                }
                Err(error) => {
                    warn!(
                        layer = %layer.name,
                        gridset = %subset.gridset,
                        %error,
                        "cannot plan invalidation for grid"
                    );
                    plan.skipped.push(SkippedGrid {
                        gridset_id: subset.gridset.clone(),
                        reason: SkipReason::Failed(error),
                    });
                }
            }
        }
        info!(
            layer = %layer.name,
            tasks = plan.tasks.len(),
            skipped = plan.skipped.len(),
            "invalidation planned"
        );
        plan
    }

    /// The coverage mask of `geometry` (in the layer's coordinates) on one grid
    /// of `layer`, `None` when it does not reach the cached extent.
    pub fn mask_for(
        &self,
        geometry: &Geometry<f64>,
        layer: &LayerConfig,
        subset: &GridSubsetConfig,
    ) -> Result<Option<TileCoverageMask>, PlanError> {
        let gridset = self
            .gridsets
            .get(&subset.gridset)
            .ok_or_else(|| PlanError::UnknownGridSet(subset.gridset.clone()))?;
        let grid = GridSubset::new(
            Arc::clone(gridset),
            subset.zoom_start,
            subset.zoom_stop,
            subset.extent_rect(),
        )?;
        let projected = self
            .reprojector
            .reproject(geometry, layer.srs, gridset.srs())?;

        let distance = self.buffer_distance(&grid);
        let buffered = buffer(&projected, distance, self.config.max_mitre_ratio);
        let tolerance = distance / 2.0;
        // Visvalingam-Whyatt thresholds are areas.
        let simplified = buffered.simplify_vw_preserve(tolerance * tolerance);
        debug!(
            gridset = %subset.gridset,
            distance,
            vertices_before = buffered.coords_count(),
            vertices_after = simplified.coords_count(),
            "buffered diff geometry"
        );

        let Some(envelope) = bounding_rect(&simplified) else {
            return Ok(None);
        };
        if !touches(envelope, grid.extent()) {
            return Ok(None);
        }
        let mask = TileCoverageMask::build(Geometry::MultiPolygon(simplified), &grid);
        Ok((!mask.is_empty()).then_some(mask))
    }

    /// Buffer distance for a grid subset: a few tiles of its finest level,
    /// capped at [`PlannerConfig::max_buffer_zoom`].
    pub fn buffer_distance(&self, grid: &GridSubset) -> f64 {
        let gridset = grid.gridset();
        let z = grid.zoom_stop().min(self.config.max_buffer_zoom);
        let resolution = gridset.resolution(z).unwrap_or_default();
        self.config.buffer_tiles * resolution * f64::from(gridset.tile_width())
    }
}

fn touches(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// The request parameters of every cached style, without duplicates.
fn style_parameters(layer: &LayerConfig) -> SmallVec<[BTreeMap<String, String>; 4]> {
    let mut variants: SmallVec<[BTreeMap<String, String>; 4]> = SmallVec::new();
    for style in layer.cached_styles() {
        let mut parameters = BTreeMap::new();
        if !layer.is_default_style(&style) {
            parameters.insert(STYLES_PARAMETER.to_owned(), style);
        }
        if !variants.contains(&parameters) {
            variants.push(parameters);
        }
    }
    variants
}

/// Grow `geometry` by `distance` with square caps and mitred joins.
///
/// Points become squares rather than polygonal circles.
fn buffer(geometry: &Geometry<f64>, distance: f64, mitre_ratio: f64) -> MultiPolygon<f64> {
    let mut parts = Vec::new();
    collect_buffers(geometry, distance, mitre_ratio, &mut parts);
    if parts.is_empty() {
        MultiPolygon(Vec::new())
    } else {
        unary_union(&parts)
    }
}

fn collect_buffers(
    geometry: &Geometry<f64>,
    distance: f64,
    mitre_ratio: f64,
    out: &mut Vec<Polygon<f64>>,
) {
    match geometry {
        Geometry::Point(p) => out.push(point_square(*p, distance)),
        Geometry::MultiPoint(mp) => out.extend(mp.iter().map(|p| point_square(*p, distance))),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_buffers(g, distance, mitre_ratio, out);
            }
        }
        other => {
            let style = BufferStyle::new(distance)
                .line_cap(LineCap::Square)
                .line_join(LineJoin::Miter(miter_angle(mitre_ratio)));
            out.extend(other.buffer_with_style(style));
        }
    }
}

/// Smallest corner angle, in radians, that is still mitred when mitres may
/// reach `mitre_ratio` times the buffer distance.
///
/// A corner of angle `a` has a mitre of length `distance / sin(a / 2)`, so the
/// ratio stays within `mitre_ratio` down to `2 * asin(1 / mitre_ratio)`.
/// Sharper corners are bevelled.
fn miter_angle(mitre_ratio: f64) -> f64 {
    2.0 * (1.0 / mitre_ratio.max(1.0)).asin()
}

fn point_square(p: Point<f64>, distance: f64) -> Polygon<f64> {
    let Coord { x, y } = p.0;
    rect_to_polygon(Rect::new(
        x - distance,
        y - distance,
        x + distance,
        y + distance,
    ))
}

/// Plan the invalidations of `layer` and return only the tasks.
pub fn plan_invalidations<R: Reprojector>(
    planner: &InvalidationPlanner<R>,
    geometry: &DiffGeometry,
    layer: &LayerConfig,
) -> Vec<InvalidationTask> {
    planner.plan(geometry, layer).tasks
}

/// Executes invalidation tasks against a tile cache.
pub trait TaskDispatcher {
    /// Hand one task to the cache.
    fn dispatch(&mut self, task: &InvalidationTask) -> Result<(), DispatchError>;
}

impl<F> TaskDispatcher for F
where
    F: FnMut(&InvalidationTask) -> Result<(), DispatchError>,
{
    fn dispatch(&mut self, task: &InvalidationTask) -> Result<(), DispatchError> {
        self(task)
    }
}

/// Counts of a [`dispatch`] run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Tasks accepted by the dispatcher.
    pub dispatched: usize,
    /// Tasks that failed.
    pub failed: usize,
}

/// Hand every task to `dispatcher`.
///
/// Failures are logged and do not stop the remaining tasks.
pub fn dispatch<D: TaskDispatcher + ?Sized>(
    tasks: &[InvalidationTask],
    dispatcher: &mut D,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for task in tasks {
        match dispatcher.dispatch(task) {
            Ok(()) => summary.dispatched += 1,
            Err(error) => {
                warn!(
                    layer = %task.layer,
                    gridset = %task.gridset_id,
                    format = %task.format,
                    %error,
                    "invalidation task failed"
                );
                summary.failed += 1;
            }
        }
    }
    summary
}
