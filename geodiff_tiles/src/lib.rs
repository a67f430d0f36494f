// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=geodiff_tiles --heading-base-level=0

//! Geodiff Tiles: from a diff geometry to tile cache invalidation tasks.
//!
//! - [`GridSet`], [`GridSubset`] and [`TileRange`] describe tiling schemes
//!   and the part of them a layer caches.
//! - [`TileCoverageMask`] records, per zoom level, which tiles a geometry may
//!   touch, with a one tile safety ring.
//! - [`InvalidationPlanner`] reprojects, buffers and simplifies a
//!   [`DiffGeometry`](geodiff_geom::DiffGeometry), then emits one
//!   [`InvalidationTask`] per grid, cached style and output format.
//! - [`dispatch`] hands tasks to a [`TaskDispatcher`], logging failures.
//!
//! Layers, grid sets and planner tunables can be loaded from JSON through
//! the [`config`] types.
//!
//! # Example
//!
//! ```rust
//! use geodiff_geom::{DiffGeometry, PointSet};
//! use geodiff_tiles::{
//!     GridSet, GridSetBroker, GridSubsetConfig, InvalidationPlanner, LayerConfig, Srs,
//!     TransformRegistry, plan_invalidations,
//! };
//! use kurbo::Rect;
//!
//! let mut gridsets = GridSetBroker::new();
//! gridsets.insert(GridSet::new(
//!     "unit",
//!     Srs::epsg(404000),
//!     Rect::new(0.0, 0.0, 256.0, 256.0),
//!     256,
//!     256,
//!     vec![1.0 / 16.0, 1.0 / 256.0],
//! ).unwrap());
//! let planner = InvalidationPlanner::new(gridsets, TransformRegistry::new());
//!
//! let mut layer = LayerConfig::new("roads", Srs::epsg(404000));
//! layer.grid_subsets.push(GridSubsetConfig::full("unit"));
//!
//! let mut points = PointSet::new();
//! points.add(50.0, 50.0);
//! let diff = DiffGeometry::union(points, Vec::new());
//!
//! let tasks = plan_invalidations(&planner, &diff, &layer);
//! assert_eq!(tasks.len(), 1);
//! assert!(tasks[0].mask.lookup(50, 50, 1));
//! ```
//!
//! ## `std`
//!
//! This crate links `std` for `geo` buffering and `serde_json` configuration.

pub mod config;
mod error;
mod grid;
mod mask;
mod planner;
mod reproject;

pub use config::{GridSetConfig, GridSubsetConfig, LayerConfig, PlannerConfig};
pub use error::{DispatchError, PlanError};
pub use grid::{GridSet, GridSetBroker, GridSubset, Srs, TileRange};
pub use mask::TileCoverageMask;
pub use planner::{
    DispatchSummary, InvalidationPlan, InvalidationPlanner, InvalidationTask, SkipReason,
    SkippedGrid, TaskDispatcher, dispatch, plan_invalidations,
};
pub use reproject::{Reprojector, TransformRegistry};
