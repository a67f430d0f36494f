// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=geodiff_geom --heading-base-level=0

//! Geodiff Geom: compact accumulation of change extents and their union.
//!
//! This crate holds the geometry side of a minimal-diff-bounds computation:
//!
//! - [`CoordAccumulator`]: a packed `f32` point buffer with borrowed [`AccumulatorView`]s.
//! - [`PointSet`]: a multi-point backed by the accumulator.
//! - [`Envelope`]: a reusable bounding rectangle with an explicit null state.
//! - [`Shape`]: an extent classified as a point, a line or a rectangle.
//! - [`DiffGeometry`]: the single union of everything accumulated.
//!
//! Extents are expressed as [`kurbo::Rect`]. Union and the geometry types of the
//! result come from the `geo` crate.
//!
//! # Example
//!
//! ```rust
//! use geodiff_geom::{DiffGeometry, PointSet, Shape};
//! use kurbo::Rect;
//!
//! let mut points = PointSet::new();
//! let mut shapes = Vec::new();
//! for extent in [
//!     Rect::new(5.0, 5.0, 5.0, 5.0),
//!     Rect::new(5.0, 5.0, 5.0, 9.0),
//!     Rect::new(5.0, 5.0, 9.0, 9.0),
//! ] {
//!     match Shape::classify(extent) {
//!         Shape::Point(c) => points.add(c.x, c.y),
//!         other => shapes.push(other),
//!     }
//! }
//! let g = DiffGeometry::union(points, shapes);
//! // The point and the line lie on the rectangle, only the polygon remains.
//! assert_eq!(g.num_parts(), 1);
//! ```
//!
//! ### Precision
//!
//! Points are stored in single precision. Consumers that derive tile coverage
//! from the result are expected to pad it (see `geodiff_tiles`).
//!
//! ## `std`
//!
//! This crate links `std`, which the `geo` union requires.

mod accumulator;
mod envelope;
mod geometry;
mod point_set;
mod shape;
mod util;

pub use accumulator::{AccumulatorView, CoordAccumulator, INITIAL_CAPACITY, ViewIter};
pub use envelope::Envelope;
pub use geometry::DiffGeometry;
pub use point_set::PointSet;
pub use shape::Shape;
pub use util::{bounding_rect, rect_to_polygon};
