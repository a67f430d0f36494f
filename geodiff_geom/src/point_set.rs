// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-point geometry backed by a [`CoordAccumulator`].

use geo::{Coord, MultiPoint, Point};
use kurbo::Rect;

use crate::accumulator::CoordAccumulator;
use crate::envelope::Envelope;

/// A growable multi-point.
///
/// Point-level differences can number in the hundreds of thousands, so they are
/// kept as packed coordinates rather than one geometry value per point. The
/// set has no orientation or topology: [`reverse`](PointSet::reverse),
/// [`normalize`](PointSet::normalize) and [`simplify`](PointSet::simplify) are
/// identities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointSet {
    coords: CoordAccumulator,
}

impl PointSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing accumulator.
    pub fn from_accumulator(coords: CoordAccumulator) -> Self {
        Self { coords }
    }

    /// Append a point.
    pub fn add(&mut self, x: f64, y: f64) {
        self.coords.add(x, y);
    }

    /// The backing accumulator.
    pub fn accumulator(&self) -> &CoordAccumulator {
        &self.coords
    }

    /// Unwrap into the backing accumulator.
    pub fn into_accumulator(self) -> CoordAccumulator {
        self.coords
    }

    /// True if the set holds no point.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.coords.len()
    }

    /// Point `i` as a `geo` point.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.num_points()`.
    pub fn point_n(&self, i: usize) -> Point<f64> {
        let (x, y) = self.coords.get(i);
        Point::new(x, y)
    }

    /// All coordinates in insertion order.
    pub fn coords(&self) -> impl ExactSizeIterator<Item = Coord<f64>> + '_ {
        self.coords.iter().map(|(x, y)| Coord { x, y })
    }

    /// Bounding envelope, `None` when empty.
    pub fn envelope(&self) -> Option<Rect> {
        let mut env = Envelope::new();
        for (x, y) in self.coords.iter() {
            env.expand_to_include_point(x, y);
        }
        env.rect()
    }

    /// Copy the points out into a `geo` multi-point.
    pub fn to_multi_point(&self) -> MultiPoint<f64> {
        self.coords().map(Point::from).collect()
    }

    /// Identity: a point set has no orientation.
    pub fn reverse(&mut self) {}

    /// Identity: a point set has no canonical vertex order to restore.
    pub fn normalize(&mut self) {}

    /// Identity: there is nothing to simplify.
    pub fn simplify(&self, _tolerance: f64) -> Self {
        self.clone()
    }

    /// Coordinate-by-coordinate comparison within `tolerance`, in order.
    pub fn equals_exact(&self, other: &Self, tolerance: f64) -> bool {
        self.num_points() == other.num_points()
            && self
                .coords
                .iter()
                .zip(other.coords.iter())
                .all(|((ax, ay), (bx, by))| {
                    (ax - bx).abs() <= tolerance && (ay - by).abs() <= tolerance
                })
    }
}

impl From<CoordAccumulator> for PointSet {
    fn from(coords: CoordAccumulator) -> Self {
        Self::from_accumulator(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointSet {
        let mut ps = PointSet::new();
        ps.add(1.0, 2.0);
        ps.add(-3.0, 8.0);
        ps.add(4.0, 0.5);
        ps
    }

    #[test]
    fn envelope_covers_all_points() {
        assert_eq!(PointSet::new().envelope(), None);
        assert_eq!(sample().envelope(), Some(Rect::new(-3.0, 0.5, 4.0, 8.0)));
    }

    #[test]
    fn point_access_and_export() {
        let ps = sample();
        assert_eq!(ps.num_points(), 3);
        assert_eq!(ps.point_n(1), Point::new(-3.0, 8.0));
        let mp = ps.to_multi_point();
        assert_eq!(mp.0.len(), 3);
        assert_eq!(mp.0[2], Point::new(4.0, 0.5));
    }

    #[test]
    fn geometry_mutators_are_identities() {
        let mut ps = sample();
        let before = ps.clone();
        ps.reverse();
        ps.normalize();
        assert!(ps.equals_exact(&before, 0.0));
        assert!(ps.simplify(100.0).equals_exact(&before, 0.0));
    }

    #[test]
    fn equals_exact_respects_tolerance_and_order() {
        let a = sample();
        let mut b = PointSet::new();
        b.add(1.01, 2.0);
        b.add(-3.0, 8.0);
        b.add(4.0, 0.5);
        assert!(!a.equals_exact(&b, 0.001));
        assert!(a.equals_exact(&b, 0.02));

        let mut reordered = PointSet::new();
        reordered.add(-3.0, 8.0);
        reordered.add(1.0, 2.0);
        reordered.add(4.0, 0.5);
        assert!(!a.equals_exact(&reordered, 0.0));
    }
}
