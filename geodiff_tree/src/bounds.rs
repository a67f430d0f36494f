// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulating the extents of a diff into a single geometry.

use geodiff_geom::{DiffGeometry, Envelope, PointSet, Shape};
use kurbo::Rect;

use crate::object::{Bucket, NodeRef};
use crate::walk::{BucketIndex, Descend, DiffVisitor};

/// Collects the smallest set of extents covering every change of a walk.
///
/// A modified feature contributes the envelope of its old and new extents. A
/// tree or bucket that exists on one side only contributes its whole extent
/// once and is not descended. Extents are classified by [`Shape::classify`]:
/// points go into a packed [`PointSet`], everything else into a shape list,
/// and [`build`](Self::build) unions both in one pass.
#[derive(Clone, Debug, Default)]
pub struct BoundsDiffVisitor {
    points: PointSet,
    shapes: Vec<Shape>,
    scratch: Envelope,
}

impl BoundsDiffVisitor {
    /// An empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points accumulated so far.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Lines and rectangles accumulated so far.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Union everything accumulated.
    pub fn build(self) -> DiffGeometry {
        DiffGeometry::union(self.points, self.shapes)
    }

    fn add(&mut self, extent: Rect) {
        match Shape::classify(extent) {
            Shape::Point(c) => self.points.add(c.x, c.y),
            shape => self.shapes.push(shape),
        }
    }

    fn one_sided(&mut self, left: Option<Rect>, right: Option<Rect>, absent: bool) -> Descend {
        if !absent {
            return Descend::Yes;
        }
        if let Some(extent) = left.or(right) {
            self.add(extent);
        }
        Descend::No
    }
}

impl DiffVisitor for BoundsDiffVisitor {
    fn tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> Descend {
        self.one_sided(
            left.and_then(NodeRef::extent),
            right.and_then(NodeRef::extent),
            left.is_none() || right.is_none(),
        )
    }

    fn bucket(
        &mut self,
        _index: BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> Descend {
        self.one_sided(
            left.and_then(Bucket::extent),
            right.and_then(Bucket::extent),
            left.is_none() || right.is_none(),
        )
    }

    fn feature(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        for n in [left, right].into_iter().flatten() {
            n.expand(&mut self.scratch);
        }
        if let Some(extent) = self.scratch.rect() {
            self.add(extent);
        }
        self.scratch.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectId;

    fn feature(name: &str, r: Rect) -> NodeRef {
        NodeRef::feature(name, ObjectId::hash_of(name.as_bytes()), Some(r))
    }

    #[test]
    fn modified_feature_covers_old_and_new() {
        let mut v = BoundsDiffVisitor::new();
        let old = feature("a", Rect::new(0.0, 0.0, 1.0, 1.0));
        let new = feature("a", Rect::new(4.0, 4.0, 5.0, 5.0));
        v.feature(Some(&old), Some(&new));
        assert_eq!(v.shapes(), [Shape::Rect(Rect::new(0.0, 0.0, 5.0, 5.0))]);
    }

    #[test]
    fn point_features_go_to_the_point_set() {
        let mut v = BoundsDiffVisitor::new();
        let p = feature("p", Rect::new(3.0, 4.0, 3.0, 4.0));
        v.feature(Some(&p), None);
        v.feature(None, Some(&p));
        assert_eq!(v.points().num_points(), 2);
        assert!(v.shapes().is_empty());
    }

    #[test]
    fn features_without_extent_are_ignored() {
        let mut v = BoundsDiffVisitor::new();
        let n = NodeRef::feature("n", ObjectId::hash_of(b"n"), None);
        v.feature(Some(&n), None);
        assert!(v.build().is_empty());
    }

    #[test]
    fn one_sided_trees_are_pruned() {
        let mut v = BoundsDiffVisitor::new();
        let t = NodeRef::tree("t", ObjectId::hash_of(b"t"), Some(Rect::new(0.0, 0.0, 2.0, 2.0)));
        assert_eq!(v.tree(Some(&t), Some(&t)), Descend::Yes);
        assert!(v.shapes().is_empty());
        assert_eq!(v.tree(None, Some(&t)), Descend::No);
        assert_eq!(v.shapes().len(), 1);

        let b = Bucket::new(ObjectId::hash_of(b"b"), Some(Rect::new(5.0, 5.0, 5.0, 8.0)));
        let idx = BucketIndex { index: 3, depth: 0 };
        assert_eq!(v.bucket(idx, Some(&b), Some(&b)), Descend::Yes);
        assert_eq!(v.bucket(idx, Some(&b), None), Descend::No);
        assert!(matches!(v.shapes()[1], Shape::Line(_)));
    }
}
