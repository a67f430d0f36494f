// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Restricting a diff to one named subtree of the root.

use crate::object::{Bucket, NodeRef};
use crate::walk::{BucketIndex, Descend, DiffVisitor};

/// A [`DiffVisitor`] decorator that only forwards events for one top-level subtree.
///
/// Directly below the root, tree and feature events whose name is neither
/// empty nor the requested one are dropped and not descended. Buckets of the
/// root carry no name: they are descended without being forwarded, so that the
/// named entries inside them can be filtered. Everything inside the requested
/// subtree is forwarded unchanged.
#[derive(Clone, Debug)]
pub struct PathFilter<V> {
    inner: V,
    name: String,
    /// Number of descended tree pairs enclosing the current event.
    depth: usize,
}

impl<V: DiffVisitor> PathFilter<V> {
    /// Wrap `inner`, keeping only the subtree called `name`.
    pub fn new(inner: V, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            depth: 0,
        }
    }

    /// The subtree name being kept.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped visitor.
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwrap the visitor.
    pub fn into_inner(self) -> V {
        self.inner
    }

    fn accepts(&self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> bool {
        if self.depth != 1 {
            return true;
        }
        [left, right]
            .into_iter()
            .flatten()
            .all(|n| n.name().is_empty() || n.name() == self.name)
    }
}

impl<V: DiffVisitor> DiffVisitor for PathFilter<V> {
    fn tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> Descend {
        if !self.accepts(left, right) {
            return Descend::No;
        }
        let descend = self.inner.tree(left, right);
        if descend == Descend::Yes {
            self.depth += 1;
        }
        descend
    }

    fn end_tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        self.depth = self.depth.saturating_sub(1);
        self.inner.end_tree(left, right);
    }

    fn bucket(
        &mut self,
        index: BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> Descend {
        if self.depth == 1 {
            Descend::Yes
        } else {
            self.inner.bucket(index, left, right)
        }
    }

    fn end_bucket(&mut self, index: BucketIndex, left: Option<&Bucket>, right: Option<&Bucket>) {
        if self.depth != 1 {
            self.inner.end_bucket(index, left, right);
        }
    }

    fn feature(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        if self.accepts(left, right) {
            self.inner.feature(left, right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TreeBuilder};
    use crate::walk::DiffWalker;
    use kurbo::Rect;

    #[derive(Default)]
    struct Names {
        trees: Vec<String>,
        features: Vec<String>,
        buckets: usize,
    }

    impl DiffVisitor for Names {
        fn tree(&mut self, l: Option<&NodeRef>, r: Option<&NodeRef>) -> Descend {
            self.trees
                .extend(l.or(r).map(|n| n.name().to_owned()));
            Descend::Yes
        }

        fn bucket(&mut self, _: BucketIndex, _: Option<&Bucket>, _: Option<&Bucket>) -> Descend {
            self.buckets += 1;
            Descend::Yes
        }

        fn feature(&mut self, l: Option<&NodeRef>, r: Option<&NodeRef>) {
            self.features
                .extend(l.or(r).map(|n| n.name().to_owned()));
        }
    }

    fn layer(prefix: &str, n: usize, limit: usize) -> TreeBuilder {
        let mut b = TreeBuilder::new().with_normalization_limit(limit);
        for i in 0..n {
            let x = i as f64;
            b.put_feature(format!("{prefix}{i}"), Rect::new(x, x, x + 1.0, x + 1.0));
        }
        b
    }

    #[test]
    fn only_the_named_subtree_is_forwarded() {
        let mut store = MemoryStore::new();
        let roads = layer("r", 2, 512).build(&mut store);
        let rivers = layer("w", 2, 512).build(&mut store);
        let old = TreeBuilder::new().build(&mut store);
        let mut root = TreeBuilder::new();
        root.put_tree("roads", &roads);
        root.put_tree("rivers", &rivers);
        root.put_feature("loose", Rect::new(0.0, 0.0, 1.0, 1.0));
        let new = root.build(&mut store);

        let mut filter = PathFilter::new(Names::default(), "roads");
        DiffWalker::new(old, new, &store, &store)
            .walk(&mut filter)
            .unwrap();
        let names = filter.into_inner();
        assert_eq!(names.trees, ["", "roads"]);
        assert_eq!(names.features, ["r0", "r1"]);
    }

    #[test]
    fn bucketed_root_is_filtered_by_name() {
        let mut store = MemoryStore::new();
        let roads = layer("r", 3, 512).build(&mut store);
        let old = TreeBuilder::new().build(&mut store);
        let mut root = layer("x", 40, 8);
        root.put_tree("roads", &roads);
        let new = root.build(&mut store);
        assert!(new.is_bucketed());

        let mut filter = PathFilter::new(Names::default(), "roads");
        DiffWalker::new(old, new, &store, &store)
            .walk(&mut filter)
            .unwrap();
        let names = filter.into_inner();
        assert_eq!(names.trees, ["", "roads"]);
        assert_eq!(names.features, ["r0", "r1", "r2"]);
        assert_eq!(names.buckets, 0);
    }
}
