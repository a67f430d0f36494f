// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The minimal diff bounds operation.

use geodiff_geom::DiffGeometry;
use tracing::debug;

use crate::bounds::BoundsDiffVisitor;
use std::sync::Arc;

use crate::error::{DiffError, StorageError};
use crate::filter::PathFilter;
use crate::object::{NodeKind, NodeRef, RevTree};
use crate::store::{ObjectStore, bucket_index};
use crate::walk::DiffWalker;

/// Version compared against when none is given.
pub const DEFAULT_OLD_VERSION: &str = "HEAD";

/// Version compared when none is given.
pub const DEFAULT_NEW_VERSION: &str = "WORK_HEAD";

/// Computes the geometry covering every change between two versions.
///
/// ```rust
/// use geodiff_tree::{MemoryStore, MinimalDiffBounds, TreeBuilder};
/// use kurbo::Rect;
///
/// let mut store = MemoryStore::new();
/// let mut b = TreeBuilder::new();
/// b.put_feature("a", Rect::new(0.0, 0.0, 1.0, 1.0));
/// let head = b.build(&mut store);
/// b.put_feature("b", Rect::new(4.0, 4.0, 6.0, 6.0));
/// let work = b.build(&mut store);
/// store.set_ref("HEAD", head.id());
/// store.set_ref("WORK_HEAD", work.id());
///
/// let bounds = MinimalDiffBounds::new().call(&store).unwrap();
/// assert_eq!(bounds.polygons().count(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MinimalDiffBounds {
    old_version: String,
    new_version: String,
    tree_name: Option<String>,
}

impl Default for MinimalDiffBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimalDiffBounds {
    /// Compare [`DEFAULT_OLD_VERSION`] with [`DEFAULT_NEW_VERSION`] over the whole tree.
    pub fn new() -> Self {
        Self {
            old_version: DEFAULT_OLD_VERSION.to_owned(),
            new_version: DEFAULT_NEW_VERSION.to_owned(),
            tree_name: None,
        }
    }

    /// Set the old version reference.
    pub fn old_version(mut self, reference: impl Into<String>) -> Self {
        self.old_version = reference.into();
        self
    }

    /// Set the new version reference.
    pub fn new_version(mut self, reference: impl Into<String>) -> Self {
        self.new_version = reference.into();
        self
    }

    /// Only consider changes below the top-level subtree `name`.
    pub fn tree_name(mut self, name: impl Into<String>) -> Self {
        self.tree_name = Some(name.into());
        self
    }

    /// Run against a single store.
    pub fn call<S: ObjectStore + ?Sized>(&self, store: &S) -> Result<DiffGeometry, DiffError> {
        self.call_with_sources(store, store)
    }

    /// Run with the old version read from `left` and the new one from `right`.
    pub fn call_with_sources<L: ObjectStore, R: ObjectStore>(
        &self,
        left: L,
        right: R,
    ) -> Result<DiffGeometry, DiffError> {
        let left_id = left
            .resolve(&self.old_version)?
            .ok_or_else(|| DiffError::ReferenceNotFound(self.old_version.clone()))?;
        let right_id = right
            .resolve(&self.new_version)?
            .ok_or_else(|| DiffError::ReferenceNotFound(self.new_version.clone()))?;
        let left_root = left.get_tree(left_id)?;
        let right_root = right.get_tree(right_id)?;
        if let Some(name) = &self.tree_name {
            ensure_tree(&left, &left_root, name)?;
            ensure_tree(&right, &right_root, name)?;
        }

        let mut visitor = BoundsDiffVisitor::new();
        let walker = DiffWalker::new(left_root, right_root, left, right);
        let stats = match &self.tree_name {
            Some(name) => walker.walk(&mut PathFilter::new(&mut visitor, name.as_str()))?,
            None => walker.walk(&mut visitor)?,
        };
        debug!(
            old = %self.old_version,
            new = %self.new_version,
            tree = ?self.tree_name,
            trees = stats.trees,
            buckets = stats.buckets,
            features = stats.features,
            points = visitor.points().num_points(),
            shapes = visitor.shapes().len(),
            "diff walk finished"
        );
        Ok(visitor.build())
    }
}

fn ensure_tree<S: ObjectStore + ?Sized>(
    store: &S,
    root: &Arc<RevTree>,
    name: &str,
) -> Result<(), DiffError> {
    match find_child(store, root, name)? {
        Some(child) if child.kind() == NodeKind::Feature => {
            Err(DiffError::NotATree(name.to_owned()))
        }
        _ => Ok(()),
    }
}

/// The direct child `name` of `root`, following buckets down to the leaf
/// tree that would hold it.
fn find_child<S: ObjectStore + ?Sized>(
    store: &S,
    root: &Arc<RevTree>,
    name: &str,
) -> Result<Option<NodeRef>, StorageError> {
    let mut tree = Arc::clone(root);
    let mut depth = 0;
    while tree.is_bucketed() {
        let Some(bucket) = tree.buckets().get(&bucket_index(name, depth)) else {
            return Ok(None);
        };
        tree = store.get_tree(bucket.object_id())?;
        depth += 1;
    }
    Ok(tree.child(name).cloned())
}

/// Geometry covering every change between `old_ref` and `new_ref` in `store`,
/// optionally restricted to the top-level subtree `subtree_filter`.
pub fn compute_minimal_diff_bounds<S: ObjectStore + ?Sized>(
    store: &S,
    old_ref: &str,
    new_ref: &str,
    subtree_filter: Option<&str>,
) -> Result<DiffGeometry, DiffError> {
    let mut op = MinimalDiffBounds::new()
        .old_version(old_ref)
        .new_version(new_ref);
    if let Some(name) = subtree_filter {
        op = op.tree_name(name);
    }
    op.call(store)
}
