// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronized pre-order walk over two versions of a tree.

use core::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::object::{Bucket, NodeKind, NodeRef, ObjectId, RevTree};
use crate::store::{ObjectStore, bucket_index};

/// Whether the walker should descend into the pair just reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Descend {
    /// Walk the children of the pair.
    Yes,
    /// Skip everything below the pair.
    No,
}

/// Position of a bucket within a bucketed tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BucketIndex {
    /// Bucket number, as produced by [`bucket_index`].
    pub index: u32,
    /// Nesting depth of the bucket below its tree, starting at 0.
    pub depth: usize,
}

/// Receives the differences found by a [`DiffWalker`].
///
/// Every event has at least one side present. When both are present their ids
/// differ: identical content is never reported. A one-sided event is an
/// addition (`left` absent) or a removal (`right` absent).
pub trait DiffVisitor {
    /// A pair of trees differs, or a tree exists on one side only.
    ///
    /// The two roots are reported first, with empty names.
    fn tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> Descend;

    /// All children of a descended tree pair have been reported.
    fn end_tree(&mut self, _left: Option<&NodeRef>, _right: Option<&NodeRef>) {}

    /// A pair of buckets differs, or a bucket exists on one side only.
    fn bucket(
        &mut self,
        index: BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> Descend;

    /// All children of a descended bucket pair have been reported.
    fn end_bucket(
        &mut self,
        _index: BucketIndex,
        _left: Option<&Bucket>,
        _right: Option<&Bucket>,
    ) {
    }

    /// A feature was added, removed or modified.
    fn feature(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>);
}

impl<V: DiffVisitor + ?Sized> DiffVisitor for &mut V {
    fn tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) -> Descend {
        (**self).tree(left, right)
    }

    fn end_tree(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        (**self).end_tree(left, right);
    }

    fn bucket(
        &mut self,
        index: BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> Descend {
        (**self).bucket(index, left, right)
    }

    fn end_bucket(&mut self, index: BucketIndex, left: Option<&Bucket>, right: Option<&Bucket>) {
        (**self).end_bucket(index, left, right);
    }

    fn feature(&mut self, left: Option<&NodeRef>, right: Option<&NodeRef>) {
        (**self).feature(left, right);
    }
}

/// Number of events a walk reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// `tree` events, including the root pair.
    pub trees: usize,
    /// `bucket` events.
    pub buckets: usize,
    /// `feature` events.
    pub features: usize,
}

impl WalkStats {
    /// Sum of all events.
    pub fn total(&self) -> usize {
        self.trees + self.buckets + self.features
    }
}

/// Walks two trees in lockstep and reports their differences to a [`DiffVisitor`].
///
/// Subtrees with equal ids are skipped without being loaded, so the cost of a
/// walk is proportional to the size of the change, not of the trees. The
/// left tree is read from `left_source` and the right one from
/// `right_source`, which may be the same store.
///
/// ```rust
/// use geodiff_tree::{Descend, DiffVisitor, DiffWalker, MemoryStore, NodeRef, Bucket, BucketIndex, TreeBuilder};
/// use kurbo::Rect;
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
///
/// impl DiffVisitor for Names {
///     fn tree(&mut self, _: Option<&NodeRef>, _: Option<&NodeRef>) -> Descend {
///         Descend::Yes
///     }
///     fn bucket(&mut self, _: BucketIndex, _: Option<&Bucket>, _: Option<&Bucket>) -> Descend {
///         Descend::Yes
///     }
///     fn feature(&mut self, l: Option<&NodeRef>, r: Option<&NodeRef>) {
///         self.0.push(l.or(r).unwrap().name().to_owned());
///     }
/// }
///
/// let mut store = MemoryStore::new();
/// let mut b = TreeBuilder::new();
/// b.put_feature("a", Rect::new(0.0, 0.0, 1.0, 1.0));
/// let old = b.build(&mut store);
/// b.put_feature("b", Rect::new(2.0, 2.0, 3.0, 3.0));
/// let new = b.build(&mut store);
///
/// let mut names = Names::default();
/// let stats = DiffWalker::new(old, new, &store, &store).walk(&mut names).unwrap();
/// assert_eq!(names.0, ["b"]);
/// assert_eq!(stats.features, 1);
/// ```
#[derive(Debug)]
pub struct DiffWalker<L, R> {
    left_root: Arc<RevTree>,
    right_root: Arc<RevTree>,
    left_source: L,
    right_source: R,
}

impl<L: ObjectStore, R: ObjectStore> DiffWalker<L, R> {
    /// Prepare a walk of `left_root` against `right_root`.
    pub fn new(
        left_root: Arc<RevTree>,
        right_root: Arc<RevTree>,
        left_source: L,
        right_source: R,
    ) -> Self {
        Self {
            left_root,
            right_root,
            left_source,
            right_source,
        }
    }

    /// Run the walk.
    ///
    /// A storage failure aborts the walk; events reported before it are not
    /// retracted, so callers should discard the visitor's state on error.
    pub fn walk<V: DiffVisitor>(&self, visitor: &mut V) -> Result<WalkStats, StorageError> {
        let mut walk = Walk {
            left: &self.left_source,
            right: &self.right_source,
            visitor,
            stats: WalkStats::default(),
        };
        if self.left_root.id() != self.right_root.id() {
            let l = self.left_root.node_ref("");
            let r = self.right_root.node_ref("");
            walk.stats.trees += 1;
            if walk.visitor.tree(Some(&l), Some(&r)) == Descend::Yes {
                walk.compare(
                    Contents::of(Some(self.left_root.as_ref())),
                    Contents::of(Some(self.right_root.as_ref())),
                    0,
                )?;
                walk.visitor.end_tree(Some(&l), Some(&r));
            }
        }
        Ok(walk.stats)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Order `(this side, other side)` as `(left, right)`.
    fn arrange<T>(self, this: T, other: T) -> (T, T) {
        match self {
            Self::Left => (this, other),
            Self::Right => (other, this),
        }
    }
}

/// What one side of a tree pair holds at the current level.
enum Contents<'t> {
    Nodes(Vec<&'t NodeRef>),
    Buckets(&'t BTreeMap<u32, Bucket>),
}

impl<'t> Contents<'t> {
    fn of(tree: Option<&'t RevTree>) -> Self {
        match tree {
            Some(t) if t.is_bucketed() => Self::Buckets(t.buckets()),
            Some(t) => Self::Nodes(t.children().iter().collect()),
            None => Self::Nodes(Vec::new()),
        }
    }
}

struct Walk<'w, L, R, V> {
    left: &'w L,
    right: &'w R,
    visitor: &'w mut V,
    stats: WalkStats,
}

impl<L: ObjectStore, R: ObjectStore, V: DiffVisitor> Walk<'_, L, R, V> {
    fn load(&self, side: Side, id: ObjectId) -> Result<Arc<RevTree>, StorageError> {
        match side {
            Side::Left => self.left.get_tree(id),
            Side::Right => self.right.get_tree(id),
        }
    }

    fn compare(
        &mut self,
        left: Contents<'_>,
        right: Contents<'_>,
        depth: usize,
    ) -> Result<(), StorageError> {
        match (left, right) {
            (Contents::Nodes(l), Contents::Nodes(r)) => self.nodes(&l, &r),
            (Contents::Buckets(l), Contents::Buckets(r)) => self.buckets(l, r, depth),
            (Contents::Nodes(l), Contents::Buckets(r)) => self.mixed(l, r, depth, Side::Left),
            (Contents::Buckets(l), Contents::Nodes(r)) => self.mixed(r, l, depth, Side::Right),
        }
    }

    /// Merge-join two name-sorted child lists.
    fn nodes(&mut self, left: &[&NodeRef], right: &[&NodeRef]) -> Result<(), StorageError> {
        let (mut i, mut j) = (0, 0);
        while i < left.len() || j < right.len() {
            let order = match (left.get(i), right.get(j)) {
                (Some(a), Some(b)) => a.name().cmp(b.name()),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match order {
                Ordering::Less => {
                    self.node_pair(Some(left[i]), None)?;
                    i += 1;
                }
                Ordering::Greater => {
                    self.node_pair(None, Some(right[j]))?;
                    j += 1;
                }
                Ordering::Equal => {
                    let (a, b) = (left[i], right[j]);
                    if a.kind() != b.kind() {
                        // A feature replaced by a tree (or the reverse) is a
                        // removal plus an addition.
                        self.node_pair(Some(a), None)?;
                        self.node_pair(None, Some(b))?;
                    } else if a.object_id() != b.object_id() {
                        self.node_pair(Some(a), Some(b))?;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(())
    }

    fn node_pair(
        &mut self,
        left: Option<&NodeRef>,
        right: Option<&NodeRef>,
    ) -> Result<(), StorageError> {
        let Some(kind) = left.or(right).map(NodeRef::kind) else {
            return Ok(());
        };
        match kind {
            NodeKind::Feature => {
                self.stats.features += 1;
                self.visitor.feature(left, right);
                Ok(())
            }
            NodeKind::Tree => self.tree_pair(left, right),
        }
    }

    fn tree_pair(
        &mut self,
        left: Option<&NodeRef>,
        right: Option<&NodeRef>,
    ) -> Result<(), StorageError> {
        self.stats.trees += 1;
        if self.visitor.tree(left, right) == Descend::No {
            return Ok(());
        }
        let lt = left
            .map(|n| self.load(Side::Left, n.object_id()))
            .transpose()?;
        let rt = right
            .map(|n| self.load(Side::Right, n.object_id()))
            .transpose()?;
        self.compare(Contents::of(lt.as_deref()), Contents::of(rt.as_deref()), 0)?;
        self.visitor.end_tree(left, right);
        Ok(())
    }

    fn buckets(
        &mut self,
        left: &BTreeMap<u32, Bucket>,
        right: &BTreeMap<u32, Bucket>,
        depth: usize,
    ) -> Result<(), StorageError> {
        let mut keys: Vec<u32> = left.keys().chain(right.keys()).copied().collect();
        keys.sort_unstable();
        keys.dedup();
        for index in keys {
            let (l, r) = (left.get(&index), right.get(&index));
            if let (Some(a), Some(b)) = (l, r)
                && a.object_id() == b.object_id()
            {
                continue;
            }
            self.bucket_pair(BucketIndex { index, depth }, l, r)?;
        }
        Ok(())
    }

    fn bucket_pair(
        &mut self,
        index: BucketIndex,
        left: Option<&Bucket>,
        right: Option<&Bucket>,
    ) -> Result<(), StorageError> {
        self.stats.buckets += 1;
        if self.visitor.bucket(index, left, right) == Descend::No {
            return Ok(());
        }
        let lt = left
            .map(|b| self.load(Side::Left, b.object_id()))
            .transpose()?;
        let rt = right
            .map(|b| self.load(Side::Right, b.object_id()))
            .transpose()?;
        self.compare(
            Contents::of(lt.as_deref()),
            Contents::of(rt.as_deref()),
            index.depth + 1,
        )?;
        self.visitor.end_bucket(index, left, right);
        Ok(())
    }

    /// Compare a plain child list on `nodes_side` with buckets on the other side.
    ///
    /// The children are partitioned with [`bucket_index`] at `depth` so that each
    /// partition lines up with the bucket that would hold it.
    fn mixed(
        &mut self,
        nodes: Vec<&NodeRef>,
        buckets: &BTreeMap<u32, Bucket>,
        depth: usize,
        nodes_side: Side,
    ) -> Result<(), StorageError> {
        let mut parts: BTreeMap<u32, Vec<&NodeRef>> = BTreeMap::new();
        for n in nodes {
            parts.entry(bucket_index(n.name(), depth)).or_default().push(n);
        }
        let mut keys: Vec<u32> = parts.keys().chain(buckets.keys()).copied().collect();
        keys.sort_unstable();
        keys.dedup();
        for index in keys {
            match (parts.remove(&index), buckets.get(&index)) {
                (Some(part), Some(bucket)) => {
                    let tree = self.load(nodes_side.other(), bucket.object_id())?;
                    let (l, r) = nodes_side.arrange(
                        Contents::Nodes(part),
                        Contents::of(Some(&tree)),
                    );
                    self.compare(l, r, depth + 1)?;
                }
                (Some(part), None) => {
                    let (l, r) = nodes_side.arrange(part, Vec::new());
                    self.nodes(&l, &r)?;
                }
                (None, Some(bucket)) => {
                    let (l, r) = nodes_side.arrange(None, Some(bucket));
                    self.bucket_pair(BucketIndex { index, depth }, l, r)?;
                }
                (None, None) => {}
            }
        }
        Ok(())
    }
}
