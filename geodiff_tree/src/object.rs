// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable objects of a versioned spatial tree.

use core::fmt;
use std::collections::BTreeMap;

use geodiff_geom::Envelope;
use kurbo::Rect;
use sha2::{Digest, Sha256};

/// Content hash identifying an object.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// The all-zero id, never produced by hashing in practice.
    pub const NULL: Self = Self([0; 32]);

    /// Wrap raw hash bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of `bytes`.
    pub fn hash_of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Parse a 64 character lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.is_ascii() {
            return None;
        }
        let mut out = [0_u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }

    /// Whether this is [`ObjectId::NULL`].
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId(")?;
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

/// What a [`NodeRef`] points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A nested [`RevTree`].
    Tree,
    /// A feature (leaf) with a spatial extent.
    Feature,
}

/// A named child entry of a [`RevTree`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRef {
    name: String,
    object_id: ObjectId,
    kind: NodeKind,
    extent: Option<Rect>,
}

impl NodeRef {
    /// Entry for a nested tree.
    pub fn tree(name: impl Into<String>, object_id: ObjectId, extent: Option<Rect>) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind: NodeKind::Tree,
            extent: extent.map(|r| r.abs()),
        }
    }

    /// Entry for a feature.
    pub fn feature(name: impl Into<String>, object_id: ObjectId, extent: Option<Rect>) -> Self {
        Self {
            name: name.into(),
            object_id,
            kind: NodeKind::Feature,
            extent: extent.map(|r| r.abs()),
        }
    }

    /// Name, unique within the parent tree. Empty for roots.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the referenced object.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Tree or feature.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Pre-computed extent, `None` for trees without features.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Grow `env` to include this node's extent.
    pub fn expand(&self, env: &mut Envelope) {
        if let Some(r) = self.extent {
            env.expand_to_include(r);
        }
    }
}

/// One partition of a bucketed [`RevTree`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bucket {
    object_id: ObjectId,
    extent: Option<Rect>,
}

impl Bucket {
    /// A bucket pointing at the tree `object_id`.
    pub fn new(object_id: ObjectId, extent: Option<Rect>) -> Self {
        Self {
            object_id,
            extent: extent.map(|r| r.abs()),
        }
    }

    /// Id of the bucket's tree.
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Extent of everything below the bucket.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Grow `env` to include this bucket's extent.
    pub fn expand(&self, env: &mut Envelope) {
        if let Some(r) = self.extent {
            env.expand_to_include(r);
        }
    }
}

/// An immutable tree object.
///
/// A tree either lists its children directly (sorted by name) or, once it grows
/// past the normalization limit, splits them into [`Bucket`]s keyed by
/// [`bucket_index`](crate::bucket_index). It never holds both.
#[derive(Clone, Debug, PartialEq)]
pub struct RevTree {
    id: ObjectId,
    size: u64,
    children: Vec<NodeRef>,
    buckets: BTreeMap<u32, Bucket>,
    extent: Option<Rect>,
}

impl RevTree {
    /// The tree with no children.
    pub fn empty() -> Self {
        Self::leaf(Vec::new(), 0)
    }

    /// A tree listing `children` directly. `size` is the number of features below it.
    pub fn leaf(mut children: Vec<NodeRef>, size: u64) -> Self {
        children.sort_by(|a, b| a.name.cmp(&b.name));
        let mut env = Envelope::new();
        let mut hasher = Sha256::new();
        hasher.update(b"tree\0");
        hasher.update(size.to_le_bytes());
        for c in &children {
            c.expand(&mut env);
            hasher.update([match c.kind {
                NodeKind::Tree => 1_u8,
                NodeKind::Feature => 2_u8,
            }]);
            hasher.update((c.name.len() as u64).to_le_bytes());
            hasher.update(c.name.as_bytes());
            hasher.update(c.object_id.0);
            hash_extent(&mut hasher, c.extent);
        }
        Self {
            id: ObjectId(hasher.finalize().into()),
            size,
            children,
            buckets: BTreeMap::new(),
            extent: env.rect(),
        }
    }

    /// A tree split into `buckets`. `size` is the number of features below it.
    pub fn bucketed(buckets: BTreeMap<u32, Bucket>, size: u64) -> Self {
        let mut env = Envelope::new();
        let mut hasher = Sha256::new();
        hasher.update(b"buckets\0");
        hasher.update(size.to_le_bytes());
        for (idx, b) in &buckets {
            b.expand(&mut env);
            hasher.update(idx.to_le_bytes());
            hasher.update(b.object_id.0);
            hash_extent(&mut hasher, b.extent);
        }
        Self {
            id: ObjectId(hasher.finalize().into()),
            size,
            children: Vec::new(),
            buckets,
            extent: env.rect(),
        }
    }

    /// Content id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Number of features below this tree.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// True if the tree has neither children nor buckets.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.buckets.is_empty()
    }

    /// Direct children sorted by name (empty for bucketed trees).
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Direct child trees.
    pub fn trees(&self) -> impl Iterator<Item = &NodeRef> + '_ {
        self.children.iter().filter(|c| c.kind == NodeKind::Tree)
    }

    /// Direct features.
    pub fn features(&self) -> impl Iterator<Item = &NodeRef> + '_ {
        self.children.iter().filter(|c| c.kind == NodeKind::Feature)
    }

    /// Child with the given name.
    pub fn child(&self, name: &str) -> Option<&NodeRef> {
        self.children
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.children[i])
    }

    /// Buckets by index (empty for leaf trees).
    pub fn buckets(&self) -> &BTreeMap<u32, Bucket> {
        &self.buckets
    }

    /// Whether the tree is split into buckets.
    pub fn is_bucketed(&self) -> bool {
        !self.buckets.is_empty()
    }

    /// Extent of all features below, `None` when there are none with extents.
    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    /// Grow `env` to include this tree's extent.
    pub fn expand(&self, env: &mut Envelope) {
        if let Some(r) = self.extent {
            env.expand_to_include(r);
        }
    }

    /// A tree entry named `name` pointing at this tree.
    pub fn node_ref(&self, name: impl Into<String>) -> NodeRef {
        NodeRef::tree(name, self.id, self.extent)
    }
}

fn hash_extent(hasher: &mut Sha256, extent: Option<Rect>) {
    match extent {
        Some(r) => {
            hasher.update([1_u8]);
            for v in [r.x0, r.y0, r.x1, r.y1] {
                hasher.update(v.to_le_bytes());
            }
        }
        None => hasher.update([0_u8]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let id = ObjectId::hash_of(b"geodiff");
        let hex = id.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(ObjectId::from_hex(&hex), Some(id));
        assert_eq!(ObjectId::from_hex("zz"), None);
    }

    #[test]
    fn tree_id_depends_on_content_not_order() {
        let a = NodeRef::feature("a", ObjectId::hash_of(b"a"), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
        let b = NodeRef::feature("b", ObjectId::hash_of(b"b"), Some(Rect::new(2.0, 2.0, 3.0, 3.0)));
        let t1 = RevTree::leaf(vec![a.clone(), b.clone()], 2);
        let t2 = RevTree::leaf(vec![b.clone(), a], 2);
        assert_eq!(t1.id(), t2.id());
        assert_eq!(t1.extent(), Some(Rect::new(0.0, 0.0, 3.0, 3.0)));
        let t3 = RevTree::leaf(vec![b], 1);
        assert_ne!(t1.id(), t3.id());
    }

    #[test]
    fn child_lookup_by_name() {
        let t = RevTree::leaf(
            vec![
                NodeRef::feature("b", ObjectId::hash_of(b"b"), None),
                NodeRef::tree("a", ObjectId::hash_of(b"a"), None),
            ],
            1,
        );
        assert_eq!(t.child("a").map(NodeRef::kind), Some(NodeKind::Tree));
        assert_eq!(t.child("b").map(NodeRef::kind), Some(NodeKind::Feature));
        assert!(t.child("c").is_none());
        assert_eq!(t.trees().count(), 1);
        assert_eq!(t.features().count(), 1);
    }

    #[test]
    fn empty_tree_has_no_extent() {
        let t = RevTree::empty();
        assert!(t.is_empty());
        assert_eq!(t.extent(), None);
        assert_eq!(t.id(), RevTree::empty().id());
    }
}
