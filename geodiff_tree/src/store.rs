// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object store abstraction and an in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;
use kurbo::Rect;
use sha2::{Digest, Sha256};

use crate::error::StorageError;
use crate::object::{Bucket, NodeKind, NodeRef, ObjectId, RevTree};

/// Maximum number of direct children before a tree is split into buckets.
pub const NORMALIZATION_LIMIT: usize = 512;

/// Number of buckets a tree is split into at each depth.
pub const BUCKETS_PER_TREE: u32 = 32;

/// Bucket nesting stops here even if a partition is still too large.
const MAX_BUCKET_DEPTH: usize = 8;

/// Canonical bucket for a child named `name` at bucket depth `depth`.
///
/// Both sides of a diff must agree on this function so that a leaf tree can be
/// partitioned to line up with a bucketed one.
pub fn bucket_index(name: &str, depth: usize) -> u32 {
    let digest = Sha256::digest(name.as_bytes());
    u32::from(digest[depth % digest.len()]) % BUCKETS_PER_TREE
}

/// Read access to versioned trees.
///
/// Implementations are expected to support concurrent read-only use; the diff
/// walker performs no locking of its own.
pub trait ObjectStore {
    /// Resolve a version reference (a ref name or a hex id) to a root tree id.
    ///
    /// Returns `Ok(None)` when the reference does not name a tree.
    fn resolve(&self, reference: &str) -> Result<Option<ObjectId>, StorageError>;

    /// Load a tree.
    fn get_tree(&self, id: ObjectId) -> Result<Arc<RevTree>, StorageError>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn resolve(&self, reference: &str) -> Result<Option<ObjectId>, StorageError> {
        (**self).resolve(reference)
    }

    fn get_tree(&self, id: ObjectId) -> Result<Arc<RevTree>, StorageError> {
        (**self).get_tree(id)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn resolve(&self, reference: &str) -> Result<Option<ObjectId>, StorageError> {
        (**self).resolve(reference)
    }

    fn get_tree(&self, id: ObjectId) -> Result<Arc<RevTree>, StorageError> {
        (**self).get_tree(id)
    }
}

/// An in-memory object store with named references.
///
/// ```rust
/// use geodiff_tree::{MemoryStore, ObjectStore, TreeBuilder};
/// use kurbo::Rect;
///
/// let mut store = MemoryStore::new();
/// let mut layer = TreeBuilder::new();
/// layer.put_feature("f1", Rect::new(0.0, 0.0, 1.0, 1.0));
/// let layer = layer.build(&mut store);
///
/// let mut root = TreeBuilder::new();
/// root.put_tree("roads", &layer);
/// let root = root.build(&mut store);
/// store.set_ref("HEAD", root.id());
///
/// assert_eq!(store.resolve("HEAD").unwrap(), Some(root.id()));
/// assert_eq!(store.get_tree(root.id()).unwrap().size(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MemoryStore {
    trees: HashMap<ObjectId, Arc<RevTree>>,
    refs: HashMap<String, ObjectId>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store holding only the empty tree.
    pub fn new() -> Self {
        let mut store = Self {
            trees: HashMap::new(),
            refs: HashMap::new(),
        };
        store.put_tree(RevTree::empty());
        store
    }

    /// Store a tree, returning the shared copy (an identical tree is reused).
    pub fn put_tree(&mut self, tree: RevTree) -> Arc<RevTree> {
        Arc::clone(
            self.trees
                .entry(tree.id())
                .or_insert_with(|| Arc::new(tree)),
        )
    }

    /// Point `name` at `id`, replacing any previous target.
    pub fn set_ref(&mut self, name: impl Into<String>, id: ObjectId) {
        self.refs.insert(name.into(), id);
    }

    /// Remove a reference, returning its previous target.
    pub fn remove_ref(&mut self, name: &str) -> Option<ObjectId> {
        self.refs.remove(name)
    }

    /// Whether a tree with this id is stored.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.trees.contains_key(&id)
    }

    /// Number of stored trees (including the empty tree).
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Always false: the empty tree is always present.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn resolve(&self, reference: &str) -> Result<Option<ObjectId>, StorageError> {
        if let Some(id) = self.refs.get(reference) {
            return Ok(self.contains(*id).then_some(*id));
        }
        Ok(ObjectId::from_hex(reference).filter(|id| self.contains(*id)))
    }

    fn get_tree(&self, id: ObjectId) -> Result<Arc<RevTree>, StorageError> {
        self.trees
            .get(&id)
            .cloned()
            .ok_or(StorageError::MissingObject(id))
    }
}

/// Mutable staging area that produces canonical [`RevTree`]s.
///
/// Children are kept sorted by name. On [`build`](TreeBuilder::build), trees
/// with more children than the normalization limit are split into buckets
/// with [`bucket_index`], recursively.
#[derive(Clone, Debug)]
pub struct TreeBuilder {
    children: BTreeMap<String, (NodeRef, u64)>,
    normalization_limit: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// An empty builder using [`NORMALIZATION_LIMIT`].
    pub fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            normalization_limit: NORMALIZATION_LIMIT,
        }
    }

    /// A builder pre-populated with the children of `tree`, flattening buckets.
    pub fn from_tree<S: ObjectStore + ?Sized>(
        store: &S,
        tree: &RevTree,
    ) -> Result<Self, StorageError> {
        let mut builder = Self::new();
        builder.collect(store, tree)?;
        Ok(builder)
    }

    fn collect<S: ObjectStore + ?Sized>(
        &mut self,
        store: &S,
        tree: &RevTree,
    ) -> Result<(), StorageError> {
        for child in tree.children() {
            let size = match child.kind() {
                NodeKind::Feature => 1,
                NodeKind::Tree => store.get_tree(child.object_id())?.size(),
            };
            self.children
                .insert(child.name().to_owned(), (child.clone(), size));
        }
        for bucket in tree.buckets().values() {
            let sub = store.get_tree(bucket.object_id())?;
            self.collect(store, &sub)?;
        }
        Ok(())
    }

    /// Override the number of children above which trees are bucketed.
    pub fn with_normalization_limit(mut self, limit: usize) -> Self {
        self.normalization_limit = limit.max(1);
        self
    }

    /// Add or replace a feature, deriving its id from its name and extent.
    pub fn put_feature(&mut self, name: impl Into<String>, extent: Rect) -> &mut Self {
        let name = name.into();
        let mut bytes = Vec::with_capacity(name.len() + 32);
        bytes.extend_from_slice(name.as_bytes());
        for v in [extent.x0, extent.y0, extent.x1, extent.y1] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let id = ObjectId::hash_of(&bytes);
        self.put_feature_with_id(name, id, Some(extent))
    }

    /// Add or replace a feature with an explicit id.
    pub fn put_feature_with_id(
        &mut self,
        name: impl Into<String>,
        id: ObjectId,
        extent: Option<Rect>,
    ) -> &mut Self {
        let name = name.into();
        let node = NodeRef::feature(name.clone(), id, extent);
        self.children.insert(name, (node, 1));
        self
    }

    /// Add or replace a nested tree.
    pub fn put_tree(&mut self, name: impl Into<String>, tree: &RevTree) -> &mut Self {
        let name = name.into();
        let node = tree.node_ref(name.clone());
        self.children.insert(name, (node, tree.size()));
        self
    }

    /// Remove a child by name. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.children.remove(name).is_some()
    }

    /// Number of direct children staged.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether no child is staged.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Build the tree (and any bucket trees) into `store`.
    pub fn build(&self, store: &mut MemoryStore) -> Arc<RevTree> {
        let entries: Vec<(NodeRef, u64)> = self.children.values().cloned().collect();
        build_level(store, entries, 0, self.normalization_limit)
    }
}

fn build_level(
    store: &mut MemoryStore,
    entries: Vec<(NodeRef, u64)>,
    depth: usize,
    limit: usize,
) -> Arc<RevTree> {
    let size = entries.iter().map(|(_, s)| s).sum();
    if entries.len() <= limit || depth >= MAX_BUCKET_DEPTH {
        let children = entries.into_iter().map(|(n, _)| n).collect();
        return store.put_tree(RevTree::leaf(children, size));
    }
    let mut parts: BTreeMap<u32, Vec<(NodeRef, u64)>> = BTreeMap::new();
    for entry in entries {
        parts
            .entry(bucket_index(entry.0.name(), depth))
            .or_default()
            .push(entry);
    }
    let mut buckets = BTreeMap::new();
    for (idx, part) in parts {
        let sub = build_level(store, part, depth + 1, limit);
        buckets.insert(idx, Bucket::new(sub.id(), sub.extent()));
    }
    store.put_tree(RevTree::bucketed(buckets, size))
}
