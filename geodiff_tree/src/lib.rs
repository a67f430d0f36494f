// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=geodiff_tree --heading-base-level=0

//! Geodiff Tree: diffing content-addressed spatial trees.
//!
//! Versions of a dataset are stored as immutable [`RevTree`]s whose entries
//! carry pre-computed extents and whose ids are content hashes. Two versions
//! can be compared by walking both trees in lockstep and skipping every pair of
//! identical ids, which makes the cost of a diff proportional to the change.
//!
//! - [`DiffWalker`] drives the walk and reports events to a [`DiffVisitor`].
//! - [`PathFilter`] restricts a walk to one top-level subtree.
//! - [`BoundsDiffVisitor`] accumulates the extents of a walk into a
//!   [`DiffGeometry`](geodiff_geom::DiffGeometry).
//! - [`MinimalDiffBounds`] ties it together: resolve two references, walk,
//!   union.
//!
//! [`MemoryStore`] and [`TreeBuilder`] provide an in-process [`ObjectStore`].
//!
//! # Example
//!
//! ```rust
//! use geodiff_tree::{MemoryStore, TreeBuilder, compute_minimal_diff_bounds};
//! use kurbo::Rect;
//!
//! let mut store = MemoryStore::new();
//! let mut roads = TreeBuilder::new();
//! roads.put_feature("p", Rect::new(50.0, 50.0, 50.0, 50.0));
//! let mut root = TreeBuilder::new();
//! root.put_tree("roads", &roads.build(&mut store));
//! let head = root.build(&mut store).id();
//! store.set_ref("HEAD", head);
//!
//! roads.remove("p");
//! roads.put_feature("a", Rect::new(10.0, 10.0, 12.0, 12.0));
//! root.put_tree("roads", &roads.build(&mut store));
//! let work = root.build(&mut store).id();
//! store.set_ref("WORK_HEAD", work);
//!
//! let g = compute_minimal_diff_bounds(&store, "HEAD", "WORK_HEAD", Some("roads")).unwrap();
//! assert_eq!(g.polygons().count(), 1);
//! assert_eq!(g.points().count(), 1);
//! ```
//!
//! ## Buckets
//!
//! Trees with more than [`NORMALIZATION_LIMIT`] children are split into
//! [`BUCKETS_PER_TREE`] buckets by [`bucket_index`]. The walker handles
//! bucketed trees on either or both sides.
//!
//! ## `std`
//!
//! This crate links `std`. Trees are shared through `std::sync::Arc` and object
//! ids hash owned names with `sha2`.

mod bounds;
mod error;
mod filter;
mod object;
mod op;
mod store;
mod walk;

pub use bounds::BoundsDiffVisitor;
pub use error::{DiffError, StorageError};
pub use filter::PathFilter;
pub use object::{Bucket, NodeKind, NodeRef, ObjectId, RevTree};
pub use op::{
    DEFAULT_NEW_VERSION, DEFAULT_OLD_VERSION, MinimalDiffBounds, compute_minimal_diff_bounds,
};
pub use store::{
    BUCKETS_PER_TREE, MemoryStore, NORMALIZATION_LIMIT, ObjectStore, TreeBuilder, bucket_index,
};
pub use walk::{BucketIndex, Descend, DiffVisitor, DiffWalker, WalkStats};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_index_is_stable_and_in_range() {
        for depth in 0..40 {
            let i = bucket_index("feature.42", depth);
            assert!(i < BUCKETS_PER_TREE);
            assert_eq!(i, bucket_index("feature.42", depth));
        }
    }

    #[test]
    fn store_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();
        assert_send_sync::<RevTree>();
    }
}
