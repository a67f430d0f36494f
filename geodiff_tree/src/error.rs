// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for tree resolution and diffing.

use thiserror::Error;

use crate::object::ObjectId;

/// Failure while reading objects from an [`ObjectStore`](crate::ObjectStore).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// The object is not present in the store.
    #[error("object {0} not found")]
    MissingObject(ObjectId),

    /// The backing store failed.
    #[error("object store failure: {message}")]
    Backend {
        /// What was being attempted.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Failure of a minimal diff bounds computation.
///
/// No partial geometry is ever returned alongside an error: a truncated diff
/// could under-invalidate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DiffError {
    /// A version reference does not resolve to a tree.
    #[error("reference '{0}' does not resolve to a tree")]
    ReferenceNotFound(String),

    /// The subtree named by a filter is a feature in one of the versions.
    #[error("'{0}' is not a tree")]
    NotATree(String),

    /// Reading a tree failed mid-walk.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
