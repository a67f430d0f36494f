// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for invalidation planning and dispatch.

use thiserror::Error;

use crate::grid::Srs;

/// Failure to plan the invalidation of one grid.
///
/// Planning errors are per grid: the planner records them and carries on with
/// the layer's other grids.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PlanError {
    /// No coordinate transform between the two systems.
    #[error("no transform from {from} to {to}")]
    Reprojection {
        /// Source system.
        from: Srs,
        /// Target system.
        to: Srs,
    },

    /// A grid subset names a grid set that is not registered.
    #[error("unknown grid set '{0}'")]
    UnknownGridSet(String),

    /// A grid or layer configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A layer configuration could not be parsed.
    #[error("malformed layer configuration")]
    Parse(#[from] serde_json::Error),
}

/// Failure reported by a [`TaskDispatcher`](crate::TaskDispatcher).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchError {
    /// The cache refused the task.
    #[error("task for layer '{layer}' on '{gridset_id}' rejected: {reason}")]
    Rejected {
        /// Layer of the task.
        layer: String,
        /// Grid of the task.
        gridset_id: String,
        /// Why it was refused.
        reason: String,
    },

    /// The cache backend failed.
    #[error("tile cache failure: {message}")]
    Backend {
        /// What was being attempted.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}
