// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Contract-violation errors for mesh adaptation stages.
//!
//! Mesh defects (inconsistent orientation, non-manifold edges,
//! self-intersections, ...) are not errors: every stage counts them in its
//! report. The variants here are reserved for inputs a stage cannot work on.

use thiserror::Error;

/// Result type for adaptation operations.
pub type AdaptResult<T> = Result<T, AdaptError>;

/// Errors raised when a stage receives input that breaks its contract.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdaptError {
    /// The stage needs at least one cell (or segment) to work on.
    #[error("mesh is empty: {stage} requires at least one cell and one segment")]
    EmptyMesh {
        /// Stage that rejected the mesh.
        stage: &'static str,
    },

    /// A cell references a vertex id outside the store.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex {
        /// The invalid index.
        index: usize,
        /// Number of vertices in the store.
        vertex_count: usize,
    },

    /// A segment references a cell id outside the store.
    #[error("invalid cell index {index} (mesh has {cell_count} cells)")]
    InvalidCellIndex {
        /// The invalid index.
        index: usize,
        /// Number of cells in the store.
        cell_count: usize,
    },

    /// A cell was added to a third segment.
    #[error("cell {cell} already belongs to two segments and cannot join `{segment}`")]
    MembershipOverflow {
        /// Cell id.
        cell: usize,
        /// Name of the segment that tried to claim it.
        segment: String,
    },

    /// A segment name is already taken.
    #[error("segment `{0}` already exists")]
    DuplicateSegmentName(String),

    /// A point does not fit the mesh dimensionality.
    #[error("vertex has z = {z} but the mesh is two-dimensional")]
    DimensionMismatch {
        /// The offending z coordinate.
        z: f64,
    },

    /// Orientation tables were computed for a different mesh.
    #[error("orientation covers {found} cells but the mesh has {expected}")]
    OrientationMismatch {
        /// Cells in the mesh.
        expected: usize,
        /// Cells covered by the orientation tables.
        found: usize,
    },

    /// The worker pool for parallel checks could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

