// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshadapt
//!
//! Prepares a segmented (multi-region) triangle surface for volume meshing:
//! consistent outward orientation per region, per-region normals for cells
//! shared between regions, topology and self-intersection checks, and
//! sewing of coincident vertices.

pub mod adapt;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use adapt::{derive_normals, orient, sew, NormalField, Orientation, SewResult};
pub use error::{AdaptError, AdaptResult};
pub use geometry::{Dimension, GeometryKernel, Primitive, RobustKernel, SurfaceMesh};
pub use pipeline::{AdaptationPipeline, PipelineConfig, PipelineOutcome, PipelineReport};
pub use validation::{check_geometry, check_topology, GeometryReport, TopologyReport};

/// Run the full pipeline with the default configuration
pub fn adapt_mesh(mesh: SurfaceMesh) -> AdaptResult<PipelineOutcome> {
    AdaptationPipeline::default().run(mesh)
}
