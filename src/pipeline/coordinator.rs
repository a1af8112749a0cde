// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline driver - runs the stages in order on one exclusively owned mesh

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::config::PipelineConfig;
use super::types::{PipelineReport, SewingSummary, Stage};
use crate::adapt::{derive_normals, orient_with, sew, NormalField, Orientation};
use crate::error::{AdaptError, AdaptResult};
use crate::geometry::{GeometryKernel, RobustKernel, SurfaceMesh};
use crate::validation::{check_geometry_with, check_topology, GeometryCheckOptions, GeometryReport};

/// Everything the pipeline produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Oriented mesh, sewn when sewing is enabled
    pub mesh: SurfaceMesh,
    /// Orientation tables of the mesh before sewing
    pub orientation: Orientation,
    /// Normals of the oriented mesh. Cell ids survive sewing, so they index
    /// the output mesh as well.
    pub normals: NormalField,
    /// Vertex renumbering applied by sewing
    pub remap: Option<Vec<usize>>,
    pub report: PipelineReport,
    /// Whether the configured abort policy allows volume meshing
    pub ready: bool,
}

/// Orientation, normals, validation and sewing, strictly in sequence
pub struct AdaptationPipeline {
    config: PipelineConfig,
    kernel: Arc<dyn GeometryKernel>,
}

impl AdaptationPipeline {
    /// Create a pipeline using the exact kernel
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_kernel(config, Arc::new(RobustKernel))
    }

    pub fn with_kernel(config: PipelineConfig, kernel: Arc<dyn GeometryKernel>) -> Self {
        Self { config, kernel }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every enabled stage on `mesh`
    pub fn run(&self, mut mesh: SurfaceMesh) -> AdaptResult<PipelineOutcome> {
        mesh.require_cells("pipeline")?;
        let mut report =
            PipelineReport::new(mesh.vertex_count(), mesh.cell_count(), mesh.segment_count());

        let start = Instant::now();
        let orientation = orient_with(&mut mesh, self.kernel.as_ref())?;
        report.record_timing(Stage::Orientation, start.elapsed());
        report.orientation = orientation.report().clone();

        let start = Instant::now();
        let normals = derive_normals(&mesh, &orientation)?;
        report.record_timing(Stage::Normals, start.elapsed());
        report.normals = normals.report().clone();

        if self.config.check_topology {
            let start = Instant::now();
            report.topology = Some(check_topology(&mesh)?);
            report.record_timing(Stage::Topology, start.elapsed());
        }

        if self.config.check_geometry {
            let start = Instant::now();
            report.geometry = Some(self.check_geometry(&mesh)?);
            report.record_timing(Stage::Geometry, start.elapsed());
        }

        let mut remap = None;
        if self.config.sew {
            let start = Instant::now();
            let sewn = sew(&mesh)?;
            report.record_timing(Stage::Sewing, start.elapsed());
            report.sewing = Some(SewingSummary {
                vertices_before: mesh.vertex_count(),
                vertices_after: sewn.mesh.vertex_count(),
                merged_vertices: sewn.merged_vertices,
                collapsed_cells: sewn.collapsed_cells,
            });
            mesh = sewn.mesh;
            remap = Some(sewn.remap);
        }

        let ready = report.ready_for_volume_meshing(&self.config.abort_on);
        info!(
            defects = report.defect_count(),
            ready,
            seconds = report.total_duration.as_secs_f64(),
            "pipeline finished"
        );
        if !ready {
            warn!(
                reasons = ?report.blocking_reasons(&self.config.abort_on),
                "mesh is not ready for volume meshing"
            );
        }

        Ok(PipelineOutcome {
            mesh,
            orientation,
            normals,
            remap,
            report,
            ready,
        })
    }

    /// Geometry check, on a dedicated worker pool when parallelism is enabled
    fn check_geometry(&self, mesh: &SurfaceMesh) -> AdaptResult<GeometryReport> {
        let options = GeometryCheckOptions {
            parallel: self.config.parallel_geometry,
            broad_phase: self.config.broad_phase,
        };
        let kernel = self.kernel.as_ref();

        if !options.parallel {
            return check_geometry_with(mesh, kernel, &options);
        }

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.config.parallelism {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| AdaptError::ThreadPool(e.to_string()))?;
        pool.install(|| check_geometry_with(mesh, kernel, &options))
    }
}

impl Default for AdaptationPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
