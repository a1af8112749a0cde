// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology validator
//!
//! Diagnostic only: counts non-manifold edges per segment and entities that
//! duplicate another one's coordinates under a different id.

use super::types::{SegmentTopology, TopologyReport};
use crate::error::AdaptResult;
use crate::geometry::{cell_edges, Edge, PositionKey, SegmentAdjacency, SurfaceMesh};
use ahash::AHashSet;
use tracing::{debug, info, warn};

/// Check manifoldness and duplicates without touching the mesh
pub fn check_topology(mesh: &SurfaceMesh) -> AdaptResult<TopologyReport> {
    mesh.require_cells("topology check")?;

    let segments: Vec<SegmentTopology> = (0..mesh.segment_count())
        .map(|segment| {
            let adjacency = SegmentAdjacency::build(mesh, segment);
            let summary = SegmentTopology {
                segment,
                name: mesh.segment(segment).name.clone(),
                edge_count: adjacency.edge_count(),
                boundary_edge_count: adjacency.boundary_edge_count(),
                non_manifold_edge_count: adjacency.non_manifold_edge_count(),
            };
            if summary.non_manifold_edge_count > 0 {
                let edges: Vec<Edge> = adjacency.non_manifold_edges().collect();
                debug!(segment = %summary.name, ?edges, "non-manifold edges");
            }
            summary
        })
        .collect();

    let key = |v| PositionKey::new(mesh.position(v));

    let mut positions = AHashSet::with_capacity(mesh.vertex_count());
    let duplicate_vertex_count = mesh
        .vertices()
        .iter()
        .filter(|v| !positions.insert(PositionKey::new(&v.position)))
        .count();

    let edges: AHashSet<Edge> = mesh
        .cells()
        .iter()
        .flat_map(cell_edges)
        .filter(|e| e.v0 != e.v1)
        .collect();
    let edge_shapes: AHashSet<[PositionKey; 2]> = edges
        .iter()
        .map(|e| {
            let mut shape = [key(e.v0), key(e.v1)];
            shape.sort_unstable();
            shape
        })
        .collect();

    let cell_shapes: AHashSet<[PositionKey; 3]> = mesh
        .cells()
        .iter()
        .map(|c| {
            let mut shape = c.indices.map(key);
            shape.sort_unstable();
            shape
        })
        .collect();

    let report = TopologyReport {
        non_manifold_edge_count: segments.iter().map(|s| s.non_manifold_edge_count).sum(),
        duplicate_vertex_count,
        duplicate_edge_count: edges.len() - edge_shapes.len(),
        duplicate_cell_count: mesh.cell_count() - cell_shapes.len(),
        boundary_edge_count: segments.iter().map(|s| s.boundary_edge_count).sum(),
        edge_count: edges.len(),
        segments,
    };

    info!(
        non_manifold_edges = report.non_manifold_edge_count,
        duplicate_vertices = report.duplicate_vertex_count,
        duplicate_edges = report.duplicate_edge_count,
        duplicate_cells = report.duplicate_cell_count,
        boundary_edges = report.boundary_edge_count,
        "topology checked"
    );
    if !report.is_clean() {
        warn!(defects = report.defect_count(), "topology defects found");
    }

    Ok(report)
}
