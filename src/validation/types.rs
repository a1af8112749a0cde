// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Validator report types

use crate::geometry::{CellId, SegmentId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge statistics of one segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentTopology {
    pub segment: SegmentId,
    pub name: String,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub non_manifold_edge_count: usize,
}

impl SegmentTopology {
    /// Every edge is shared by exactly two cells
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count == 0 && self.non_manifold_edge_count == 0
    }
}

/// Topology validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyReport {
    /// Sum over segments of edges with neither 1 nor 2 incident cells
    pub non_manifold_edge_count: usize,
    /// Vertices sharing coordinates with a lower-id vertex
    pub duplicate_vertex_count: usize,
    /// Distinct edges whose endpoints sit at the positions of an earlier edge
    pub duplicate_edge_count: usize,
    /// Distinct cells whose corners sit at the positions of an earlier cell
    pub duplicate_cell_count: usize,
    /// Sum over segments of edges with one incident cell
    pub boundary_edge_count: usize,
    /// Distinct edges in the whole mesh
    pub edge_count: usize,
    pub segments: Vec<SegmentTopology>,
}

impl TopologyReport {
    pub fn defect_count(&self) -> usize {
        self.non_manifold_edge_count
            + self.duplicate_vertex_count
            + self.duplicate_edge_count
            + self.duplicate_cell_count
    }

    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0
    }
}

impl fmt::Display for TopologyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topology:")?;
        writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        writeln!(f, "  Duplicate vertices: {}", self.duplicate_vertex_count)?;
        writeln!(f, "  Duplicate edges: {}", self.duplicate_edge_count)?;
        writeln!(f, "  Duplicate cells: {}", self.duplicate_cell_count)?;
        write!(
            f,
            "  Edges: {} ({} boundary)",
            self.edge_count, self.boundary_edge_count
        )
    }
}

/// Self-intersections within one segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentGeometry {
    pub segment: SegmentId,
    pub name: String,
    /// Pairs that reached the exact test (all pairs without a broad phase)
    pub candidate_pairs: usize,
    /// Intersecting cell pairs, smaller id first, ascending
    pub intersecting_pairs: Vec<(CellId, CellId)>,
}

impl SegmentGeometry {
    pub fn intersection_count(&self) -> usize {
        self.intersecting_pairs.len()
    }
}

/// Geometry validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryReport {
    /// Sum of intersecting pairs over segments
    pub intersection_count: usize,
    pub candidate_pairs: usize,
    pub segments: Vec<SegmentGeometry>,
}

impl GeometryReport {
    pub fn is_clean(&self) -> bool {
        self.intersection_count == 0
    }

    /// All intersecting pairs across segments
    pub fn intersecting_pairs(&self) -> impl Iterator<Item = (CellId, CellId)> + '_ {
        self.segments
            .iter()
            .flat_map(|s| s.intersecting_pairs.iter().copied())
    }
}

impl fmt::Display for GeometryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Geometry:")?;
        writeln!(f, "  Self-intersections: {}", self.intersection_count)?;
        write!(f, "  Pairs tested: {}", self.candidate_pairs)
    }
}
