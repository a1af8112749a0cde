// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge adjacency within a segment
//!
//! Adjacency is derived on demand and never stored in the mesh: two cells are
//! neighbours when they share an edge inside the same segment. Flipping a
//! cell's winding does not change its edges, so an adjacency built before
//! orientation stays valid after it.

use super::mesh::{Cell, CellId, SegmentId, SurfaceMesh, VertexId};
use ahash::AHashMap;
use nalgebra::Point3;

/// Undirected edge, stored with the smaller vertex id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub v0: VertexId,
    pub v1: VertexId,
}

impl Edge {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a < b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }
}

/// The three edges of a cell, in the order of its vertex cycle
pub fn cell_edges(cell: &Cell) -> [Edge; 3] {
    let [a, b, c] = cell.indices;
    [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
}

/// Whether two cells sharing an edge traverse it in opposite directions.
///
/// Consistent iff there are positions `i` in `c1` and `j` in `c2` with
/// `c1[i] == c2[j + 1]` and `c1[i + 1] == c2[j]` (indices mod 3).
pub fn consistently_oriented(c1: &Cell, c2: &Cell) -> bool {
    let (a, b) = (&c1.indices, &c2.indices);
    (0..3).any(|i| (0..3).any(|j| a[i] == b[(j + 1) % 3] && a[(i + 1) % 3] == b[j]))
}

/// Whether two cells traverse a shared edge in the same direction
pub fn inconsistently_oriented(c1: &Cell, c2: &Cell) -> bool {
    let (a, b) = (&c1.indices, &c2.indices);
    (0..3).any(|i| (0..3).any(|j| a[i] == b[j] && a[(i + 1) % 3] == b[(j + 1) % 3]))
}

/// Edge-to-cell incidence of one segment
#[derive(Debug, Clone)]
pub struct SegmentAdjacency {
    segment: SegmentId,
    edge_to_cells: AHashMap<Edge, Vec<CellId>>,
}

impl SegmentAdjacency {
    /// Build adjacency for the cells of `segment`
    pub fn build(mesh: &SurfaceMesh, segment: SegmentId) -> Self {
        let cells = &mesh.segment(segment).cells;
        let mut edge_to_cells: AHashMap<Edge, Vec<CellId>> =
            AHashMap::with_capacity(cells.len() * 3 / 2 + 1);

        for &cell in cells {
            for edge in cell_edges(mesh.cell(cell)) {
                let incident = edge_to_cells.entry(edge).or_default();
                // A cell with a repeated vertex lists the same edge twice
                if !incident.contains(&cell) {
                    incident.push(cell);
                }
            }
        }

        Self {
            segment,
            edge_to_cells,
        }
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Cells of the segment incident to an edge
    pub fn cells_for_edge(&self, edge: &Edge) -> &[CellId] {
        self.edge_to_cells.get(edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells sharing at least one edge with `cell`, without repeats
    pub fn neighbors(&self, mesh: &SurfaceMesh, cell: CellId) -> Vec<CellId> {
        let mut result = Vec::with_capacity(3);
        for edge in cell_edges(mesh.cell(cell)) {
            for &other in self.cells_for_edge(&edge) {
                if other != cell && !result.contains(&other) {
                    result.push(other);
                }
            }
        }
        result
    }

    /// Every edge with its incident cells
    pub fn edges(&self) -> impl Iterator<Item = (&Edge, &[CellId])> + '_ {
        self.edge_to_cells
            .iter()
            .map(|(edge, cells)| (edge, cells.as_slice()))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to_cells.len()
    }

    /// Edges with exactly one incident cell
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_cells.values().filter(|c| c.len() == 1).count()
    }

    /// Edges incident to neither one (boundary) nor two (interior) cells
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edge_to_cells
            .iter()
            .filter(|(_, cells)| cells.len() > 2)
            .map(|(&edge, _)| edge)
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.non_manifold_edges().count()
    }
}

/// Exact coordinate key; `-0.0` and `0.0` map to the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey([u64; 3]);

impl PositionKey {
    pub fn new(point: &Point3<f64>) -> Self {
        let bits = |x: f64| if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() };
        Self([bits(point.x), bits(point.y), bits(point.z)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimension;

    fn strip() -> SurfaceMesh {
        // Three triangles fanned around edge (0, 1), plus one neighbour
        let mut mesh = SurfaceMesh::new(Dimension::Three);
        for p in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 1.0, 0.0],
            [0.5, -1.0, 0.0],
            [0.5, 0.0, 1.0],
            [1.5, 1.0, 0.0],
        ] {
            mesh.add_vertex(Point3::new(p[0], p[1], p[2])).unwrap();
        }
        mesh.add_cell([0, 1, 2]).unwrap();
        mesh.add_cell([1, 0, 3]).unwrap();
        mesh.add_cell([0, 1, 4]).unwrap();
        mesh.add_cell([1, 5, 2]).unwrap();
        mesh.add_segment("fan", [0, 1, 2, 3]).unwrap();
        mesh.add_segment("pair", [0, 1]).unwrap();
        mesh
    }

    #[test]
    fn test_edge_normalization() {
        assert_eq!(Edge::new(3, 1), Edge::new(1, 3));
        assert_eq!(Edge::new(3, 1).v0, 1);
    }

    #[test]
    fn test_consistency_predicate() {
        let a = Cell::new([0, 1, 2]);
        assert!(consistently_oriented(&a, &Cell::new([1, 0, 3])));
        assert!(!consistently_oriented(&a, &Cell::new([0, 1, 3])));
        assert!(inconsistently_oriented(&a, &Cell::new([0, 1, 3])));
        assert!(!consistently_oriented(&a, &Cell::new([4, 5, 6])));
    }

    #[test]
    fn test_non_manifold_edges_are_per_segment() {
        let mesh = strip();
        let fan = SegmentAdjacency::build(&mesh, 0);
        assert_eq!(fan.non_manifold_edge_count(), 1);
        assert_eq!(fan.non_manifold_edges().next(), Some(Edge::new(0, 1)));
        assert_eq!(fan.cells_for_edge(&Edge::new(1, 0)).len(), 3);

        let pair = SegmentAdjacency::build(&mesh, 1);
        assert_eq!(pair.non_manifold_edge_count(), 0);
        assert_eq!(pair.boundary_edge_count(), 4);
        assert_eq!(pair.edge_count(), 5);
    }

    #[test]
    fn test_neighbors() {
        let mesh = strip();
        let fan = SegmentAdjacency::build(&mesh, 0);
        let mut around_first = fan.neighbors(&mesh, 0);
        around_first.sort_unstable();
        assert_eq!(around_first, vec![1, 2, 3]);
        assert_eq!(fan.neighbors(&mesh, 3), vec![0]);
    }

    #[test]
    fn test_position_key_merges_signed_zero() {
        let a = PositionKey::new(&Point3::new(0.0, 1.0, -0.0));
        let b = PositionKey::new(&Point3::new(-0.0, 1.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, PositionKey::new(&Point3::new(0.0, 1.0, 1e-300)));
    }
}
