// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Interface sewing
//!
//! Vertices at bit-identical coordinates are merged into one. The result is
//! a fresh mesh: cell ids, cell vertex order and segment membership carry
//! over unchanged, only vertex ids are renumbered.

use crate::error::AdaptResult;
use crate::geometry::{PositionKey, SurfaceMesh, VertexId};
use ahash::AHashMap;
use tracing::{debug, info};

/// Sewn mesh plus the vertex renumbering that produced it
#[derive(Debug, Clone)]
pub struct SewResult {
    pub mesh: SurfaceMesh,
    /// New id of every input vertex
    pub remap: Vec<VertexId>,
    /// Input vertices folded into an earlier vertex at the same position
    pub merged_vertices: usize,
    /// Cells that now repeat a vertex id (kept, never dropped)
    pub collapsed_cells: usize,
}

/// Merge coincident vertices into a new mesh.
///
/// New ids follow the order in which positions are first seen, so the first
/// vertex at each position keeps the lowest id of its group.
pub fn sew(mesh: &SurfaceMesh) -> AdaptResult<SewResult> {
    mesh.require_cells("sewing")?;

    let mut canonical: AHashMap<PositionKey, VertexId> =
        AHashMap::with_capacity(mesh.vertex_count());
    let mut remap = Vec::with_capacity(mesh.vertex_count());
    let mut sewn = SurfaceMesh::with_capacity(mesh.dimension(), mesh.vertex_count(), mesh.cell_count());

    for vertex in mesh.vertices() {
        let key = PositionKey::new(&vertex.position);
        let id = match canonical.get(&key) {
            Some(&id) => id,
            None => {
                let id = sewn.add_vertex(vertex.position)?;
                canonical.insert(key, id);
                id
            }
        };
        remap.push(id);
    }

    let mut collapsed_cells = 0;
    for cell in mesh.cells() {
        let id = sewn.add_cell(cell.indices.map(|v| remap[v]))?;
        if sewn.cell(id).has_repeated_vertex() {
            collapsed_cells += 1;
        }
    }

    for segment in mesh.segments() {
        sewn.add_segment(segment.name.clone(), segment.cells.iter().copied())?;
        debug!(segment = %segment.name, cells = segment.cells.len(), "segment rebuilt");
    }

    let merged_vertices = mesh.vertex_count() - sewn.vertex_count();
    info!(
        vertices_before = mesh.vertex_count(),
        vertices_after = sewn.vertex_count(),
        merged_vertices,
        collapsed_cells,
        "sewing finished"
    );

    Ok(SewResult {
        mesh: sewn,
        remap,
        merged_vertices,
        collapsed_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdaptError;
    use crate::geometry::primitives::{glued_cubes, split_squares};
    use crate::geometry::Dimension;
    use nalgebra::Point3;

    #[test]
    fn test_split_squares_share_border_after_sewing() {
        let mesh = split_squares(2).unwrap();
        let result = sew(&mesh).unwrap();

        assert_eq!(result.merged_vertices, 3);
        assert_eq!(result.mesh.vertex_count(), 15);
        assert_eq!(result.mesh.cell_count(), mesh.cell_count());
        assert_eq!(result.collapsed_cells, 0);

        // Right border column (ids 9, 12, 15) now points at the left ids
        assert_eq!(result.remap[9], result.remap[2]);
        assert_eq!(result.remap[12], result.remap[5]);
        assert_eq!(result.remap[15], result.remap[8]);

        for (segment, original) in result.mesh.segments().iter().zip(mesh.segments()) {
            assert_eq!(segment.name, original.name);
            assert_eq!(segment.cells, original.cells);
        }
    }

    #[test]
    fn test_clean_mesh_is_unchanged() {
        let mesh = glued_cubes().unwrap();
        let result = sew(&mesh).unwrap();
        assert_eq!(result.merged_vertices, 0);
        assert_eq!(result.remap, (0..12).collect::<Vec<_>>());
        assert_eq!(result.mesh.cells(), mesh.cells());
        assert_eq!(result.mesh.interface_cells(), vec![10, 11]);
    }

    #[test]
    fn test_collapsed_cells_are_kept() {
        let mut mesh = SurfaceMesh::new(Dimension::Three);
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.add_vertex(Point3::new(p[0], p[1], p[2])).unwrap();
        }
        mesh.add_cell([0, 1, 2]).unwrap();
        mesh.add_cell([0, 2, 3]).unwrap();
        mesh.add_segment("s", [0, 1]).unwrap();

        let result = sew(&mesh).unwrap();
        assert_eq!(result.mesh.cell_count(), 2);
        assert_eq!(result.collapsed_cells, 1);
        assert_eq!(result.mesh.cell(0).indices, [0, 1, 1]);
        assert_eq!(result.mesh.cell(1).indices, [0, 1, 2]);
    }

    #[test]
    fn test_signed_zero_positions_merge() {
        let mut mesh = SurfaceMesh::new(Dimension::Three);
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.0, 0.0, -0.0]] {
            mesh.add_vertex(Point3::new(p[0], p[1], p[2])).unwrap();
        }
        mesh.add_cell([3, 1, 2]).unwrap();
        mesh.add_segment("s", [0]).unwrap();
        assert_eq!(sew(&mesh).unwrap().merged_vertices, 1);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let mesh = SurfaceMesh::new(Dimension::Two);
        assert!(matches!(sew(&mesh), Err(AdaptError::EmptyMesh { stage: "sewing" })));
    }
}
