// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-segment outward normals
//!
//! A cell's canonical order is outward for the segment whose sweep fixed it
//! (sign +1). For every other membership the sign is carried across shared
//! edges from cells of that segment whose sign is already known: same sign
//! across a consistently traversed edge, opposite sign otherwise.

use super::orientation::Orientation;
use crate::error::{AdaptError, AdaptResult};
use crate::geometry::adjacency::inconsistently_oriented;
use crate::geometry::{
    consistently_oriented, CellId, Membership, SegmentAdjacency, SegmentId, SurfaceMesh,
};
use crate::utils::math;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, warn};

/// Normal derivation diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalReport {
    pub interface_cells: usize,
    /// Interface cells whose two signs are equal
    pub sign_conflicts: usize,
    /// (cell, segment) memberships left without a sign
    pub unresolved: usize,
    /// Cells with zero area; they have signs but no normal
    pub degenerate_cells: usize,
}

impl NormalReport {
    pub fn is_clean(&self) -> bool {
        self.sign_conflicts == 0 && self.unresolved == 0
    }
}

/// Signs and outward normals per (cell, segment) membership
#[derive(Debug, Clone)]
pub struct NormalField {
    membership: Vec<Membership>,
    signs: Vec<[Option<i8>; 2]>,
    normals: Vec<Option<Vector3<f64>>>,
    conflicts: Vec<CellId>,
    report: NormalReport,
}

impl NormalField {
    /// +1 when the canonical order faces outward for `segment`, -1 when it
    /// faces inward, `None` when the cell is not in the segment or the sign
    /// could not be resolved.
    pub fn sign(&self, cell: CellId, segment: SegmentId) -> Option<i8> {
        let slot = self.membership[cell].slot_of(segment)?;
        self.signs[cell][slot]
    }

    /// Unit normal of `cell` pointing out of `segment`
    pub fn normal(&self, cell: CellId, segment: SegmentId) -> Option<Vector3<f64>> {
        let sign = self.sign(cell, segment)?;
        self.normals[cell].map(|n| n * f64::from(sign))
    }

    /// Unit normal of the canonical vertex order
    pub fn canonical_normal(&self, cell: CellId) -> Option<Vector3<f64>> {
        self.normals[cell]
    }

    /// Interface cells with equal signs on both sides, ascending
    pub fn conflicts(&self) -> &[CellId] {
        &self.conflicts
    }

    pub fn report(&self) -> &NormalReport {
        &self.report
    }
}

/// Derive per-segment signs and normals from an oriented mesh.
///
/// Takes the orientation outcome so normals can only be derived once every
/// segment has been oriented.
pub fn derive_normals(mesh: &SurfaceMesh, orientation: &Orientation) -> AdaptResult<NormalField> {
    mesh.require_cells("normal derivation")?;
    if orientation.cell_count() != mesh.cell_count() {
        return Err(AdaptError::OrientationMismatch {
            expected: mesh.cell_count(),
            found: orientation.cell_count(),
        });
    }

    let cell_count = mesh.cell_count();
    let membership: Vec<Membership> = (0..cell_count).map(|c| mesh.membership(c)).collect();
    let mut signs = vec![[None; 2]; cell_count];

    for (cell, cell_signs) in signs.iter_mut().enumerate() {
        let slot = orientation
            .owner(cell)
            .and_then(|owner| membership[cell].slot_of(owner));
        if let Some(slot) = slot {
            cell_signs[slot] = Some(1);
        }
    }

    for segment in 0..mesh.segment_count() {
        resolve_segment(mesh, &membership, &mut signs, segment);
    }

    let normals: Vec<Option<Vector3<f64>>> =
        (0..cell_count).map(|c| math::unit_normal(&mesh.triangle(c))).collect();

    let mut report = NormalReport::default();
    let mut conflicts = Vec::new();
    for cell in 0..cell_count {
        let m = membership[cell];
        if m.count() == 0 {
            continue;
        }
        if normals[cell].is_none() {
            report.degenerate_cells += 1;
        }
        report.unresolved += signs[cell][..m.count()].iter().filter(|s| s.is_none()).count();
        if m.is_interface() {
            report.interface_cells += 1;
            if let [Some(a), Some(b)] = signs[cell] {
                if a == b {
                    conflicts.push(cell);
                }
            }
        }
    }
    report.sign_conflicts = conflicts.len();

    info!(
        interface_cells = report.interface_cells,
        sign_conflicts = report.sign_conflicts,
        unresolved = report.unresolved,
        degenerate_cells = report.degenerate_cells,
        "normals derived"
    );
    if !conflicts.is_empty() {
        warn!(cells = ?conflicts, "interface cells face the same way for both segments");
    }

    Ok(NormalField {
        membership,
        signs,
        normals,
        conflicts,
        report,
    })
}

/// Fill unknown signs of one segment by breadth-first transfer across edges
fn resolve_segment(
    mesh: &SurfaceMesh,
    membership: &[Membership],
    signs: &mut [[Option<i8>; 2]],
    segment: SegmentId,
) {
    let cells = &mesh.segment(segment).cells;
    let slot = |cell: CellId| membership[cell].slot_of(segment).unwrap_or(0);

    let mut queue: VecDeque<CellId> = cells
        .iter()
        .copied()
        .filter(|&c| signs[c][slot(c)].is_some())
        .collect();

    // A segment made only of cells wound by its neighbours starts from them
    if queue.is_empty() {
        for &cell in cells {
            let other_sign = membership[cell]
                .other(segment)
                .and_then(|other| membership[cell].slot_of(other))
                .and_then(|other_slot| signs[cell][other_slot]);
            if let Some(other_sign) = other_sign {
                signs[cell][slot(cell)] = Some(-other_sign);
                queue.push_back(cell);
            }
        }
    }

    if queue.len() == cells.len() {
        return;
    }

    let adjacency = SegmentAdjacency::build(mesh, segment);
    while let Some(cell) = queue.pop_front() {
        let Some(sign) = signs[cell][slot(cell)] else {
            continue;
        };
        for neighbor in adjacency.neighbors(mesh, cell) {
            if signs[neighbor][slot(neighbor)].is_some() {
                continue;
            }
            let (a, b) = (mesh.cell(cell), mesh.cell(neighbor));
            let derived = if consistently_oriented(a, b) {
                sign
            } else if inconsistently_oriented(a, b) {
                -sign
            } else {
                continue;
            };
            signs[neighbor][slot(neighbor)] = Some(derived);
            queue.push_back(neighbor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapt::orientation::orient;
    use crate::geometry::primitives::{glued_cubes, sleeved_core};
    use crate::geometry::{Dimension, Primitive};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_glued_cubes_interface_signs_are_opposite() {
        let mut mesh = glued_cubes().unwrap();
        let orientation = orient(&mut mesh).unwrap();
        let field = derive_normals(&mesh, &orientation).unwrap();

        assert!(field.report().is_clean());
        assert_eq!(field.report().interface_cells, 2);
        for cell in [10, 11] {
            assert_eq!(field.sign(cell, 0), Some(1));
            assert_eq!(field.sign(cell, 1), Some(-1));
            let into_right = field.normal(cell, 1).unwrap();
            assert_relative_eq!(into_right, Vector3::new(-1.0, 0.0, 0.0));
            assert_relative_eq!(field.canonical_normal(cell).unwrap(), Vector3::x());
        }
    }

    #[test]
    fn test_normals_point_out_of_each_segment() {
        let mut mesh = glued_cubes().unwrap();
        mesh.flip_cell(4);
        mesh.flip_cell(18);
        let orientation = orient(&mut mesh).unwrap();
        let field = derive_normals(&mesh, &orientation).unwrap();

        let centers = [Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 0.5, 0.5)];
        for (segment, center) in centers.iter().enumerate() {
            for &cell in &mesh.segment(segment).cells {
                let outward = mesh.barycenter(cell) - center;
                let normal = field.normal(cell, segment).unwrap();
                assert!(normal.dot(&outward) > 0.0, "cell {cell} in segment {segment}");
            }
        }
        assert_eq!(field.sign(0, 1), None);
    }

    #[test]
    fn test_sleeved_core_interface_signs_are_opposite() {
        let mut mesh = sleeved_core().unwrap();
        mesh.flip_cell(35);
        let orientation = orient(&mut mesh).unwrap();
        let field = derive_normals(&mesh, &orientation).unwrap();

        assert!(field.report().is_clean());
        assert_eq!(field.report().interface_cells, 8);
        let axis = Point3::new(1.5, 1.5, 0.5);
        for cell in 24..32 {
            assert_eq!(field.sign(cell, 0), Some(1));
            assert_eq!(field.sign(cell, 1), Some(-1));
            let out_of_core = mesh.barycenter(cell) - axis;
            assert!(field.normal(cell, 1).unwrap().dot(&out_of_core) > 0.0, "cell {cell}");
        }
        for cell in 32..36 {
            assert_eq!(field.sign(cell, 1), Some(1));
        }
    }

    #[test]
    fn test_segment_owning_no_cells_takes_opposite_signs() {
        let mut mesh = Primitive::unit_cube().to_mesh("outer").unwrap();
        mesh.add_segment("mirror", 0..12).unwrap();
        let orientation = orient(&mut mesh).unwrap();
        let field = derive_normals(&mesh, &orientation).unwrap();

        assert!(field.report().is_clean());
        assert_eq!(field.report().interface_cells, 12);
        let center = Point3::new(0.5, 0.5, 0.5);
        for cell in 0..12 {
            assert_eq!(field.sign(cell, 0), Some(1));
            assert_eq!(field.sign(cell, 1), Some(-1));
            let inward = center - mesh.barycenter(cell);
            assert!(field.normal(cell, 1).unwrap().dot(&inward) > 0.0, "cell {cell}");
        }
    }

    #[test]
    fn test_equal_interface_signs_are_reported() {
        // Two open sheets continuing the shared cell with the same winding
        let mut mesh = SurfaceMesh::new(Dimension::Two);
        for p in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [2.0, 0.0]] {
            mesh.add_vertex(Point3::new(p[0], p[1], 0.0)).unwrap();
        }
        mesh.add_cell([0, 1, 2]).unwrap();
        mesh.add_cell([0, 2, 3]).unwrap();
        mesh.add_cell([1, 4, 2]).unwrap();
        mesh.add_segment("a", [0, 1]).unwrap();
        mesh.add_segment("b", [2, 0]).unwrap();

        let orientation = orient(&mut mesh).unwrap();
        let field = derive_normals(&mesh, &orientation).unwrap();
        assert_eq!(field.report().sign_conflicts, 1);
        assert_eq!(field.conflicts(), &[0]);
        assert_eq!(field.sign(0, 1), Some(1));
    }

    #[test]
    fn test_orientation_of_another_mesh_is_rejected() {
        let mut cube = Primitive::unit_cube().to_mesh("cube").unwrap();
        let orientation = orient(&mut cube).unwrap();
        let tet = Primitive::tetrahedron(1.0).to_mesh("tet").unwrap();

        assert_eq!(
            derive_normals(&tet, &orientation).unwrap_err(),
            AdaptError::OrientationMismatch {
                expected: 4,
                found: 12
            }
        );
    }
}
