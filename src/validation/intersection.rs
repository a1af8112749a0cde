// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry validator: pairwise self-intersection within each segment
//!
//! Every unordered pair of distinct cells of a segment is tested with the
//! geometry kernel. Cells that share vertices always touch there, so for
//! them only contact beyond the shared vertices counts. An optional BVH
//! over cell bounding boxes prunes pairs whose boxes are disjoint, and the
//! pair tests may run on the current rayon pool; neither changes the
//! reported pairs.

use super::types::{GeometryReport, SegmentGeometry};
use crate::error::AdaptResult;
use crate::geometry::bvh::BVH;
use crate::geometry::triangle_intersection::is_degenerate;
use crate::geometry::{CellId, GeometryKernel, RobustKernel, SegmentId, SurfaceMesh};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How the pair scan is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryCheckOptions {
    /// Split pair tests across the current rayon pool
    pub parallel: bool,
    /// Skip pairs whose bounding boxes are disjoint
    pub broad_phase: bool,
}

impl Default for GeometryCheckOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            broad_phase: true,
        }
    }
}

/// Check every segment for self-intersections with the exact kernel
pub fn check_geometry(mesh: &SurfaceMesh) -> AdaptResult<GeometryReport> {
    check_geometry_with(mesh, &RobustKernel, &GeometryCheckOptions::default())
}

pub fn check_geometry_with<K: GeometryKernel + ?Sized>(
    mesh: &SurfaceMesh,
    kernel: &K,
    options: &GeometryCheckOptions,
) -> AdaptResult<GeometryReport> {
    mesh.require_cells("geometry check")?;

    let segments: Vec<SegmentGeometry> = (0..mesh.segment_count())
        .map(|segment| check_segment(mesh, kernel, options, segment))
        .collect();

    let report = GeometryReport {
        intersection_count: segments.iter().map(SegmentGeometry::intersection_count).sum(),
        candidate_pairs: segments.iter().map(|s| s.candidate_pairs).sum(),
        segments,
    };

    info!(
        intersections = report.intersection_count,
        candidate_pairs = report.candidate_pairs,
        parallel = options.parallel,
        broad_phase = options.broad_phase,
        "geometry checked"
    );
    if !report.is_clean() {
        warn!(intersections = report.intersection_count, "self-intersections found");
    }

    Ok(report)
}

/// Per-worker accumulator
#[derive(Default)]
struct PairScan {
    candidates: usize,
    hits: Vec<(CellId, CellId)>,
}

impl PairScan {
    fn merge(mut self, other: PairScan) -> PairScan {
        self.candidates += other.candidates;
        self.hits.extend(other.hits);
        self
    }
}

fn check_segment<K: GeometryKernel + ?Sized>(
    mesh: &SurfaceMesh,
    kernel: &K,
    options: &GeometryCheckOptions,
    segment: SegmentId,
) -> SegmentGeometry {
    let cells = &mesh.segment(segment).cells;

    let bvh = options.broad_phase.then(|| {
        BVH::build(
            cells
                .iter()
                .enumerate()
                .map(|(local, &cell)| (local, mesh.cell_bounding_box(cell)))
                .collect(),
        )
    });

    // Pairs (i, j) with i < j over positions in the segment's cell list
    let scan_from = |mut acc: PairScan, i: usize| {
        let partners: Vec<usize> = match &bvh {
            Some(bvh) => {
                let mut found = bvh.query(&mesh.cell_bounding_box(cells[i]));
                found.retain(|&j| j > i);
                found
            }
            None => (i + 1..cells.len()).collect(),
        };
        acc.candidates += partners.len();
        for j in partners {
            if cells_intersect(mesh, kernel, cells[i], cells[j]) {
                let (a, b) = (cells[i], cells[j]);
                acc.hits.push((a.min(b), a.max(b)));
            }
        }
        acc
    };

    let scan = if options.parallel {
        (0..cells.len())
            .into_par_iter()
            .fold(PairScan::default, scan_from)
            .reduce(PairScan::default, PairScan::merge)
    } else {
        (0..cells.len()).fold(PairScan::default(), scan_from)
    };

    let mut intersecting_pairs = scan.hits;
    intersecting_pairs.sort_unstable();

    let summary = SegmentGeometry {
        segment,
        name: mesh.segment(segment).name.clone(),
        candidate_pairs: scan.candidates,
        intersecting_pairs,
    };
    debug!(
        segment = %summary.name,
        cells = cells.len(),
        candidate_pairs = summary.candidate_pairs,
        intersections = summary.intersection_count(),
        "segment checked"
    );
    summary
}

/// Whether two cells overlap anywhere other than the vertices they share
pub fn cells_intersect<K: GeometryKernel + ?Sized>(
    mesh: &SurfaceMesh,
    kernel: &K,
    first: CellId,
    second: CellId,
) -> bool {
    let (tri_a, tri_b) = (mesh.triangle(first), mesh.triangle(second));
    if is_degenerate(&tri_a) || is_degenerate(&tri_b) {
        return false;
    }

    let a = mesh.cell(first).indices;
    let b = mesh.cell(second).indices;
    let shared: Vec<usize> = (0..3).filter(|&i| b.contains(&a[i])).collect();

    match shared.as_slice() {
        [] => kernel.triangles_intersect(&tri_a, &tri_b),
        [i] => {
            // Opposite edges of the shared corner
            let j = b.iter().position(|&v| v == a[*i]).unwrap_or(0);
            let (a1, a2) = (tri_a[(i + 1) % 3], tri_a[(i + 2) % 3]);
            let (b1, b2) = (tri_b[(j + 1) % 3], tri_b[(j + 2) % 3]);
            kernel.segment_intersects_triangle(&a1, &a2, &tri_b)
                || kernel.segment_intersects_triangle(&b1, &b2, &tri_a)
        }
        [i, k] => {
            let apex_a = tri_a[3 - i - k];
            let apex_b = b
                .iter()
                .position(|v| !a.contains(v))
                .map_or(tri_b[0], |m| tri_b[m]);
            kernel.edge_fold(&tri_a[*i], &tri_a[*k], &apex_a, &apex_b)
        }
        // Same three corners
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdaptError;
    use crate::geometry::primitives::glued_cubes;
    use crate::geometry::{Dimension, Primitive};
    use nalgebra::Point3;

    fn mesh_with(points: &[[f64; 3]], cells: &[[usize; 3]]) -> SurfaceMesh {
        let mut mesh = SurfaceMesh::new(Dimension::Three);
        for p in points {
            mesh.add_vertex(Point3::new(p[0], p[1], p[2])).unwrap();
        }
        for c in cells {
            mesh.add_cell(*c).unwrap();
        }
        mesh.add_segment("s", 0..cells.len()).unwrap();
        mesh
    }

    #[test]
    fn test_closed_surfaces_do_not_self_intersect() {
        let mesh = glued_cubes().unwrap();
        let report = check_geometry(&mesh).unwrap();
        assert_eq!(report.intersection_count, 0);
        assert!(report.candidate_pairs > 0);

        let tet = Primitive::tetrahedron(2.0).to_mesh("tet").unwrap();
        assert!(check_geometry(&tet).unwrap().is_clean());
    }

    #[test]
    fn test_crossing_triangles_are_found() {
        let mesh = mesh_with(
            &[
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 2.0, 0.0],
                [0.5, 0.5, -1.0],
                [0.5, 0.5, 1.0],
                [3.0, 3.0, 0.0],
            ],
            &[[0, 1, 2], [3, 4, 5]],
        );
        let report = check_geometry(&mesh).unwrap();
        assert_eq!(report.intersection_count, 1);
        assert_eq!(report.segments[0].intersecting_pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_shared_edge_fold_counts() {
        // Apex 3 folds back over cell 0 in the same plane
        let mesh = mesh_with(
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 2.0, 0.0], [1.0, 1.0, 0.0]],
            &[[0, 1, 2], [1, 0, 3]],
        );
        assert!(cells_intersect(&mesh, &RobustKernel, 0, 1));

        let flat = mesh_with(
            &[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 2.0, 0.0], [1.0, -1.0, 0.0]],
            &[[0, 1, 2], [1, 0, 3]],
        );
        assert!(!cells_intersect(&flat, &RobustKernel, 0, 1));
    }

    #[test]
    fn test_shared_vertex_overlap() {
        // Cell 1 lies inside the wedge of cell 0 at vertex 0
        let nested = mesh_with(
            &[
                [0.0, 0.0, 0.0],
                [4.0, 0.0, 0.0],
                [0.0, 4.0, 0.0],
                [1.0, 0.5, 0.0],
                [0.5, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 3, 4]],
        );
        assert!(cells_intersect(&nested, &RobustKernel, 0, 1));

        // Fan neighbours touching only at vertex 0
        let fan = mesh_with(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 3, 4]],
        );
        assert!(!cells_intersect(&fan, &RobustKernel, 0, 1));
    }

    #[test]
    fn test_duplicate_cell_counts_as_intersection() {
        let mesh = mesh_with(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [2, 1, 0]],
        );
        assert_eq!(check_geometry(&mesh).unwrap().intersection_count, 1);
    }

    #[test]
    fn test_execution_modes_agree() {
        let mut mesh = SurfaceMesh::new(Dimension::Three);
        Primitive::cuboid(Point3::origin(), Point3::new(2.0, 2.0, 2.0))
            .append_to(&mut mesh, "a")
            .unwrap();
        Primitive::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0))
            .append_to(&mut mesh, "b")
            .unwrap();
        let all: Vec<CellId> = (0..mesh.cell_count()).collect();
        mesh.add_segment("both", all).unwrap();

        let serial_exhaustive = check_geometry_with(
            &mesh,
            &RobustKernel,
            &GeometryCheckOptions {
                parallel: false,
                broad_phase: false,
            },
        )
        .unwrap();
        assert!(serial_exhaustive.intersection_count > 0);
        assert_eq!(serial_exhaustive.segments[2].candidate_pairs, 24 * 23 / 2);

        for (parallel, broad_phase) in [(false, true), (true, false), (true, true)] {
            let report = check_geometry_with(
                &mesh,
                &RobustKernel,
                &GeometryCheckOptions {
                    parallel,
                    broad_phase,
                },
            )
            .unwrap();
            assert_eq!(report.intersection_count, serial_exhaustive.intersection_count);
            assert_eq!(
                report.intersecting_pairs().collect::<Vec<_>>(),
                serial_exhaustive.intersecting_pairs().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let mesh = SurfaceMesh::new(Dimension::Three);
        assert!(matches!(check_geometry(&mesh), Err(AdaptError::EmptyMesh { .. })));
    }
}
