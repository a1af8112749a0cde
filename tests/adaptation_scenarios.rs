// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end adaptation scenarios

use anyhow::Result;
use meshadapt::adapt::{derive_normals, orient, sew, CellStatus};
use meshadapt::geometry::primitives::{glued_cubes, sleeved_core, split_squares};
use meshadapt::geometry::{consistently_oriented, MeshParts, Primitive, SegmentAdjacency, Vertex};
use meshadapt::validation::{check_geometry, check_topology};
use meshadapt::{adapt_mesh, SurfaceMesh};
use nalgebra::Point3;

#[test]
fn test_glued_cubes_full_adaptation() -> Result<()> {
    let mut mesh = glued_cubes()?;

    let orientation = orient(&mut mesh)?;
    for segment in &orientation.report().segments {
        assert_eq!(segment.consistent, 12, "segment {}", segment.name);
        assert_eq!(segment.errors, 0);
        assert_eq!(segment.leftover, 0);
    }
    assert!((0..mesh.cell_count()).all(|c| orientation.status(c) == CellStatus::Consistent));

    let normals = derive_normals(&mesh, &orientation)?;
    for cell in mesh.interface_cells() {
        let (a, b) = (normals.sign(cell, 0), normals.sign(cell, 1));
        assert!(a.is_some() && b.is_some());
        assert_eq!(a, b.map(|s| -s), "cell {cell}");
    }

    let topology = check_topology(&mesh)?;
    assert_eq!(topology.non_manifold_edge_count, 0);
    assert!(topology.is_clean());

    let geometry = check_geometry(&mesh)?;
    assert_eq!(geometry.intersection_count, 0);

    let sewn = sew(&mesh)?;
    assert_eq!(sewn.mesh.vertex_count(), mesh.vertex_count());
    Ok(())
}

#[test]
fn test_split_squares_sewing_shares_border() -> Result<()> {
    let divisions = 4;
    let mesh = split_squares(divisions)?;
    let result = sew(&mesh)?;

    assert_eq!(result.mesh.vertex_count(), mesh.vertex_count() - (divisions + 1));
    assert_eq!(result.mesh.cell_count(), mesh.cell_count());

    // Border vertices used by each side after sewing
    let border_ids = |segment: usize| {
        let mut ids: Vec<usize> = result
            .mesh
            .segment(segment)
            .cells
            .iter()
            .flat_map(|&c| result.mesh.cell(c).indices)
            .filter(|&v| result.mesh.position(v).x == 1.0)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };
    let left = border_ids(0);
    assert_eq!(left.len(), divisions + 1);
    assert_eq!(left, border_ids(1));

    // Cell corners keep their positions
    for cell in 0..mesh.cell_count() {
        assert_eq!(mesh.triangle(cell), result.mesh.triangle(cell));
    }
    Ok(())
}

#[test]
fn test_single_reversed_triangle_is_repaired() -> Result<()> {
    let mut mesh = glued_cubes()?;
    mesh.flip_cell(7);

    let report = orient(&mut mesh)?.into_report();
    assert_eq!(report.corrected, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.seed_flips, 0);
    Ok(())
}

#[test]
fn test_orientation_leaves_every_owned_pair_consistent() -> Result<()> {
    let mut mesh = glued_cubes()?;
    for cell in [1, 4, 9, 13, 17, 20] {
        mesh.flip_cell(cell);
    }
    let orientation = orient(&mut mesh)?;

    for segment in 0..mesh.segment_count() {
        let adjacency = SegmentAdjacency::build(&mesh, segment);
        for (_, cells) in adjacency.edges() {
            let owned: Vec<_> = cells
                .iter()
                .copied()
                .filter(|&c| orientation.owner(c) == Some(segment))
                .collect();
            for pair in owned.windows(2) {
                assert!(consistently_oriented(mesh.cell(pair[0]), mesh.cell(pair[1])));
            }
        }
    }
    Ok(())
}

#[test]
fn test_overlapping_triangles_are_detected() -> Result<()> {
    let cube = Primitive::unit_cube().to_mesh("cube")?;
    let mut parts = MeshParts::from(cube);

    // Two triangles overlapping inside the cube, sharing no vertex
    let base = parts.vertices.len();
    for p in [
        [0.2, 0.2, 0.5],
        [0.8, 0.2, 0.5],
        [0.2, 0.8, 0.5],
        [0.5, 0.1, 0.3],
        [0.5, 0.9, 0.3],
        [0.5, 0.5, 0.8],
    ] {
        parts.vertices.push(Vertex::from_coords(p[0], p[1], p[2]));
    }
    let first = parts.cells.len();
    parts.cells.push(meshadapt::geometry::Cell::new([base, base + 1, base + 2]));
    parts.cells.push(meshadapt::geometry::Cell::new([base + 3, base + 4, base + 5]));
    parts.segments[0].cells.extend([first, first + 1]);

    let mesh = SurfaceMesh::from_parts(parts)?;
    let report = check_geometry(&mesh)?;
    assert!(report.intersection_count >= 1);
    assert!(report
        .intersecting_pairs()
        .any(|pair| pair == (first, first + 1)));
    Ok(())
}

#[test]
fn test_pipeline_hand_off() -> Result<()> {
    let outcome = adapt_mesh(glued_cubes()?)?;
    assert!(outcome.ready);
    assert_eq!(outcome.report.orientation.consistent, 22);
    assert_eq!(outcome.report.sewing.map(|s| s.merged_vertices), Some(0));

    let reversed = {
        let mut mesh = glued_cubes()?;
        mesh.flip_cell(0);
        mesh
    };
    let outcome = adapt_mesh(reversed)?;
    assert!(outcome.ready);
    assert_eq!(outcome.report.orientation.seed_flips, 1);
    let normal = outcome.normals.normal(0, 0).expect("seed has a normal");
    assert!(normal.z < 0.0);
    Ok(())
}

#[test]
fn test_sleeved_core_reaches_cells_behind_the_interface() -> Result<()> {
    let mut mesh = sleeved_core()?;
    mesh.flip_cell(33);
    mesh.flip_cell(34);

    let outcome = adapt_mesh(mesh)?;
    assert!(outcome.ready);
    let orientation = &outcome.report.orientation;
    assert_eq!(orientation.consistent, 36);
    assert_eq!(orientation.corrected, 2);
    assert_eq!(orientation.segments[1].inherited, 8);
    assert!(outcome.report.normals.is_clean());
    for cell in outcome.mesh.interface_cells() {
        assert_eq!(outcome.normals.sign(cell, 0), Some(1));
        assert_eq!(outcome.normals.sign(cell, 1), Some(-1));
    }
    Ok(())
}

#[test]
fn test_mesh_json_hand_off() -> Result<()> {
    let mesh = glued_cubes()?;
    let json = serde_json::to_string(&mesh)?;
    let back: SurfaceMesh = serde_json::from_str(&json)?;
    assert_eq!(back.interface_cells(), mesh.interface_cells());
    assert_eq!(back.position(11), &Point3::new(2.0, 1.0, 1.0));
    Ok(())
}
