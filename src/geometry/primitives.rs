// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Primitive surface generators
//!
//! Closed and planar surfaces with outward (counter-clockwise seen from
//! outside) winding, used to assemble test meshes and benchmarks.

use super::mesh::{CellId, Dimension, SegmentId, SurfaceMesh, VertexId};
use crate::error::AdaptResult;
use nalgebra::{Point3, Vector3};

/// Box corner `i` has x = bit 0, y = bit 1, z = bit 2 of `i`.
/// Faces in order -z, +z, -y, +y, -x, +x, two triangles each.
const BOX_FACES: [[usize; 3]; 12] = [
    [0, 2, 3],
    [0, 3, 1],
    [4, 5, 7],
    [4, 7, 6],
    [0, 1, 5],
    [0, 5, 4],
    [2, 6, 7],
    [2, 7, 3],
    [0, 4, 6],
    [0, 6, 2],
    [1, 3, 7],
    [1, 7, 5],
];

const TETRAHEDRON_FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

/// Surface primitives
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box, 12 triangles
    Cuboid { min: Point3<f64>, max: Point3<f64> },
    /// Corner tetrahedron (origin plus the three axis points at `size`)
    Tetrahedron { size: f64 },
    /// Planar square in z = 0 split into `divisions` x `divisions` quads
    Grid {
        origin: Point3<f64>,
        size: f64,
        divisions: usize,
    },
}

impl Primitive {
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self::Cuboid { min, max }
    }

    pub fn unit_cube() -> Self {
        Self::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    pub fn tetrahedron(size: f64) -> Self {
        Self::Tetrahedron { size }
    }

    pub fn grid(origin: Point3<f64>, size: f64, divisions: usize) -> Self {
        Self::Grid {
            origin,
            size,
            divisions: divisions.max(1),
        }
    }

    /// Dimension of a mesh holding only this primitive
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Grid { .. } => Dimension::Two,
            _ => Dimension::Three,
        }
    }

    /// Build a one-segment mesh
    pub fn to_mesh(&self, name: &str) -> AdaptResult<SurfaceMesh> {
        let mut mesh = SurfaceMesh::new(self.dimension());
        self.append_to(&mut mesh, name)?;
        Ok(mesh)
    }

    /// Append the primitive with fresh vertices as a new segment
    pub fn append_to(&self, mesh: &mut SurfaceMesh, name: &str) -> AdaptResult<SegmentId> {
        let (points, faces) = self.points_and_faces();

        let mut ids = Vec::with_capacity(points.len());
        for point in points {
            ids.push(mesh.add_vertex(point)?);
        }

        let mut cells = Vec::with_capacity(faces.len());
        for face in faces {
            cells.push(mesh.add_cell(face.map(|local| ids[local]))?);
        }

        mesh.add_segment(name, cells)
    }

    fn points_and_faces(&self) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        match self {
            Self::Cuboid { min, max } => (box_corners(min, max).to_vec(), BOX_FACES.to_vec()),
            Self::Tetrahedron { size } => {
                let points = vec![
                    Point3::origin(),
                    Point3::new(*size, 0.0, 0.0),
                    Point3::new(0.0, *size, 0.0),
                    Point3::new(0.0, 0.0, *size),
                ];
                (points, TETRAHEDRON_FACES.to_vec())
            }
            Self::Grid {
                origin,
                size,
                divisions,
            } => grid_points_and_faces(origin, *size, *divisions),
        }
    }
}

fn box_corners(min: &Point3<f64>, max: &Point3<f64>) -> [Point3<f64>; 8] {
    std::array::from_fn(|i| {
        Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    })
}

fn grid_points_and_faces(
    origin: &Point3<f64>,
    size: f64,
    divisions: usize,
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let n = divisions;
    let step = size / n as f64;
    let mut points = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            // Border rows and columns land exactly on origin + size
            let x = if i == n { origin.x + size } else { origin.x + step * i as f64 };
            let y = if j == n { origin.y + size } else { origin.y + step * j as f64 };
            points.push(Point3::new(x, y, 0.0));
        }
    }

    let at = |i: usize, j: usize| j * (n + 1) + i;
    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            faces.push([at(i, j), at(i + 1, j), at(i + 1, j + 1)]);
            faces.push([at(i, j), at(i + 1, j + 1), at(i, j + 1)]);
        }
    }
    (points, faces)
}

/// Two unit cubes glued along the plane x = 1.
///
/// Segment "left" is [0,1]^3 and segment "right" is [1,2]x[0,1]^2. The two
/// triangles of the shared square are interface cells stored once, wound
/// outward for "left". 12 vertices and 22 cells in total.
pub fn glued_cubes() -> AdaptResult<SurfaceMesh> {
    let mut mesh = SurfaceMesh::with_capacity(Dimension::Three, 12, 22);

    let left_corners = box_corners(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0));
    let mut left_ids = [0; 8];
    for (slot, corner) in left_ids.iter_mut().zip(left_corners) {
        *slot = mesh.add_vertex(corner)?;
    }

    // Right cube: local x = 0 corners are the left cube's x = 1 corners
    let right_corners = box_corners(&Point3::new(1.0, 0.0, 0.0), &Point3::new(2.0, 1.0, 1.0));
    let mut right_ids: [VertexId; 8] = [0; 8];
    for (local, corner) in right_corners.into_iter().enumerate() {
        right_ids[local] = if local & 1 == 0 {
            left_ids[local | 1]
        } else {
            mesh.add_vertex(corner)?
        };
    }

    let mut left_cells: Vec<CellId> = Vec::with_capacity(12);
    for face in BOX_FACES {
        left_cells.push(mesh.add_cell(face.map(|local| left_ids[local]))?);
    }
    // The left cube's +x face is the interface
    let interface = &left_cells[10..12];

    let mut right_cells: Vec<CellId> = Vec::with_capacity(12);
    for face in &BOX_FACES[..8] {
        right_cells.push(mesh.add_cell(face.map(|local| right_ids[local]))?);
    }
    for face in &BOX_FACES[10..] {
        right_cells.push(mesh.add_cell(face.map(|local| right_ids[local]))?);
    }
    right_cells.extend_from_slice(interface);

    mesh.add_segment("left", left_cells)?;
    mesh.add_segment("right", right_cells)?;
    Ok(mesh)
}

/// A square ring around a unit square column, both of height 1.
///
/// Segment "sleeve" is the closed ring [0,3]^2 minus (1,2)^2; segment
/// "core" is the column [1,2]^2. The eight triangles of the four inner walls
/// are interface cells, stored outward for "sleeve" (facing the core axis).
/// The core's top and bottom only meet through those walls. Cells are
/// ordered bottom ring, top ring, outer walls, inner walls (24..32), core
/// top (32, 33) and core bottom (34, 35).
pub fn sleeved_core() -> AdaptResult<SurfaceMesh> {
    let mut mesh = SurfaceMesh::with_capacity(Dimension::Three, 16, 36);

    let outer = [(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)];
    let inner = [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)];
    // Bottom outer 0..4, bottom inner 4..8, top outer 8..12, top inner 12..16
    let mut points = Vec::with_capacity(16);
    for z in [0.0, 1.0] {
        for (x, y) in outer.iter().chain(&inner) {
            points.push(Point3::new(*x, *y, z));
        }
    }
    for point in &points {
        mesh.add_vertex(*point)?;
    }

    let axis = Point3::new(1.5, 1.5, 0.5);
    let ring = |k: usize| (k, (k + 1) % 4);
    for (base, outward) in [(0, -Vector3::z()), (8, Vector3::z())] {
        for k in 0..4 {
            let (a, b) = ring(k);
            let q = [base + a, base + b, base + 4 + b, base + 4 + a];
            push_quad(&mut mesh, &points, q, outward)?;
        }
    }
    for (base, away_from_axis) in [(0, true), (4, false)] {
        for k in 0..4 {
            let (a, b) = ring(k);
            let mid = Point3::from((points[base + a].coords + points[base + b].coords) / 2.0);
            let radial = Vector3::new(mid.x - axis.x, mid.y - axis.y, 0.0);
            let outward = if away_from_axis { radial } else { -radial };
            let q = [base + a, base + b, base + 8 + b, base + 8 + a];
            push_quad(&mut mesh, &points, q, outward)?;
        }
    }
    push_quad(&mut mesh, &points, [12, 13, 14, 15], Vector3::z())?;
    push_quad(&mut mesh, &points, [4, 5, 6, 7], -Vector3::z())?;

    mesh.add_segment("sleeve", 0..32)?;
    mesh.add_segment("core", (32..36).chain(24..32))?;
    Ok(mesh)
}

/// Add a planar convex quad as two cells wound to face `outward`
fn push_quad(
    mesh: &mut SurfaceMesh,
    points: &[Point3<f64>],
    q: [VertexId; 4],
    outward: Vector3<f64>,
) -> AdaptResult<CellId> {
    let normal = (points[q[1]] - points[q[0]]).cross(&(points[q[2]] - points[q[0]]));
    let q = if normal.dot(&outward) > 0.0 {
        q
    } else {
        [q[0], q[3], q[2], q[1]]
    };
    mesh.add_cell([q[0], q[1], q[2]])?;
    mesh.add_cell([q[0], q[2], q[3]])
}

/// Two unit squares side by side in z = 0, each with its own vertices.
///
/// Segment "left" covers [0,1]^2 and "right" covers [1,2]x[0,1]; the
/// `divisions + 1` vertices on x = 1 exist once per side.
pub fn split_squares(divisions: usize) -> AdaptResult<SurfaceMesh> {
    let mut mesh = SurfaceMesh::new(Dimension::Two);
    Primitive::grid(Point3::origin(), 1.0, divisions).append_to(&mut mesh, "left")?;
    Primitive::grid(Point3::new(1.0, 0.0, 0.0), 1.0, divisions).append_to(&mut mesh, "right")?;
    Ok(mesh)
}
