// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segmented surface mesh store
//!
//! Vertices and triangle cells live in dense arrays indexed by id. Segments
//! name subsets of cells; a cell belongs to one segment, or to two when it is
//! an interface cell between regions. The vertex order of a cell is stored
//! once and shared by every segment the cell belongs to.

use super::triangle_intersection::TrianglePoints;
use super::BoundingBox;
use crate::error::{AdaptError, AdaptResult};
use crate::utils::math;
use ahash::AHashSet;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Dense vertex index
pub type VertexId = usize;
/// Dense cell index
pub type CellId = usize;
/// Dense segment index
pub type SegmentId = usize;

/// Dimensionality of a mesh instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// Planar mesh; every vertex has z = 0
    Two,
    Three,
}

/// Mesh vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vertex {
    pub position: Point3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// Triangle cell defined by three vertex indices in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell {
    pub indices: [VertexId; 3],
}

impl Cell {
    pub fn new(indices: [VertexId; 3]) -> Self {
        Self { indices }
    }

    /// Reverse the winding by swapping the first and last vertex
    pub fn flip(&mut self) {
        self.indices.swap(0, 2);
    }

    /// Whether two indices of the cell coincide
    pub fn has_repeated_vertex(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Named subset of cells bounding one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub cells: Vec<CellId>,
}

/// Segments a cell belongs to (one, or two for interface cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Membership {
    slots: [Option<SegmentId>; 2],
}

impl Membership {
    /// Record a segment; a cell with two other segments is left unchanged
    fn push(&mut self, segment: SegmentId) {
        let free = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none() || **slot == Some(segment));
        if let Some(slot) = free {
            *slot = Some(segment);
        }
    }

    fn has_room_for(&self, segment: SegmentId) -> bool {
        self.contains(segment) || self.slots.iter().any(Option::is_none)
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.slots.contains(&Some(segment))
    }

    /// Segments in the order the cell joined them
    pub fn segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Slot (0 or 1) holding `segment`
    pub fn slot_of(&self, segment: SegmentId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(segment))
    }

    /// The other segment of an interface cell
    pub fn other(&self, segment: SegmentId) -> Option<SegmentId> {
        self.segments().find(|s| *s != segment)
    }

    pub fn count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_interface(&self) -> bool {
        self.count() == 2
    }
}

/// Plain parts of a mesh, as exchanged with collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshParts {
    pub dimension: Dimension,
    pub vertices: Vec<Vertex>,
    pub cells: Vec<Cell>,
    pub segments: Vec<Segment>,
}

/// Segmented triangle surface mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MeshParts", into = "MeshParts")]
pub struct SurfaceMesh {
    dimension: Dimension,
    vertices: Vec<Vertex>,
    cells: Vec<Cell>,
    segments: Vec<Segment>,
    membership: Vec<Membership>,
}

impl SurfaceMesh {
    pub fn new(dimension: Dimension) -> Self {
        Self::with_capacity(dimension, 0, 0)
    }

    pub fn with_capacity(dimension: Dimension, vertex_count: usize, cell_count: usize) -> Self {
        Self {
            dimension,
            vertices: Vec::with_capacity(vertex_count),
            cells: Vec::with_capacity(cell_count),
            segments: Vec::new(),
            membership: Vec::with_capacity(cell_count),
        }
    }

    /// Rebuild a mesh from plain parts, re-validating every reference
    pub fn from_parts(parts: MeshParts) -> AdaptResult<Self> {
        let mut mesh = Self::with_capacity(parts.dimension, parts.vertices.len(), parts.cells.len());
        for vertex in parts.vertices {
            mesh.add_vertex(vertex.position)?;
        }
        for cell in parts.cells {
            mesh.add_cell(cell.indices)?;
        }
        for segment in parts.segments {
            mesh.add_segment(segment.name, segment.cells)?;
        }
        Ok(mesh)
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Add a vertex and return its id
    pub fn add_vertex(&mut self, position: Point3<f64>) -> AdaptResult<VertexId> {
        if self.dimension == Dimension::Two && position.z != 0.0 {
            return Err(AdaptError::DimensionMismatch { z: position.z });
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex::new(position));
        Ok(id)
    }

    /// Add a cell and return its id
    pub fn add_cell(&mut self, indices: [VertexId; 3]) -> AdaptResult<CellId> {
        if let Some(&index) = indices.iter().find(|&&v| v >= self.vertices.len()) {
            return Err(AdaptError::InvalidVertexIndex {
                index,
                vertex_count: self.vertices.len(),
            });
        }
        let id = self.cells.len();
        self.cells.push(Cell::new(indices));
        self.membership.push(Membership::default());
        Ok(id)
    }

    /// Add a named segment over existing cells and return its id.
    ///
    /// A cell listed twice in the same segment is kept once. Nothing is
    /// modified when the segment is rejected.
    pub fn add_segment(
        &mut self,
        name: impl Into<String>,
        cells: impl IntoIterator<Item = CellId>,
    ) -> AdaptResult<SegmentId> {
        let name = name.into();
        if self.segments.iter().any(|s| s.name == name) {
            return Err(AdaptError::DuplicateSegmentName(name));
        }

        let id = self.segments.len();
        let mut members = Vec::new();
        let mut seen = AHashSet::new();
        for cell in cells {
            let membership = self.membership.get(cell).ok_or(AdaptError::InvalidCellIndex {
                index: cell,
                cell_count: self.cells.len(),
            })?;
            if !membership.has_room_for(id) {
                return Err(AdaptError::MembershipOverflow { cell, segment: name });
            }
            if seen.insert(cell) {
                members.push(cell);
            }
        }

        for &cell in &members {
            self.membership[cell].push(id);
        }
        self.segments.push(Segment { name, cells: members });
        Ok(id)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn position(&self, id: VertexId) -> &Point3<f64> {
        &self.vertices[id].position
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    pub fn segment_by_name(&self, name: &str) -> Option<SegmentId> {
        self.segments.iter().position(|s| s.name == name)
    }

    pub fn membership(&self, cell: CellId) -> Membership {
        self.membership[cell]
    }

    pub fn is_interface(&self, cell: CellId) -> bool {
        self.membership[cell].is_interface()
    }

    /// Ids of all cells shared by two segments
    pub fn interface_cells(&self) -> Vec<CellId> {
        (0..self.cells.len()).filter(|&c| self.is_interface(c)).collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() || self.segments.is_empty()
    }

    /// Reverse a cell's canonical winding in place
    pub fn flip_cell(&mut self, cell: CellId) {
        self.cells[cell].flip();
    }

    /// Corner points of a cell in canonical order
    pub fn triangle(&self, cell: CellId) -> TrianglePoints {
        self.cells[cell].indices.map(|v| self.vertices[v].position)
    }

    /// Unnormalized normal (v1 - v0) x (v2 - v0) of the canonical order
    pub fn cell_normal(&self, cell: CellId) -> Vector3<f64> {
        math::triangle_normal(&self.triangle(cell))
    }

    pub fn barycenter(&self, cell: CellId) -> Point3<f64> {
        math::barycenter(&self.triangle(cell))
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    pub fn cell_bounding_box(&self, cell: CellId) -> BoundingBox {
        BoundingBox::from_points(&self.triangle(cell))
    }

    /// Bounding box of every vertex used by a segment
    pub fn segment_bounding_box(&self, segment: SegmentId) -> BoundingBox {
        self.segments[segment]
            .cells
            .iter()
            .fold(BoundingBox::empty(), |acc, &c| acc.union(&self.cell_bounding_box(c)))
    }

    /// Check that at least one cell and one segment exist
    pub(crate) fn require_cells(&self, stage: &'static str) -> AdaptResult<()> {
        if self.is_empty() {
            Err(AdaptError::EmptyMesh { stage })
        } else {
            Ok(())
        }
    }
}

impl TryFrom<MeshParts> for SurfaceMesh {
    type Error = AdaptError;

    fn try_from(parts: MeshParts) -> AdaptResult<Self> {
        Self::from_parts(parts)
    }
}

impl From<SurfaceMesh> for MeshParts {
    fn from(mesh: SurfaceMesh) -> Self {
        Self {
            dimension: mesh.dimension,
            vertices: mesh.vertices,
            cells: mesh.cells,
            segments: mesh.segments,
        }
    }
}
