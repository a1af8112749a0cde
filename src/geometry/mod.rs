// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh store, adjacency and exact predicates

pub mod adjacency;
mod bbox;
pub mod bvh;
pub mod kernel;
mod mesh;
pub mod primitives;
pub mod robust_predicates;
pub mod triangle_intersection;

pub use adjacency::{cell_edges, consistently_oriented, Edge, PositionKey, SegmentAdjacency};
pub use bbox::BoundingBox;
pub use kernel::{GeometryKernel, RobustKernel};
pub use mesh::{
    Cell, CellId, Dimension, MeshParts, Membership, Segment, SegmentId, SurfaceMesh, Vertex,
    VertexId,
};
pub use primitives::Primitive;
pub use triangle_intersection::{RayCrossing, TrianglePoints};
