// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Read-only validators: topology and geometry

pub mod intersection;
pub mod topology;
pub mod types;

pub use intersection::{check_geometry, check_geometry_with, cells_intersect, GeometryCheckOptions};
pub use topology::check_topology;
pub use types::{GeometryReport, SegmentGeometry, SegmentTopology, TopologyReport};
