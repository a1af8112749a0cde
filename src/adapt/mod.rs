// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Adaptation stages that rewrite the mesh: orientation, normal derivation
//! and sewing

pub mod normals;
pub mod orientation;
pub mod sewing;

pub use normals::{derive_normals, NormalField, NormalReport};
pub use orientation::{
    orient, orient_with, CellStatus, Orientation, OrientationReport, SegmentOrientation,
};
pub use sewing::{sew, SewResult};
