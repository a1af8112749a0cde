// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry kernel seam
//!
//! The adaptation stages never evaluate geometry directly: they ask a
//! `GeometryKernel`. `RobustKernel` answers with the exact predicates of this
//! crate; callers can plug in another implementation (for example one backed
//! by an external exact-arithmetic library).

use super::triangle_intersection::{self, RayCrossing, TrianglePoints};
use nalgebra::{Point3, Vector3};

/// Intersection capabilities the adaptation pipeline relies on
pub trait GeometryKernel: Send + Sync {
    /// Classify how the ray from `origin`, truncated at `far`, crosses a triangle.
    ///
    /// `far` must lie beyond every triangle the ray is tested against, so that
    /// a batch of tests shares one exact line.
    fn ray_crossing(
        &self,
        origin: &Point3<f64>,
        far: &Point3<f64>,
        triangle: &TrianglePoints,
    ) -> RayCrossing;

    /// Whether the ray from `origin` along `direction` meets the triangle.
    fn ray_intersects_triangle(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        triangle: &TrianglePoints,
    ) -> bool {
        let reach = triangle
            .iter()
            .map(|v| (v - origin).norm())
            .fold(0.0, f64::max);
        let length = direction.norm();
        if length == 0.0 {
            return false;
        }
        let far = origin + direction * ((2.0 * reach + 1.0) / length);
        self.ray_crossing(origin, &far, triangle) != RayCrossing::Miss
    }

    /// Whether two closed triangles share at least one point.
    fn triangles_intersect(&self, tri_a: &TrianglePoints, tri_b: &TrianglePoints) -> bool;

    /// Whether the closed segment `p`-`q` meets the closed triangle.
    fn segment_intersects_triangle(
        &self,
        p: &Point3<f64>,
        q: &Point3<f64>,
        triangle: &TrianglePoints,
    ) -> bool;

    /// Whether triangles `(a, b, p)` and `(b, a, q)` hinged on edge `a`-`b`
    /// overlap beyond the edge.
    fn edge_fold(&self, a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>, q: &Point3<f64>) -> bool;
}

/// Kernel backed by the exact predicates in `robust_predicates`
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustKernel;

impl GeometryKernel for RobustKernel {
    fn ray_crossing(
        &self,
        origin: &Point3<f64>,
        far: &Point3<f64>,
        triangle: &TrianglePoints,
    ) -> RayCrossing {
        triangle_intersection::ray_crossing(origin, far, triangle)
    }

    fn triangles_intersect(&self, tri_a: &TrianglePoints, tri_b: &TrianglePoints) -> bool {
        triangle_intersection::triangles_intersect(tri_a, tri_b)
    }

    fn segment_intersects_triangle(
        &self,
        p: &Point3<f64>,
        q: &Point3<f64>,
        triangle: &TrianglePoints,
    ) -> bool {
        triangle_intersection::segment_intersects_triangle(p, q, triangle)
    }

    fn edge_fold(&self, a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>, q: &Point3<f64>) -> bool {
        triangle_intersection::edge_fold(a, b, p, q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle_at(z: f64) -> TrianglePoints {
        [
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(0.0, 1.0, z),
        ]
    }

    #[test]
    fn test_ray_intersects_triangle() {
        let kernel = RobustKernel;
        let triangle = unit_triangle_at(2.0);
        let origin = Point3::new(0.2, 0.2, 0.0);

        assert!(kernel.ray_intersects_triangle(&origin, &Vector3::new(0.0, 0.0, 1.0), &triangle));
        assert!(!kernel.ray_intersects_triangle(&origin, &Vector3::new(0.0, 0.0, -1.0), &triangle));
        assert!(!kernel.ray_intersects_triangle(&origin, &Vector3::zeros(), &triangle));
    }

    #[test]
    fn test_kernel_is_object_safe() {
        let kernel: Box<dyn GeometryKernel> = Box::new(RobustKernel);
        assert!(kernel.triangles_intersect(&unit_triangle_at(0.0), &unit_triangle_at(0.0)));
        assert!(!kernel.triangles_intersect(&unit_triangle_at(0.0), &unit_triangle_at(1.0)));
    }
}
