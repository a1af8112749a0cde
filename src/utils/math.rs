// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Unnormalized normal of a triangle: (p1 - p0) x (p2 - p0)
pub fn triangle_normal(points: &[Point3<f64>; 3]) -> Vector3<f64> {
    (points[1] - points[0]).cross(&(points[2] - points[0]))
}

/// Unit normal of a triangle, or None for a zero-area triangle
pub fn unit_normal(points: &[Point3<f64>; 3]) -> Option<Vector3<f64>> {
    triangle_normal(points).try_normalize(0.0)
}

/// Centroid of a triangle
pub fn barycenter(points: &[Point3<f64>; 3]) -> Point3<f64> {
    Point3::from((points[0].coords + points[1].coords + points[2].coords) / 3.0)
}

/// Two unit vectors spanning the plane orthogonal to `normal`
pub fn tangent_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let n = normal.try_normalize(0.0).unwrap_or_else(Vector3::z);
    // Pick the coordinate axis least aligned with n as a helper
    let helper = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = n.cross(&helper).normalize();
    let v = n.cross(&u);
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_triangle_normal_follows_winding() {
        let ccw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(triangle_normal(&ccw), Vector3::new(0.0, 0.0, 1.0));
        let cw = [ccw[2], ccw[1], ccw[0]];
        assert_eq!(triangle_normal(&cw), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_unit_normal_of_degenerate_triangle() {
        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        assert!(unit_normal(&line).is_none());
    }

    #[test]
    fn test_barycenter() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 3.0),
        ];
        assert_eq!(barycenter(&tri), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_tangent_basis_is_orthonormal() {
        let n = Vector3::new(1.0, 2.0, 3.0);
        let (u, v) = tangent_basis(&n);
        assert_abs_diff_eq!(u.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.dot(&n), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.dot(&n), 0.0, epsilon = 1e-12);
    }
}
