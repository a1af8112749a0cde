// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle-triangle, segment-triangle and ray-triangle intersection
//!
//! Every test is decided by the exact predicates in `robust_predicates`, so
//! coplanar and touching configurations are classified without tolerances.
//! Triangles are closed sets: touching at a vertex or along an edge counts as
//! intersecting. Degenerate (collinear) triangles never intersect anything.

use super::robust_predicates::{are_collinear, dominant_axis, orient2d, orient3d, project, Sign};
use nalgebra::{Point2, Point3, Vector3};

/// Three corner points of a triangle
pub type TrianglePoints = [Point3<f64>; 3];

/// Result of triangle-triangle intersection test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionResult {
    /// Whether triangles intersect
    pub intersects: bool,
    /// Intersection type
    pub intersection_type: IntersectionType,
}

/// Type of triangle-triangle intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    /// No intersection
    None,
    /// Triangles are coplanar and overlap
    Coplanar,
    /// Triangles cross or touch in a point or segment
    Crossing,
}

impl IntersectionResult {
    fn none() -> Self {
        Self {
            intersects: false,
            intersection_type: IntersectionType::None,
        }
    }

    fn of(intersection_type: IntersectionType) -> Self {
        Self {
            intersects: intersection_type != IntersectionType::None,
            intersection_type,
        }
    }
}

/// How a truncated ray meets a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayCrossing {
    /// The ray passes by the triangle or never leaves its starting plane
    Miss,
    /// The ray crosses the triangle interior
    Hit,
    /// The ray grazes an edge or vertex, or ends on the plane; parity is unreliable
    Degenerate,
}

/// Test if two triangles intersect
pub fn triangle_triangle_intersection(
    tri_a: &TrianglePoints,
    tri_b: &TrianglePoints,
) -> IntersectionResult {
    if is_degenerate(tri_a) || is_degenerate(tri_b) {
        return IntersectionResult::none();
    }

    let b_sides = plane_sides(tri_a, tri_b);
    if strictly_one_side(&b_sides) {
        return IntersectionResult::none();
    }

    let a_sides = plane_sides(tri_b, tri_a);
    if strictly_one_side(&a_sides) {
        return IntersectionResult::none();
    }

    if b_sides.iter().all(|s| s.is_zero()) {
        return if coplanar_triangles_overlap(tri_a, tri_b) {
            IntersectionResult::of(IntersectionType::Coplanar)
        } else {
            IntersectionResult::none()
        };
    }

    // Non-coplanar: the two triangles meet iff an edge of one meets the other
    let crossing = (0..3).any(|i| {
        segment_intersects_triangle(&tri_a[i], &tri_a[(i + 1) % 3], tri_b)
            || segment_intersects_triangle(&tri_b[i], &tri_b[(i + 1) % 3], tri_a)
    });

    if crossing {
        IntersectionResult::of(IntersectionType::Crossing)
    } else {
        IntersectionResult::none()
    }
}

/// Convenience wrapper returning only whether the triangles meet
pub fn triangles_intersect(tri_a: &TrianglePoints, tri_b: &TrianglePoints) -> bool {
    triangle_triangle_intersection(tri_a, tri_b).intersects
}

/// Test if the closed segment `p`-`q` meets the closed triangle
pub fn segment_intersects_triangle(
    p: &Point3<f64>,
    q: &Point3<f64>,
    triangle: &TrianglePoints,
) -> bool {
    if is_degenerate(triangle) {
        return false;
    }

    let [t0, t1, t2] = triangle;
    let sp = orient3d(t0, t1, t2, p);
    let sq = orient3d(t0, t1, t2, q);

    if sp == sq && !sp.is_zero() {
        return false;
    }

    if sp.is_zero() && sq.is_zero() {
        let axis = dominant_axis(&raw_normal(triangle));
        let tri_2d = triangle.map(|v| project(&v, axis));
        return segment_meets_triangle_2d(&project(p, axis), &project(q, axis), &tri_2d);
    }

    // The segment reaches the plane; check the line against each edge
    let sides = [
        orient3d(p, q, t0, t1),
        orient3d(p, q, t1, t2),
        orient3d(p, q, t2, t0),
    ];
    !mixed_signs(&sides)
}

/// Classify how the segment `origin`-`far` (a ray truncated past the
/// triangle) crosses a triangle, for crossing-number parity counts.
pub fn ray_crossing(origin: &Point3<f64>, far: &Point3<f64>, triangle: &TrianglePoints) -> RayCrossing {
    if is_degenerate(triangle) {
        return RayCrossing::Miss;
    }

    let [t0, t1, t2] = triangle;
    let so = orient3d(t0, t1, t2, origin);
    if so.is_zero() {
        return RayCrossing::Miss;
    }

    let sf = orient3d(t0, t1, t2, far);
    if sf.is_zero() {
        return RayCrossing::Degenerate;
    }
    if so == sf {
        return RayCrossing::Miss;
    }

    let sides = [
        orient3d(origin, far, t0, t1),
        orient3d(origin, far, t1, t2),
        orient3d(origin, far, t2, t0),
    ];
    if mixed_signs(&sides) {
        RayCrossing::Miss
    } else if sides.iter().any(|s| s.is_zero()) {
        RayCrossing::Degenerate
    } else {
        RayCrossing::Hit
    }
}

/// Two triangles hinged on the shared edge `a`-`b` with apexes `p` and `q`
/// overlap beyond the edge iff they are coplanar and fold onto the same side.
pub fn edge_fold(a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>, q: &Point3<f64>) -> bool {
    if !orient3d(a, b, p, q).is_zero() {
        return false;
    }
    let axis = dominant_axis(&(b - a).cross(&(p - a)));
    let (a2, b2) = (project(a, axis), project(b, axis));
    let side_p = orient2d(&a2, &b2, &project(p, axis));
    let side_q = orient2d(&a2, &b2, &project(q, axis));
    !side_p.is_zero() && side_p == side_q
}

/// Whether three corner points are collinear
pub fn is_degenerate(triangle: &TrianglePoints) -> bool {
    are_collinear(&triangle[0], &triangle[1], &triangle[2])
}

fn raw_normal(triangle: &TrianglePoints) -> Vector3<f64> {
    (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]))
}

fn plane_sides(plane: &TrianglePoints, points: &TrianglePoints) -> [Sign; 3] {
    points.map(|p| orient3d(&plane[0], &plane[1], &plane[2], &p))
}

fn strictly_one_side(signs: &[Sign; 3]) -> bool {
    signs.iter().all(|s| *s == Sign::Positive) || signs.iter().all(|s| *s == Sign::Negative)
}

fn mixed_signs(signs: &[Sign]) -> bool {
    signs.contains(&Sign::Positive) && signs.contains(&Sign::Negative)
}

fn coplanar_triangles_overlap(tri_a: &TrianglePoints, tri_b: &TrianglePoints) -> bool {
    let axis = dominant_axis(&raw_normal(tri_a));
    let a = tri_a.map(|v| project(&v, axis));
    let b = tri_b.map(|v| project(&v, axis));

    for i in 0..3 {
        for j in 0..3 {
            if segments_intersect_2d(&a[i], &a[(i + 1) % 3], &b[j], &b[(j + 1) % 3]) {
                return true;
            }
        }
    }

    // No edge crossings: overlap only if one contains the other
    point_in_triangle_2d(&a[0], &b) || point_in_triangle_2d(&b[0], &a)
}

fn segment_meets_triangle_2d(p: &Point2<f64>, q: &Point2<f64>, tri: &[Point2<f64>; 3]) -> bool {
    point_in_triangle_2d(p, tri)
        || point_in_triangle_2d(q, tri)
        || (0..3).any(|i| segments_intersect_2d(p, q, &tri[i], &tri[(i + 1) % 3]))
}

/// Closed point-in-triangle test (either winding)
fn point_in_triangle_2d(point: &Point2<f64>, tri: &[Point2<f64>; 3]) -> bool {
    let sides = [
        orient2d(&tri[0], &tri[1], point),
        orient2d(&tri[1], &tri[2], point),
        orient2d(&tri[2], &tri[0], point),
    ];
    !mixed_signs(&sides)
}

/// Closed segment-segment intersection, including collinear overlap
fn segments_intersect_2d(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let d1 = orient2d(q1, q2, p1);
    let d2 = orient2d(q1, q2, p2);
    let d3 = orient2d(p1, p2, q1);
    let d4 = orient2d(p1, p2, q2);

    if opposite(d1, d2) && opposite(d3, d4) {
        return true;
    }

    (d1.is_zero() && within_box(q1, q2, p1))
        || (d2.is_zero() && within_box(q1, q2, p2))
        || (d3.is_zero() && within_box(p1, p2, q1))
        || (d4.is_zero() && within_box(p1, p2, q2))
}

fn opposite(a: Sign, b: Sign) -> bool {
    !a.is_zero() && a.flip() == b
}

fn within_box(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
