// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Robust geometric predicates
//!
//! `orient2d` and `orient3d` return the exact sign of their determinant.
//! A floating-point evaluation is tried first and accepted when it clears a
//! static error bound; otherwise the determinant is re-evaluated exactly with
//! expansion arithmetic (error-free two-sum / two-product, Shewchuk style).

use nalgebra::{Point2, Point3, Vector3};

/// Unit roundoff for f64 (2^-53)
const EPS: f64 = f64::EPSILON * 0.5;

/// Error bound of the filtered orient2d evaluation
const CCW_ERRBOUND: f64 = (3.0 + 16.0 * EPS) * EPS;

/// Error bound of the filtered orient3d evaluation
const O3D_ERRBOUND: f64 = (7.0 + 56.0 * EPS) * EPS;

/// Exact sign of a determinant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    fn of(value: f64) -> Self {
        if value > 0.0 {
            Sign::Positive
        } else if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Zero
        }
    }

    pub fn is_zero(self) -> bool {
        self == Sign::Zero
    }

    pub fn flip(self) -> Self {
        match self {
            Sign::Negative => Sign::Positive,
            Sign::Zero => Sign::Zero,
            Sign::Positive => Sign::Negative,
        }
    }
}

/// Exact orientation of `d` relative to the plane through `a`, `b`, `c`.
///
/// Positive when `d` lies on the side the normal `(b - a) x (c - a)` points
/// to, negative on the other side, zero when the four points are coplanar.
pub fn orient3d(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> Sign {
    let u = b - a;
    let v = c - a;
    let w = d - a;

    let det = u.x * (v.y * w.z - v.z * w.y)
        + u.y * (v.z * w.x - v.x * w.z)
        + u.z * (v.x * w.y - v.y * w.x);

    let permanent = u.x.abs() * ((v.y * w.z).abs() + (v.z * w.y).abs())
        + u.y.abs() * ((v.z * w.x).abs() + (v.x * w.z).abs())
        + u.z.abs() * ((v.x * w.y).abs() + (v.y * w.x).abs());

    if det.abs() > O3D_ERRBOUND * permanent {
        return Sign::of(det);
    }

    orient3d_exact(a, b, c, d)
}

/// Exact orientation of `c` relative to the directed line `a -> b`.
///
/// Positive for a counter-clockwise turn, negative for clockwise, zero when
/// the three points are collinear.
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Sign {
    let left = (b.x - a.x) * (c.y - a.y);
    let right = (b.y - a.y) * (c.x - a.x);
    let det = left - right;

    if det.abs() > CCW_ERRBOUND * (left.abs() + right.abs()) {
        return Sign::of(det);
    }

    let bx = diff(b.x, a.x);
    let by = diff(b.y, a.y);
    let cx = diff(c.x, a.x);
    let cy = diff(c.y, a.y);

    let det = expansion_sum(&product(&bx, &cy), &negate(&product(&by, &cx)));
    expansion_sign(&det)
}

fn orient3d_exact(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> Sign {
    let (ux, uy, uz) = (diff(b.x, a.x), diff(b.y, a.y), diff(b.z, a.z));
    let (vx, vy, vz) = (diff(c.x, a.x), diff(c.y, a.y), diff(c.z, a.z));
    let (wx, wy, wz) = (diff(d.x, a.x), diff(d.y, a.y), diff(d.z, a.z));

    // v x w, component by component
    let cx = expansion_sum(&product(&vy, &wz), &negate(&product(&vz, &wy)));
    let cy = expansion_sum(&product(&vz, &wx), &negate(&product(&vx, &wz)));
    let cz = expansion_sum(&product(&vx, &wy), &negate(&product(&vy, &wx)));

    let det = expansion_sum(
        &expansion_sum(&product(&ux, &cx), &product(&uy, &cy)),
        &product(&uz, &cz),
    );
    expansion_sign(&det)
}

/// Project a point onto the coordinate plane that drops `axis`.
///
/// Projection keeps coordinates bit-exact, so 2D predicates on projected
/// points stay exact.
pub fn project(point: &Point3<f64>, axis: usize) -> Point2<f64> {
    match axis {
        0 => Point2::new(point.y, point.z),
        1 => Point2::new(point.z, point.x),
        _ => Point2::new(point.x, point.y),
    }
}

/// Axis along which a normal has its largest component.
///
/// Dropping that axis gives the projection that best preserves the shape of
/// a triangle with this normal.
pub fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let n = normal.map(f64::abs);
    if n.x >= n.y && n.x >= n.z {
        0
    } else if n.y >= n.z {
        1
    } else {
        2
    }
}

/// Exact collinearity test for three points in space
pub fn are_collinear(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> bool {
    (0..3).all(|axis| {
        orient2d(&project(a, axis), &project(b, axis), &project(c, axis)).is_zero()
    })
}

// Expansion arithmetic. An expansion is a sequence of non-overlapping f64
// components in increasing order of magnitude whose exact sum is the value
// it represents. Zero components are allowed anywhere.

/// Error-free sum: a + b == x + y exactly
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    let a_virtual = x - b_virtual;
    let b_round = b - b_virtual;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

/// Error-free difference: a - b == x + y exactly
#[inline]
fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let x = a - b;
    let b_virtual = a - x;
    let a_virtual = x + b_virtual;
    let b_round = b_virtual - b;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

/// Error-free product: a * b == x + y exactly (fused multiply-add recovers the error)
#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    (x, a.mul_add(b, -x))
}

/// a - b as a two-component expansion
fn diff(a: f64, b: f64) -> [f64; 2] {
    let (x, y) = two_diff(a, b);
    [y, x]
}

fn grow_expansion(e: &[f64], b: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(e.len() + 1);
    let mut q = b;
    for &component in e {
        let (sum, err) = two_sum(q, component);
        h.push(err);
        q = sum;
    }
    h.push(q);
    h
}

fn expansion_sum(e: &[f64], f: &[f64]) -> Vec<f64> {
    let mut h = e.to_vec();
    for &component in f {
        h = grow_expansion(&h, component);
    }
    h
}

fn scale_expansion(e: &[f64], b: f64) -> Vec<f64> {
    let Some((&first, rest)) = e.split_first() else {
        return Vec::new();
    };

    let mut h = Vec::with_capacity(2 * e.len());
    let (mut q, low) = two_product(first, b);
    h.push(low);
    for &component in rest {
        let (product_high, product_low) = two_product(component, b);
        let (sum, err) = two_sum(q, product_low);
        h.push(err);
        let (next, err) = two_sum(product_high, sum);
        h.push(err);
        q = next;
    }
    h.push(q);
    h
}

fn product(e: &[f64], f: &[f64]) -> Vec<f64> {
    f.iter()
        .map(|&component| scale_expansion(e, component))
        .fold(Vec::new(), |acc, term| expansion_sum(&acc, &term))
}

fn negate(e: &[f64]) -> Vec<f64> {
    e.iter().map(|x| -x).collect()
}

/// The most significant non-zero component carries the sign of the sum.
fn expansion_sign(e: &[f64]) -> Sign {
    e.iter()
        .rev()
        .find(|x| **x != 0.0)
        .map_or(Sign::Zero, |x| Sign::of(*x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient3d_sides() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        assert_eq!(orient3d(&a, &b, &c, &Point3::new(0.0, 0.0, 1.0)), Sign::Positive);
        assert_eq!(orient3d(&a, &b, &c, &Point3::new(0.0, 0.0, -1.0)), Sign::Negative);
        assert_eq!(orient3d(&a, &b, &c, &Point3::new(0.3, 0.7, 0.0)), Sign::Zero);
    }

    #[test]
    fn test_orient3d_tilted_plane_is_exactly_coplanar() {
        // Plane z = x, with coordinates that are not small integers
        let a = Point3::new(0.1, 0.0, 0.1);
        let b = Point3::new(1.7, 0.3, 1.7);
        let c = Point3::new(0.0, 1.9, 0.0);
        let d = Point3::new(0.3, 7.3, 0.3);
        assert_eq!(orient3d(&a, &b, &c, &d), Sign::Zero);
    }

    #[test]
    fn test_orient3d_tiny_offset_is_detected() {
        let a = Point3::new(0.1, 0.0, 0.1);
        let b = Point3::new(1.7, 0.3, 1.7);
        let c = Point3::new(0.0, 1.9, 0.0);
        let above = Point3::new(0.3, 7.3, 0.3 + 1e-17 * 4.0);
        let sign = orient3d(&a, &b, &c, &above);
        assert!(!sign.is_zero());
        let below = Point3::new(0.3, 7.3, 0.3 - 1e-17 * 4.0);
        assert_eq!(orient3d(&a, &b, &c, &below), sign.flip());
    }

    #[test]
    fn test_orient2d() {
        let a = Point2::new(0.5, 0.5);
        let b = Point2::new(12.0, 12.0);
        assert_eq!(orient2d(&a, &b, &Point2::new(24.0, 24.0)), Sign::Zero);
        let just_above = Point2::new(24.0, 24.0 + 2f64.powi(-48));
        assert_eq!(orient2d(&a, &b, &just_above), Sign::Positive);
        let just_below = Point2::new(24.0, 24.0 - 2f64.powi(-48));
        assert_eq!(orient2d(&a, &b, &just_below), Sign::Negative);
    }

    #[test]
    fn test_collinear() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 2.0, 3.0);
        assert!(are_collinear(&a, &b, &Point3::new(2.0, 4.0, 6.0)));
        assert!(!are_collinear(&a, &b, &Point3::new(2.0, 4.0, 6.5)));
    }
}
