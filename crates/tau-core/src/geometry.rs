//! Geometric utilities: orientations and triangle circumcenters.
//!
//! ## Circumcenter of a triangle in R^3
//!
//! ```text
//!         |c-a|^2 [(b-a)x(c-a)]x(b-a) + |b-a|^2 (c-a)x[(b-a)x(c-a)]
//! m = a + ---------------------------------------------------------
//!                            2 | (b-a)x(c-a) |^2
//! ```
//!
//! Everything is evaluated relative to `a`, so roundoff scales with the
//! distances between vertices rather than with their absolute coordinates.
//! Joint positions are world-space while triangle edges are short, which is
//! exactly the case where that matters. The expression is unstable only when
//! the denominator approaches zero (a nearly collinear triangle); that case
//! yields non-finite values instead of an error.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type Vec3 = Vector3<f64>;

/// Squared length below which a vector has no usable direction
pub const SAFE_NORMAL_EPSILON: f64 = 1e-8;

/// Orientation in 3D space using quaternion representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation3D {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Orientation3D {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        if norm < 1e-12 {
            return Self::identity();
        }
        Self {
            w: w / norm,
            x: x / norm,
            y: y / norm,
            z: z / norm,
        }
    }

    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

impl Default for Orientation3D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Circumcenter of a triangle, relative to its first vertex `a`.
///
/// `xi` and `eta` are the circumcenter's coordinates in the affine frame
/// where `a` is the origin, edge `ab` is one unit along xi and edge `ac` is
/// one unit along eta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circumcenter {
    pub offset: Vec3,
    pub xi: f64,
    pub eta: f64,
}

impl Circumcenter {
    /// Absolute circumcenter position given the triangle's `a` vertex
    pub fn absolute(&self, a: &Vec3) -> Vec3 {
        a + self.offset
    }

    /// Circumradius (norm of the offset)
    pub fn radius(&self) -> f64 {
        self.offset.norm()
    }

    pub fn is_finite(&self) -> bool {
        self.offset.iter().all(|c| c.is_finite()) && self.xi.is_finite() && self.eta.is_finite()
    }
}

/// Circumcenter of the triangle `abc` in R^3, relative to `a`.
///
/// Degenerate (collinear or coincident) input produces `inf`/`NaN` components.
pub fn tri_circumcenter_3d(a: &Vec3, b: &Vec3, c: &Vec3) -> Circumcenter {
    let ba = b - a;
    let ca = c - a;

    let balength = ba.norm_squared();
    let calength = ca.norm_squared();

    let cross = ba.cross(&ca);
    let denominator = 0.5 / cross.norm_squared();

    // (|b-a|^2 (c-a) - |c-a|^2 (b-a)) x [(b-a)x(c-a)]
    let weighted = ca * balength - ba * calength;
    let offset = weighted.cross(&cross) * denominator;

    let (xi, eta) = affine_coordinates(&offset, &ba, &ca, &cross);

    Circumcenter { offset, xi, eta }
}

/// Absolute circumcenter of the triangle `abc`
pub fn triangle_circumcenter(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    tri_circumcenter_3d(a, b, c).absolute(a)
}

/// Cramer's rule over whichever component of `cross` has the largest
/// magnitude; the other two would divide by something closer to zero.
fn affine_coordinates(offset: &Vec3, ba: &Vec3, ca: &Vec3, cross: &Vec3) -> (f64, f64) {
    let (xc, yc, zc) = (cross.x, cross.y, cross.z);

    // Ties resolve towards x, then y.
    if (xc >= yc) ^ (-xc > yc) && (xc >= zc) ^ (-xc > zc) {
        (
            (offset.y * ca.z - offset.z * ca.y) / xc,
            (offset.z * ba.y - offset.y * ba.z) / xc,
        )
    } else if (yc >= zc) ^ (-yc > zc) {
        (
            (offset.z * ca.x - offset.x * ca.z) / yc,
            (offset.x * ba.z - offset.z * ba.x) / yc,
        )
    } else {
        (
            (offset.x * ca.y - offset.y * ca.x) / zc,
            (offset.y * ba.x - offset.x * ba.y) / zc,
        )
    }
}

/// Unit vector in the direction of `v`, or zero if `v` is too short
pub fn safe_normal(v: &Vec3) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq < SAFE_NORMAL_EPSILON || !len_sq.is_finite() {
        Vec3::zeros()
    } else {
        v / len_sq.sqrt()
    }
}

/// Calculate angle between two vectors
pub fn angle_between(v1: &Vec3, v2: &Vec3) -> f64 {
    let dot = v1.dot(v2);
    let norms = v1.norm() * v2.norm();
    if norms < 1e-10 {
        0.0
    } else {
        (dot / norms).clamp(-1.0, 1.0).acos()
    }
}

pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_orientation_is_normalized() {
        let q = Orientation3D::new(2.0, 0.0, 0.0, 2.0);
        assert_relative_eq!(q.w, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(q.z, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(Orientation3D::new(0.0, 0.0, 0.0, 0.0), Orientation3D::identity());
    }

    #[test]
    fn test_right_triangle_circumcenter() {
        // Legs 3 and 4 along the axes: the center is the hypotenuse midpoint.
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 4.0, 0.0);

        let cc = tri_circumcenter_3d(&a, &b, &c);
        assert_relative_eq!(cc.offset, Vec3::new(1.5, 2.0, 0.0), max_relative = 1e-6);
        assert_relative_eq!(cc.radius(), 2.5, max_relative = 1e-6);
        assert_relative_eq!(cc.xi, 0.5, max_relative = 1e-6);
        assert_relative_eq!(cc.eta, 0.5, max_relative = 1e-6);
    }

    #[test]
    fn test_circumcenter_equidistant_in_3d() {
        let a = Vec3::new(1.0, -2.0, 0.5);
        let b = Vec3::new(2.5, 0.3, -1.0);
        let c = Vec3::new(-0.7, 1.1, 2.2);

        let m = triangle_circumcenter(&a, &b, &c);
        let ra = (m - a).norm();
        assert_relative_eq!((m - b).norm(), ra, max_relative = 1e-9);
        assert_relative_eq!((m - c).norm(), ra, max_relative = 1e-9);

        // Lies in the triangle's plane.
        let normal = (b - a).cross(&(c - a));
        assert!((m - a).dot(&normal).abs() < 1e-9);
    }

    #[test]
    fn test_affine_coordinates_reconstruct_offset() {
        let a = Vec3::new(0.2, 0.1, 3.0);
        let b = Vec3::new(1.0, 0.4, 2.0);
        let c = Vec3::new(0.5, 2.0, 2.5);

        let cc = tri_circumcenter_3d(&a, &b, &c);
        let rebuilt = (b - a) * cc.xi + (c - a) * cc.eta;
        assert_relative_eq!(rebuilt, cc.offset, epsilon = 1e-9);
    }

    #[test]
    fn test_affine_axis_selection_avoids_zero_component() {
        // Triangle in the yz-plane: cross product lies along x only.
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 2.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 2.0);

        let cc = tri_circumcenter_3d(&a, &b, &c);
        assert!(cc.is_finite());
        assert_relative_eq!(cc.xi, 0.5, epsilon = 1e-12);
        assert_relative_eq!(cc.eta, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_invariance() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        let b = Vec3::new(0.9, 0.25, 0.1);
        let c = Vec3::new(0.4, 1.1, 0.35);
        let shift = Vec3::new(1500.0, -820.0, 330.0);

        let m = triangle_circumcenter(&a, &b, &c);
        let shifted = triangle_circumcenter(&(a + shift), &(b + shift), &(c + shift));
        assert_relative_eq!(shifted, m + shift, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_triangle_is_not_finite() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 1.0, 1.0);
        let c = Vec3::new(2.0, 2.0, 2.0);

        let cc = tri_circumcenter_3d(&a, &b, &c);
        assert!(!cc.is_finite());
    }

    #[test]
    fn test_safe_normal() {
        assert_eq!(safe_normal(&Vec3::new(1e-5, 0.0, 0.0)), Vec3::zeros());
        assert_relative_eq!(safe_normal(&Vec3::new(0.0, 3.0, 4.0)), Vec3::new(0.0, 0.6, 0.8));
    }

    #[test]
    fn test_angle_between_is_clamped() {
        let v = Vec3::new(0.1, 0.2, 0.3);
        // Parallel vectors can push the cosine a hair above 1.
        let parallel = angle_between(&v, &(v * 3.0));
        assert!(parallel.is_finite() && parallel < 1e-7);
        assert_relative_eq!(angle_between(&v, &(-v)), PI, epsilon = 1e-7);
        assert_eq!(angle_between(&Vec3::zeros(), &v), 0.0);
    }
}
