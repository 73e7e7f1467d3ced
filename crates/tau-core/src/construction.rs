//! Construction geometry for drawing a triangle's circumcenter by hand:
//! edge midpoints, face normal, perpendicular bisectors and their crossing.
//!
//! The bisector crossing is solved in the xy-projection only, so it agrees
//! with [`crate::geometry::triangle_circumcenter`] unless the triangle stands
//! vertically (its normal has no z component), where it breaks down. It is a
//! visual aid, not a second circumcenter implementation.

use serde::{Deserialize, Serialize};

use crate::geometry::{safe_normal, Vec3};
use crate::topology::Triangle;

/// Length of the drawn face normal
pub const NORMAL_SCALE: f64 = 50.0;

/// Length of each drawn bisector direction
pub const BISECTOR_SCALE: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstructionLines {
    /// `a - b`
    pub ab: Vec3,
    pub ab_mid: Vec3,
    /// `b - c`
    pub bc: Vec3,
    pub bc_mid: Vec3,
    /// `c - a`
    pub ca: Vec3,
    pub ca_mid: Vec3,
    /// Face normal `ab x bc`, scaled to [`NORMAL_SCALE`]
    pub normal: Vec3,
    /// In-plane bisector directions for ab, bc and ca, scaled to [`BISECTOR_SCALE`]
    pub bisectors: [Vec3; 3],
    /// Where the ab and bc bisectors cross
    pub bisector_intersection: Vec3,
}

pub fn construction_lines(a: &Vec3, b: &Vec3, c: &Vec3) -> ConstructionLines {
    let ab = a - b;
    let bc = b - c;
    let ca = c - a;

    let ab_mid = (a + b) / 2.0;
    let bc_mid = (b + c) / 2.0;
    let ca_mid = (c + a) / 2.0;

    let face = ab.cross(&bc);
    let bisectors = [
        safe_normal(&face.cross(&ab)) * BISECTOR_SCALE,
        safe_normal(&face.cross(&bc)) * BISECTOR_SCALE,
        safe_normal(&face.cross(&ca)) * BISECTOR_SCALE,
    ];
    let [d1, d2, _] = bisectors;

    // ab_mid + d1 * t = bc_mid + d2 * s, eliminating s through x and y
    let t = ((bc_mid.y - ab_mid.y) * d2.x + d2.y * ab_mid.x - d2.y * bc_mid.x)
        / (d1.y * d2.x - d2.y * d1.x);

    ConstructionLines {
        ab,
        ab_mid,
        bc,
        bc_mid,
        ca,
        ca_mid,
        normal: safe_normal(&face) * NORMAL_SCALE,
        bisectors,
        bisector_intersection: ab_mid + d1 * t,
    }
}

impl Triangle {
    pub fn construction_lines(&self) -> ConstructionLines {
        construction_lines(self.a(), self.b(), self.c())
    }
}
