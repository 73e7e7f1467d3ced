//! Euler line of a triangle.
//!
//! Stored as the vector from the circumcenter to the centroid
//! (`centroid - circumcenter`). Its direction and length change as the
//! triangle deforms, which is what the tau trackers watch.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, triangle_circumcenter, Vec3};
use crate::topology::Triangle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerLine {
    pub centroid: Vec3,
    pub circumcenter: Vec3,
    /// `centroid - circumcenter`
    pub vector: Vec3,
}

impl EulerLine {
    pub fn length(&self) -> f64 {
        self.vector.norm()
    }

    /// Unit direction, or zero for an equilateral triangle
    pub fn direction(&self) -> Vec3 {
        geometry::safe_normal(&self.vector)
    }

    /// False for degenerate triangles, whose circumcenter is at infinity.
    pub fn is_finite(&self) -> bool {
        geometry::is_finite(&self.centroid)
            && geometry::is_finite(&self.circumcenter)
            && geometry::is_finite(&self.vector)
    }
}

pub fn centroid(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    (a + b + c) / 3.0
}

/// Centroid, absolute circumcenter and Euler-line vector of `abc`.
///
/// NaN/Inf from a degenerate triangle are propagated, not reported.
pub fn compute_euler_line(a: &Vec3, b: &Vec3, c: &Vec3) -> EulerLine {
    let centroid = centroid(a, b, c);
    let circumcenter = triangle_circumcenter(a, b, c);

    EulerLine {
        centroid,
        circumcenter,
        vector: centroid - circumcenter,
    }
}

impl Triangle {
    pub fn euler_line(&self) -> EulerLine {
        compute_euler_line(self.a(), self.b(), self.c())
    }
}
