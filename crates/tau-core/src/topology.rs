//! Fixed triangle mesh over the 18 skeleton joints.
//!
//! The mesh is plain data: a table of joint-slot index triples. Triangle `i`
//! of every frame is built from row `i`, and trackers downstream are
//! associated with triangles purely by that row index.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Orientation3D, Vec3};
use crate::types::{JointFrame, JointSlot};

/// Three joint-slot indices into a [`JointFrame`]
pub type TriangleIndices = [usize; 3];

pub const STANDARD_TRIANGLE_COUNT: usize = 67;

/// The standard body mesh.
///
/// Slot numbers follow [`JointSlot`]: 0 head, 1 neck, 2 torso, 3 waist,
/// 4-7 left shoulder/elbow/wrist/hand, 8-11 right shoulder/elbow/wrist/hand,
/// 12-14 left hip/knee/ankle, 15-17 right hip/knee/ankle.
pub static STANDARD_TOPOLOGY: [TriangleIndices; STANDARD_TRIANGLE_COUNT] = [
    // Center, symmetrical
    [1, 12, 15],
    [1, 14, 17],
    [3, 4, 8],
    [3, 7, 11],
    [3, 12, 15],
    // Right side, head
    [1, 8, 2],
    [1, 8, 3],
    [1, 9, 10],
    [1, 9, 17],
    // Right side, chest
    [3, 8, 1],
    [3, 8, 10],
    [3, 15, 17],
    [3, 9, 10],
    // Right side, hip
    [15, 8, 12],
    [15, 8, 9],
    [15, 8, 10],
    [15, 1, 8],
    [15, 9, 10],
    [15, 16, 13],
    [15, 16, 17],
    // Right side, knee
    [16, 8, 9],
    [16, 8, 13],
    [16, 15, 12],
    [16, 17, 14],
    // Right side, ankle
    [17, 8, 4],
    [17, 16, 13],
    // Left side, head
    [1, 4, 2],
    [1, 4, 3],
    [1, 5, 6],
    [1, 5, 14],
    // Left side, chest
    [3, 4, 5],
    [3, 4, 6],
    [3, 12, 14],
    [3, 5, 6],
    // Left side, hip
    [12, 4, 15],
    [12, 4, 5],
    [12, 4, 6],
    [12, 2, 4],
    [12, 5, 6],
    [12, 13, 16],
    [12, 13, 14],
    // Left side, knee
    [13, 4, 5],
    [13, 4, 16],
    [13, 12, 15],
    [13, 14, 17],
    // Left side, ankle
    [14, 4, 8],
    [14, 13, 16],
    // Cross center
    [1, 9, 14],
    [1, 5, 17],
    [1, 9, 6],
    [1, 5, 10],
    [3, 15, 6],
    [3, 12, 10],
    [3, 8, 6],
    [3, 4, 10],
    [15, 4, 9],
    [12, 8, 5],
    [15, 4, 10],
    [12, 8, 6],
    [15, 5, 10],
    [12, 9, 6],
    [15, 13, 10],
    [12, 16, 6],
    [15, 14, 16],
    [12, 17, 13],
    [16, 4, 9],
    [13, 8, 5],
];

/// One mesh triangle resolved against a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Row in the topology table; the only identity a triangle has
    pub index: usize,
    pub slots: [JointSlot; 3],
    pub positions: [Vec3; 3],
    pub orientations: [Orientation3D; 3],
    pub labels: [String; 3],
}

impl Triangle {
    /// Vertex labels concatenated in order
    pub fn key(&self) -> String {
        self.labels.concat()
    }

    /// Human-readable tracker name; display only, never used for lookup.
    pub fn display_name(&self) -> String {
        format!("Triangle Tau Buffer {}{}", self.index, self.key())
    }

    pub fn a(&self) -> &Vec3 {
        &self.positions[0]
    }

    pub fn b(&self) -> &Vec3 {
        &self.positions[1]
    }

    pub fn c(&self) -> &Vec3 {
        &self.positions[2]
    }

    /// Twice the area; near zero means a degenerate triangle.
    pub fn doubled_area(&self) -> f64 {
        (self.b() - self.a()).cross(&(self.c() - self.a())).norm()
    }
}

/// A validated triangle table
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    triangles: Cow<'static, [TriangleIndices]>,
}

impl Topology {
    /// The built-in 67-triangle body mesh
    pub fn standard() -> Self {
        Self {
            triangles: Cow::Borrowed(&STANDARD_TOPOLOGY),
        }
    }

    /// A custom table; every index must name one of the 18 joint slots.
    pub fn new(triangles: Vec<TriangleIndices>) -> Result<Self> {
        for (triangle, indices) in triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= JointSlot::COUNT) {
                return Err(Error::InvalidTopology { triangle, index });
            }
        }
        Ok(Self {
            triangles: Cow::Owned(triangles),
        })
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangles(&self) -> &[TriangleIndices] {
        &self.triangles
    }

    pub fn get(&self, index: usize) -> Option<&TriangleIndices> {
        self.triangles.get(index)
    }

    /// Vertex indices flattened, three per triangle, in table order
    pub fn flat_indices(&self) -> Vec<usize> {
        self.triangles.iter().flatten().copied().collect()
    }

    /// Resolve every table row against `frame`.
    ///
    /// Always returns `self.len()` triangles in table order. An empty vector
    /// comes back only if a row cannot be resolved, which a validated
    /// topology and a validated frame rule out.
    pub fn build_triangles(&self, frame: &JointFrame) -> Vec<Triangle> {
        let mut triangles = Vec::with_capacity(self.len());

        for (index, indices) in self.triangles.iter().enumerate() {
            let (Some(j0), Some(j1), Some(j2)) = (
                frame.get(indices[0]),
                frame.get(indices[1]),
                frame.get(indices[2]),
            ) else {
                return Vec::new();
            };

            triangles.push(Triangle {
                index,
                slots: [j0.slot, j1.slot, j2.slot],
                positions: [
                    j0.position.to_vector(),
                    j1.position.to_vector(),
                    j2.position.to_vector(),
                ],
                orientations: [j0.orientation, j1.orientation, j2.orientation],
                labels: [j0.label.clone(), j1.label.clone(), j2.label.clone()],
            });
        }

        triangles
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position3D, Timestamp};

    fn frame_with(f: impl Fn(usize) -> Position3D) -> JointFrame {
        let positions = std::array::from_fn(f);
        JointFrame::from_positions(Timestamp::from_nanos(0), positions)
    }

    #[test]
    fn test_standard_topology_is_valid() {
        let topology = Topology::standard();
        assert_eq!(topology.len(), STANDARD_TRIANGLE_COUNT);
        assert!(Topology::new(STANDARD_TOPOLOGY.to_vec()).is_ok());
        assert_eq!(topology.flat_indices().len(), STANDARD_TRIANGLE_COUNT * 3);
        assert_eq!(&topology.flat_indices()[..3], &[1, 12, 15]);
    }

    #[test]
    fn test_invalid_topology_rejected() {
        let err = Topology::new(vec![[0, 1, 2], [3, 18, 4]]).unwrap_err();
        assert_eq!(err, Error::InvalidTopology { triangle: 1, index: 18 });
    }

    #[test]
    fn test_build_triangles_count_and_order() {
        let frame = frame_with(|i| Position3D::new(i as f64, (i * i) as f64, 1.0));
        let triangles = Topology::standard().build_triangles(&frame);

        assert_eq!(triangles.len(), STANDARD_TRIANGLE_COUNT);
        for (i, triangle) in triangles.iter().enumerate() {
            assert_eq!(triangle.index, i);
            let indices = STANDARD_TOPOLOGY[i];
            for k in 0..3 {
                assert_eq!(triangle.slots[k].index(), indices[k]);
                assert_eq!(triangle.positions[k].x, indices[k] as f64);
            }
        }
    }

    #[test]
    fn test_build_triangles_deterministic() {
        let make = || frame_with(|i| Position3D::new(0.1 * i as f64, -0.3 * i as f64, 2.0));
        let topology = Topology::standard();

        let first = topology.build_triangles(&make());
        let second = topology.build_triangles(&make());
        assert_eq!(first, second);
    }

    #[test]
    fn test_count_independent_of_values() {
        // Every joint at the origin: all triangles degenerate, count unchanged.
        let frame = frame_with(|_| Position3D::origin());
        let triangles = Topology::standard().build_triangles(&frame);
        assert_eq!(triangles.len(), STANDARD_TRIANGLE_COUNT);
        assert!(triangles.iter().all(|t| t.doubled_area() == 0.0));
    }

    #[test]
    fn test_triangle_names() {
        let frame = frame_with(|i| Position3D::new(i as f64, 0.0, 0.0));
        let triangles = Topology::standard().build_triangles(&frame);

        assert_eq!(triangles[0].key(), "NeckLeftHipRightHip");
        assert_eq!(
            triangles[0].display_name(),
            "Triangle Tau Buffer 0NeckLeftHipRightHip"
        );
    }

    #[test]
    fn test_custom_topology() {
        let topology = Topology::new(vec![[0, 4, 8]]).unwrap();
        let frame = frame_with(|i| Position3D::new(i as f64, 1.0, 0.0));
        let triangles = topology.build_triangles(&frame);

        assert_eq!(triangles.len(), 1);
        assert_eq!(
            triangles[0].slots,
            [JointSlot::Head, JointSlot::LeftShoulder, JointSlot::RightShoulder]
        );
    }
}
