//! Fundamental types for the tau skeleton pipeline.

use chrono::Utc;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Orientation3D;

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

}

/// 3D position in the caller's world coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// The 18 skeleton joint slots, in sensor order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum JointSlot {
    Head = 0,
    Neck = 1,
    Torso = 2,
    Waist = 3,
    LeftShoulder = 4,
    LeftElbow = 5,
    LeftWrist = 6,
    LeftHand = 7,
    RightShoulder = 8,
    RightElbow = 9,
    RightWrist = 10,
    RightHand = 11,
    LeftHip = 12,
    LeftKnee = 13,
    LeftAnkle = 14,
    RightHip = 15,
    RightKnee = 16,
    RightAnkle = 17,
}

impl JointSlot {
    pub const COUNT: usize = 18;

    pub const ALL: [JointSlot; Self::COUNT] = [
        Self::Head,
        Self::Neck,
        Self::Torso,
        Self::Waist,
        Self::LeftShoulder,
        Self::LeftElbow,
        Self::LeftWrist,
        Self::LeftHand,
        Self::RightShoulder,
        Self::RightElbow,
        Self::RightWrist,
        Self::RightHand,
        Self::LeftHip,
        Self::LeftKnee,
        Self::LeftAnkle,
        Self::RightHip,
        Self::RightKnee,
        Self::RightAnkle,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::Neck => "Neck",
            Self::Torso => "Torso",
            Self::Waist => "Waist",
            Self::LeftShoulder => "LeftShoulder",
            Self::LeftElbow => "LeftElbow",
            Self::LeftWrist => "LeftWrist",
            Self::LeftHand => "LeftHand",
            Self::RightShoulder => "RightShoulder",
            Self::RightElbow => "RightElbow",
            Self::RightWrist => "RightWrist",
            Self::RightHand => "RightHand",
            Self::LeftHip => "LeftHip",
            Self::LeftKnee => "LeftKnee",
            Self::LeftAnkle => "LeftAnkle",
            Self::RightHip => "RightHip",
            Self::RightKnee => "RightKnee",
            Self::RightAnkle => "RightAnkle",
        }
    }
}

/// A single tracked joint for one sensor frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub slot: JointSlot,
    /// Identity label reported by the sensor (bone name)
    pub label: String,
    pub position: Position3D,
    pub orientation: Orientation3D,
    /// Tracking confidence in [0, 1]
    pub confidence: f32,
}

impl Joint {
    pub fn new(slot: JointSlot, position: Position3D) -> Self {
        Self {
            slot,
            label: slot.name().to_string(),
            position,
            orientation: Orientation3D::identity(),
            confidence: 1.0,
        }
    }
}

/// Un-validated joint data as handed over by the body-tracking collaborator.
///
/// The four vectors are index-aligned; nothing guarantees that until
/// [`JointFrame::from_raw`] checks it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJointFrame {
    pub timestamp: Option<Timestamp>,
    pub labels: Vec<String>,
    pub positions: Vec<Position3D>,
    pub orientations: Vec<Orientation3D>,
    pub confidences: Vec<f32>,
}

impl RawJointFrame {
    pub fn new(
        labels: Vec<String>,
        positions: Vec<Position3D>,
        orientations: Vec<Orientation3D>,
        confidences: Vec<f32>,
    ) -> Self {
        Self {
            timestamp: None,
            labels,
            positions,
            orientations,
            confidences,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check that all four arrays have the same length and return it.
    pub fn aligned_len(&self) -> Result<usize> {
        let n = self.labels.len();
        if self.positions.len() != n || self.orientations.len() != n || self.confidences.len() != n
        {
            return Err(Error::MalformedFrame {
                labels: self.labels.len(),
                positions: self.positions.len(),
                orientations: self.orientations.len(),
                confidences: self.confidences.len(),
            });
        }
        Ok(n)
    }
}

impl From<&JointFrame> for RawJointFrame {
    fn from(frame: &JointFrame) -> Self {
        Self {
            timestamp: Some(frame.timestamp),
            labels: frame.joints.iter().map(|j| j.label.clone()).collect(),
            positions: frame.joints.iter().map(|j| j.position).collect(),
            orientations: frame.joints.iter().map(|j| j.orientation).collect(),
            confidences: frame.joints.iter().map(|j| j.confidence).collect(),
        }
    }
}

impl From<JointFrame> for RawJointFrame {
    fn from(frame: JointFrame) -> Self {
        Self::from(&frame)
    }
}

/// One validated sensor frame: exactly one joint per [`JointSlot`], in slot order.
///
/// Serialized as a [`RawJointFrame`]; deserializing goes through
/// [`JointFrame::from_raw`], so a stored frame is checked like a live one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJointFrame", into = "RawJointFrame")]
pub struct JointFrame {
    pub timestamp: Timestamp,
    joints: Vec<Joint>,
}

impl JointFrame {
    /// Build a frame from joints given in slot order.
    pub fn new(timestamp: Timestamp, joints: Vec<Joint>) -> Result<Self> {
        if joints.len() != JointSlot::COUNT {
            return Err(Error::JointCount {
                expected: JointSlot::COUNT,
                actual: joints.len(),
            });
        }

        let joints = joints
            .into_iter()
            .zip(JointSlot::ALL)
            .map(|(joint, slot)| Joint {
                slot,
                confidence: sanitize_confidence(joint.confidence),
                ..joint
            })
            .collect();

        Ok(Self { timestamp, joints })
    }

    /// Frame with every joint at the given positions and default labels.
    pub fn from_positions(timestamp: Timestamp, positions: [Position3D; JointSlot::COUNT]) -> Self {
        let joints = JointSlot::ALL
            .iter()
            .zip(positions)
            .map(|(slot, position)| Joint::new(*slot, position))
            .collect();
        Self { timestamp, joints }
    }

    /// Validate parallel sensor arrays into a frame.
    pub fn from_raw(raw: RawJointFrame) -> Result<Self> {
        let n = raw.aligned_len()?;
        if n != JointSlot::COUNT {
            return Err(Error::JointCount {
                expected: JointSlot::COUNT,
                actual: n,
            });
        }

        let timestamp = raw.timestamp.unwrap_or_else(Timestamp::now);
        let joints = JointSlot::ALL
            .iter()
            .zip(raw.labels)
            .zip(raw.positions)
            .zip(raw.orientations)
            .zip(raw.confidences)
            .map(|((((slot, label), position), orientation), confidence)| Joint {
                slot: *slot,
                label,
                position,
                orientation,
                confidence: sanitize_confidence(confidence),
            })
            .collect();

        Ok(Self { timestamp, joints })
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, slot: JointSlot) -> &Joint {
        &self.joints[slot.index()]
    }

    pub fn get(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

impl TryFrom<RawJointFrame> for JointFrame {
    type Error = Error;

    fn try_from(raw: RawJointFrame) -> Result<Self> {
        Self::from_raw(raw)
    }
}

fn sanitize_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
