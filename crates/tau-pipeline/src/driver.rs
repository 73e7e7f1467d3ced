//! Per-frame processing: joints in, triangle geometry and tau signals out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tau_core::{
    ConstructionLines, Error, EulerLine, JointFrame, JointSlot, Orientation3D, RawJointFrame,
    Result, Timestamp, Topology, Triangle, Vec3,
};
use tau_tracking::{TauSnapshot, TauTracker, TrackerStates};

use crate::config::PipelineConfig;

/// Everything the rendering side needs for one frame.
///
/// Flat vectors hold three entries per triangle in topology order; the
/// per-triangle vectors hold one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameBundle {
    pub timestamp: Timestamp,
    pub triangle_indices: Vec<usize>,
    pub positions: Vec<Vec3>,
    pub orientations: Vec<Orientation3D>,
    pub labels: Vec<String>,
    pub centroids: Vec<Vec3>,
    pub circumcenters: Vec<Vec3>,
    pub euler_lines: Vec<Vec3>,
    /// Only for triangles inside the configured debug range
    pub construction: Vec<(usize, ConstructionLines)>,
    pub snapshots: Vec<TauSnapshot>,
}

impl FrameBundle {
    pub fn triangle_count(&self) -> usize {
        self.euler_lines.len()
    }
}

/// Result of processing a frame: the bundle plus the trackers for the next one
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub bundle: FrameBundle,
    pub trackers: TrackerStates,
}

/// A frame that failed validation; the trackers come back untouched.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Frame rejected: {error}")]
pub struct FrameRejected {
    pub error: Error,
    pub trackers: TrackerStates,
}

/// Stateless frame processor.
///
/// Tracker state is passed in and handed back by value, so one driver can be
/// cloned freely across threads.
#[derive(Debug, Clone)]
pub struct PipelineDriver {
    topology: Arc<Topology>,
    config: PipelineConfig,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_topology(Topology::standard(), config)
    }

    pub fn with_topology(topology: Topology, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            topology: Arc::new(topology),
            config,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate raw sensor arrays, then process them.
    pub fn process_raw(
        &self,
        raw: RawJointFrame,
        dt: f64,
        trackers: TrackerStates,
    ) -> std::result::Result<FrameOutput, FrameRejected> {
        match JointFrame::from_raw(raw) {
            Ok(frame) => self.process_frame(&frame, dt, trackers),
            Err(error) => {
                tracing::warn!("Dropping joint frame: {}", error);
                Err(FrameRejected { error, trackers })
            }
        }
    }

    /// Build this frame's triangles and advance every tracker by `dt` seconds.
    ///
    /// An empty tracker list is seeded from this frame. A list whose length
    /// does not match the topology is discarded and reseeded. A frame that
    /// does not resolve every triangle is rejected with the list untouched.
    pub fn process_frame(
        &self,
        frame: &JointFrame,
        dt: f64,
        trackers: TrackerStates,
    ) -> std::result::Result<FrameOutput, FrameRejected> {
        let triangles = self.topology.build_triangles(frame);
        if triangles.len() != self.topology.len() {
            let error = Error::JointCount {
                expected: JointSlot::COUNT,
                actual: frame.len(),
            };
            tracing::warn!("Dropping joint frame: {}", error);
            return Err(FrameRejected { error, trackers });
        }

        let lines: Vec<EulerLine> = triangles.iter().map(Triangle::euler_line).collect();

        let mut trackers = trackers;
        if !trackers.is_empty() && trackers.len() != lines.len() {
            tracing::warn!(
                "Tracker count {} does not match {} triangles, reseeding",
                trackers.len(),
                lines.len()
            );
            trackers = TrackerStates::new();
        }

        if trackers.is_empty() {
            trackers = self.seed_trackers(&triangles, &lines);
        } else {
            for (tracker, line) in trackers.iter_mut().zip(&lines) {
                tracker.update(line.vector, dt);
            }
        }

        let construction = triangles
            .iter()
            .filter(|t| self.config.debug_triangles.contains(t.index))
            .map(|t| (t.index, t.construction_lines()))
            .collect();

        let bundle = FrameBundle {
            timestamp: frame.timestamp,
            triangle_indices: self.topology.flat_indices(),
            positions: triangles.iter().flat_map(|t| t.positions).collect(),
            orientations: triangles.iter().flat_map(|t| t.orientations).collect(),
            labels: triangles.iter().flat_map(|t| t.labels.clone()).collect(),
            centroids: lines.iter().map(|l| l.centroid).collect(),
            circumcenters: lines.iter().map(|l| l.circumcenter).collect(),
            euler_lines: lines.iter().map(|l| l.vector).collect(),
            construction,
            snapshots: trackers.snapshots(),
        };

        Ok(FrameOutput { bundle, trackers })
    }

    fn seed_trackers(&self, triangles: &[Triangle], lines: &[EulerLine]) -> TrackerStates {
        tracing::debug!("Seeding {} triangle trackers", triangles.len());

        triangles
            .iter()
            .zip(lines)
            .map(|(triangle, line)| {
                let mut tracker =
                    TauTracker::new(triangle.index, triangle.display_name(), self.config.tau.clone());
                tracker.seed(line.vector);
                tracker
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DebugTriangles;
    use approx::assert_relative_eq;
    use tau_core::{Position3D, STANDARD_TRIANGLE_COUNT};
    use tau_tracking::TrackerPhase;

    const DT: f64 = 0.016;

    /// Upright standing pose
    pub(crate) fn standing_pose() -> [Position3D; JointSlot::COUNT] {
        [
            Position3D::new(0.0, 1.7, 0.02),    // Head
            Position3D::new(0.0, 1.5, 0.0),     // Neck
            Position3D::new(0.0, 1.3, 0.03),    // Torso
            Position3D::new(0.0, 1.05, 0.01),   // Waist
            Position3D::new(-0.2, 1.45, 0.0),   // LeftShoulder
            Position3D::new(-0.45, 1.3, 0.05),  // LeftElbow
            Position3D::new(-0.6, 1.1, 0.1),    // LeftWrist
            Position3D::new(-0.65, 1.0, 0.12),  // LeftHand
            Position3D::new(0.2, 1.45, 0.0),    // RightShoulder
            Position3D::new(0.45, 1.3, 0.05),   // RightElbow
            Position3D::new(0.6, 1.1, 0.1),     // RightWrist
            Position3D::new(0.65, 1.0, 0.12),   // RightHand
            Position3D::new(-0.2, 1.0, 0.0),    // LeftHip
            Position3D::new(-0.22, 0.55, 0.04), // LeftKnee
            Position3D::new(-0.23, 0.1, 0.0),   // LeftAnkle
            Position3D::new(0.2, 1.0, 0.0),     // RightHip
            Position3D::new(0.22, 0.55, 0.04),  // RightKnee
            Position3D::new(0.23, 0.1, 0.0),    // RightAnkle
        ]
    }

    /// The standing pose rotated about z by `angle` radians
    pub(crate) fn rotated_frame(angle: f64, nanos: i64) -> JointFrame {
        let (sin, cos) = angle.sin_cos();
        let positions = standing_pose().map(|p| {
            Position3D::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos, p.z)
        });
        JointFrame::from_positions(Timestamp::from_nanos(nanos), positions)
    }

    fn driver() -> PipelineDriver {
        PipelineDriver::new(PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_first_frame_seeds_trackers() {
        let output = driver()
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap();

        assert_eq!(output.trackers.len(), STANDARD_TRIANGLE_COUNT);
        assert!(output
            .trackers
            .iter()
            .all(|t| t.phase() == TrackerPhase::Warming));
        assert_eq!(
            output.trackers.get(0).map(|t| t.name()),
            Some("Triangle Tau Buffer 0NeckLeftHipRightHip")
        );

        let bundle = &output.bundle;
        assert_eq!(bundle.triangle_count(), STANDARD_TRIANGLE_COUNT);
        assert_eq!(bundle.triangle_indices.len(), STANDARD_TRIANGLE_COUNT * 3);
        assert_eq!(bundle.positions.len(), STANDARD_TRIANGLE_COUNT * 3);
        assert_eq!(bundle.orientations.len(), STANDARD_TRIANGLE_COUNT * 3);
        assert_eq!(bundle.labels.len(), STANDARD_TRIANGLE_COUNT * 3);
        assert_eq!(bundle.snapshots.len(), STANDARD_TRIANGLE_COUNT);
        assert!(bundle.construction.is_empty());
        assert!(bundle.euler_lines.iter().all(tau_core::is_finite));
    }

    #[test]
    fn test_end_to_end_rotation() {
        let driver = driver();

        let first = driver
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap();

        // Triangle 0 is neck (0, 1.5, 0) and hips (-0.2, 1, 0), (0.2, 1, 0):
        // the circumcenter sits on the y-axis where (1.5 - y)^2 = 0.04 + (y - 1)^2.
        let bundle = &first.bundle;
        assert_relative_eq!(bundle.centroids[0], Vec3::new(0.0, 3.5 / 3.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(bundle.circumcenters[0], Vec3::new(0.0, 1.21, 0.0), epsilon = 1e-9);
        assert_relative_eq!(
            bundle.euler_lines[0],
            Vec3::new(0.0, 3.5 / 3.0 - 1.21, 0.0),
            epsilon = 1e-9
        );

        let five_degrees = 5.0_f64.to_radians();
        let second = driver
            .process_frame(&rotated_frame(five_degrees, 16_000_000), DT, first.trackers)
            .unwrap();

        let tracker = second.trackers.get(0).unwrap();
        assert_eq!(tracker.phase(), TrackerPhase::Steady);
        let angle = *tracker.angle_changes().latest().unwrap();
        assert_relative_eq!(angle, five_degrees, epsilon = 1e-9);
        assert_relative_eq!(tracker.current_time(), DT);
    }

    #[test]
    fn test_malformed_frame_leaves_trackers_unchanged() {
        let driver = driver();
        let seeded = driver
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap()
            .trackers;
        let advanced = driver
            .process_frame(&rotated_frame(0.1, 16_000_000), DT, seeded)
            .unwrap()
            .trackers;
        let before = advanced.clone();

        let mut raw = RawJointFrame::from(&rotated_frame(0.2, 32_000_000));
        raw.positions.truncate(17);

        let rejected = driver.process_raw(raw, DT, advanced).unwrap_err();
        assert!(matches!(rejected.error, Error::MalformedFrame { positions: 17, .. }));
        assert_eq!(rejected.trackers, before);

        let mut short = RawJointFrame::from(&rotated_frame(0.2, 32_000_000));
        short.labels.pop();
        short.positions.pop();
        short.orientations.pop();
        short.confidences.pop();
        let rejected = driver.process_raw(short, DT, rejected.trackers).unwrap_err();
        assert_eq!(rejected.error, Error::JointCount { expected: 18, actual: 17 });
        assert_eq!(rejected.trackers, before);
    }

    #[test]
    fn test_short_stored_frame_keeps_trackers() {
        let driver = driver();
        let trackers = driver
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap()
            .trackers;
        let before = trackers.clone();

        let mut stored = serde_json::to_value(rotated_frame(0.1, 16_000_000)).unwrap();
        for key in ["labels", "positions", "orientations", "confidences"] {
            stored[key].as_array_mut().unwrap().truncate(3);
        }
        assert!(serde_json::from_value::<JointFrame>(stored.clone()).is_err());

        let raw: RawJointFrame = serde_json::from_value(stored).unwrap();
        let rejected = driver.process_raw(raw, DT, trackers).unwrap_err();
        assert_eq!(rejected.error, Error::JointCount { expected: 18, actual: 3 });
        assert_eq!(rejected.trackers.len(), STANDARD_TRIANGLE_COUNT);
        assert_eq!(rejected.trackers, before);
    }

    #[test]
    fn test_process_raw_accepts_valid_frame() {
        let raw = RawJointFrame::from(&rotated_frame(0.0, 7));
        let output = driver().process_raw(raw, DT, TrackerStates::new()).unwrap();
        assert_eq!(output.bundle.timestamp, Timestamp::from_nanos(7));
        assert_eq!(output.trackers.len(), STANDARD_TRIANGLE_COUNT);
    }

    #[test]
    fn test_mismatched_trackers_are_reseeded() {
        let driver = driver();
        let small = PipelineDriver::with_topology(
            Topology::new(vec![[1, 12, 15], [3, 4, 8]]).unwrap(),
            PipelineConfig::default(),
        )
        .unwrap();

        let two = small
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap()
            .trackers;
        assert_eq!(two.len(), 2);

        let output = driver.process_frame(&rotated_frame(0.1, 1), DT, two).unwrap();
        assert_eq!(output.trackers.len(), STANDARD_TRIANGLE_COUNT);
        assert!(output
            .trackers
            .iter()
            .all(|t| t.phase() == TrackerPhase::Warming));
    }

    #[test]
    fn test_histories_settle_at_window() {
        let driver = driver();
        let mut trackers = TrackerStates::new();
        for frame in 0..12 {
            let angle = 0.15 * frame as f64;
            trackers = driver
                .process_frame(&rotated_frame(angle, frame * 16_000_000), DT, trackers)
                .unwrap()
                .trackers;
        }

        for tracker in &trackers {
            assert_eq!(tracker.motion_path().len(), 3);
            assert_eq!(tracker.angle_taus().len(), 3);
            assert_eq!(tracker.position_tau_dots().len(), 3);
        }
    }

    #[test]
    fn test_construction_lines_for_debug_range() {
        let config = PipelineConfig {
            debug_triangles: DebugTriangles::range(2, 4),
            ..Default::default()
        };
        let driver = PipelineDriver::new(config).unwrap();

        let output = driver
            .process_frame(&rotated_frame(0.0, 0), DT, TrackerStates::new())
            .unwrap();
        let indices: Vec<usize> = output.bundle.construction.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![2, 3, 4]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.tau.smoothing_window = 0;
        assert!(PipelineDriver::new(config).is_err());
    }
}
