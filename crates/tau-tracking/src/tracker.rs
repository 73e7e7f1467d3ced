//! Per-triangle tau tracker.
//!
//! ## Tau
//!
//! Tau is the time a motion needs to close its current gap at the current
//! average rate: `tau = change / average_rate`. Each tracker follows one
//! triangle's Euler line and produces two taus per frame:
//!
//! - **angle tau**: the angle swept by the Euler-line direction since the
//!   last frame, over the mean angle swept per mean frame time;
//! - **position tau**: the distance between consecutive unit Euler-line
//!   directions, over the mean squared jump between consecutive raw
//!   Euler-line changes per mean frame time.
//!
//! Tau-dot is the frame-to-frame rate of change of each tau. A tau-dot at or
//! above the growth threshold marks that signal as growing.
//!
//! Every history is bounded by the smoothing window. Averages are taken over
//! the untrimmed histories, so the newest sample of a cycle always counts.

use serde::{Deserialize, Serialize};
use tau_core::{angle_between, is_finite, safe_normal, Vec3};

use crate::config::TauConfig;
use crate::history::{MotionSample, SampleHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackerPhase {
    /// No sample yet
    #[default]
    Uninitialized,
    /// One motion sample: nothing to compare against
    Warming,
    /// Two or more motion samples
    Steady,
}

/// What one [`TauTracker::update`] appended
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TauUpdate {
    pub angle_change: Option<f64>,
    pub position_change: Option<Vec3>,
    pub angle_tau: Option<f64>,
    pub position_tau: Option<f64>,
    pub angle_tau_dot: Option<f64>,
    pub position_tau_dot: Option<f64>,
}

impl TauUpdate {
    /// True when the update appended nothing (seeding or a skipped sample)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Latest per-triangle values for the visualization side
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TauSnapshot {
    pub phase: TrackerPhase,
    pub angle_tau: Option<f64>,
    pub position_tau: Option<f64>,
    pub angle_tau_dot: Option<f64>,
    pub position_tau_dot: Option<f64>,
    pub is_angle_growing: bool,
    pub is_position_growing: bool,
}

/// Tau tracker for a single triangle.
///
/// Identity is the triangle index; `name` is for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TauTracker {
    index: usize,
    name: String,
    config: TauConfig,
    phase: TrackerPhase,

    motion_path: SampleHistory<MotionSample>,
    elapsed_times: SampleHistory<f64>,
    angle_changes: SampleHistory<f64>,
    position_changes: SampleHistory<Vec3>,
    angle_taus: SampleHistory<f64>,
    position_taus: SampleHistory<f64>,
    angle_tau_dots: SampleHistory<f64>,
    position_tau_dots: SampleHistory<f64>,

    is_angle_growing: bool,
    is_position_growing: bool,

    /// Session-relative seconds
    current_time: f64,
    skipped_non_finite: u64,
}

impl TauTracker {
    pub fn new(index: usize, name: impl Into<String>, config: TauConfig) -> Self {
        Self {
            index,
            name: name.into(),
            config,
            phase: TrackerPhase::Uninitialized,
            motion_path: SampleHistory::new(),
            elapsed_times: SampleHistory::new(),
            angle_changes: SampleHistory::new(),
            position_changes: SampleHistory::new(),
            angle_taus: SampleHistory::new(),
            position_taus: SampleHistory::new(),
            angle_tau_dots: SampleHistory::new(),
            position_tau_dots: SampleHistory::new(),
            is_angle_growing: false,
            is_position_growing: false,
            current_time: 0.0,
            skipped_non_finite: 0,
        }
    }

    /// Start a new gesture at `euler_line`, discarding all history.
    pub fn seed(&mut self, euler_line: Vec3) {
        if self.rejects(&euler_line) {
            return;
        }

        self.clear_histories();
        self.current_time = 0.0;
        self.motion_path.push(MotionSample::new(euler_line, 0.0));
        self.phase = TrackerPhase::Warming;

        tracing::debug!("Seeded tracker {} ({})", self.index, self.name);
    }

    /// Feed the next Euler line observed `dt` seconds after the previous one.
    pub fn update(&mut self, euler_line: Vec3, dt: f64) -> TauUpdate {
        if self.phase == TrackerPhase::Uninitialized {
            self.seed(euler_line);
            return TauUpdate::default();
        }
        if self.rejects(&euler_line) {
            return TauUpdate::default();
        }

        self.current_time += dt;
        self.elapsed_times.push(dt);
        self.motion_path
            .push(MotionSample::new(euler_line, self.current_time));

        let update = self.record_gesture_change(dt);

        self.trim();
        if self.motion_path.len() >= 2 {
            self.phase = TrackerPhase::Steady;
        }

        tracing::trace!(
            "Triangle {} tau: angle={:?} position={:?} angle_dot={:?} position_dot={:?}",
            self.index,
            update.angle_tau,
            update.position_tau,
            update.angle_tau_dot,
            update.position_tau_dot
        );

        update
    }

    fn record_gesture_change(&mut self, dt: f64) -> TauUpdate {
        let mut update = TauUpdate::default();

        let (Some(beginning), Some(ending)) = (
            self.motion_path.previous().map(|s| s.vector),
            self.motion_path.latest().map(|s| s.vector),
        ) else {
            return update;
        };

        let position_change = ending - beginning;
        self.position_changes.push(position_change);
        update.position_change = Some(position_change);

        let beginning = safe_normal(&beginning);
        let ending = safe_normal(&ending);

        let angle_change = angle_between(&beginning, &ending);
        self.angle_changes.push(angle_change);
        update.angle_change = Some(angle_change);

        let timed = self.elapsed_times.len() >= 2 && dt > 0.0;
        let mean_elapsed = self.elapsed_times.mean().unwrap_or(0.0);

        if timed && self.angle_changes.len() >= 2 {
            let mean_angle = self.angle_changes.mean().unwrap_or(0.0);
            let tau = self.thresholded_tau(angle_change, mean_angle / mean_elapsed);
            self.angle_taus.push(tau);
            update.angle_tau = Some(tau);
        }

        if timed && self.position_changes.len() >= 2 {
            let distance = (ending - beginning).norm();
            let mean_jump = self.position_changes.consecutive_squared_distances()
                / self.position_changes.len() as f64;
            let tau = self.thresholded_tau(distance, mean_jump / mean_elapsed);
            self.position_taus.push(tau);
            update.position_tau = Some(tau);
        }

        if dt > 0.0 {
            if let Some(tau_dot) = tau_dot(&self.angle_taus, dt) {
                self.angle_tau_dots.push(tau_dot);
                self.is_angle_growing = tau_dot >= self.config.tau_dot_growth_threshold;
                update.angle_tau_dot = Some(tau_dot);
            }
            if let Some(tau_dot) = tau_dot(&self.position_taus, dt) {
                self.position_tau_dots.push(tau_dot);
                self.is_position_growing = tau_dot >= self.config.tau_dot_growth_threshold;
                update.position_tau_dot = Some(tau_dot);
            }
        }

        update
    }

    /// `change / velocity`, or exactly zero when either is below threshold.
    fn thresholded_tau(&self, change: f64, velocity: f64) -> f64 {
        let threshold = self.config.velocity_magnitude_threshold;
        if velocity.abs() >= threshold && change.abs() >= threshold {
            change / velocity
        } else {
            0.0
        }
    }

    fn rejects(&mut self, euler_line: &Vec3) -> bool {
        if !self.config.skip_non_finite || is_finite(euler_line) {
            return false;
        }
        self.skipped_non_finite += 1;
        tracing::debug!(
            "Tracker {} skipped non-finite Euler line ({} so far)",
            self.index,
            self.skipped_non_finite
        );
        true
    }

    fn trim(&mut self) {
        let window = self.config.smoothing_window;
        self.motion_path.trim_to(window);
        self.elapsed_times.trim_to(window);
        self.angle_changes.trim_to(window);
        self.position_changes.trim_to(window);
        self.angle_taus.trim_to(window);
        self.position_taus.trim_to(window);
        self.angle_tau_dots.trim_to(window);
        self.position_tau_dots.trim_to(window);
    }

    fn clear_histories(&mut self) {
        self.motion_path.clear();
        self.elapsed_times.clear();
        self.angle_changes.clear();
        self.position_changes.clear();
        self.angle_taus.clear();
        self.position_taus.clear();
        self.angle_tau_dots.clear();
        self.position_tau_dots.clear();
        self.is_angle_growing = false;
        self.is_position_growing = false;
    }

    /// Back to `Uninitialized`; the next update seeds.
    pub fn reset(&mut self) {
        self.clear_histories();
        self.current_time = 0.0;
        self.phase = TrackerPhase::Uninitialized;
    }

    pub fn snapshot(&self) -> TauSnapshot {
        TauSnapshot {
            phase: self.phase,
            angle_tau: self.angle_taus.latest().copied(),
            position_tau: self.position_taus.latest().copied(),
            angle_tau_dot: self.angle_tau_dots.latest().copied(),
            position_tau_dot: self.position_tau_dots.latest().copied(),
            is_angle_growing: self.is_angle_growing,
            is_position_growing: self.is_position_growing,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TauConfig {
        &self.config
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn motion_path(&self) -> &SampleHistory<MotionSample> {
        &self.motion_path
    }

    pub fn elapsed_times(&self) -> &SampleHistory<f64> {
        &self.elapsed_times
    }

    pub fn angle_changes(&self) -> &SampleHistory<f64> {
        &self.angle_changes
    }

    pub fn position_changes(&self) -> &SampleHistory<Vec3> {
        &self.position_changes
    }

    pub fn angle_taus(&self) -> &SampleHistory<f64> {
        &self.angle_taus
    }

    pub fn position_taus(&self) -> &SampleHistory<f64> {
        &self.position_taus
    }

    pub fn angle_tau_dots(&self) -> &SampleHistory<f64> {
        &self.angle_tau_dots
    }

    pub fn position_tau_dots(&self) -> &SampleHistory<f64> {
        &self.position_tau_dots
    }

    pub fn is_angle_growing(&self) -> bool {
        self.is_angle_growing
    }

    pub fn is_position_growing(&self) -> bool {
        self.is_position_growing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn skipped_non_finite(&self) -> u64 {
        self.skipped_non_finite
    }
}

/// Needs more than two taus so the previous one was itself computed
/// against a full comparison.
fn tau_dot(taus: &SampleHistory<f64>, dt: f64) -> Option<f64> {
    if taus.len() <= 2 {
        return None;
    }
    let (latest, previous) = (taus.latest()?, taus.previous()?);
    Some((latest - previous) / dt)
}
