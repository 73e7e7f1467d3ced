//! Tracker tuning.

use serde::{Deserialize, Serialize};
use tau_core::{Error, Result};

/// Tau tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TauConfig {
    /// Samples retained in every history
    pub smoothing_window: usize,
    /// Average velocity and latest change must both reach this, else tau is 0
    pub velocity_magnitude_threshold: f64,
    /// Tau-dot at or above this marks the signal as growing
    pub tau_dot_growth_threshold: f64,
    /// Drop NaN/Inf Euler lines before they reach any history
    pub skip_non_finite: bool,
}

impl Default for TauConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            velocity_magnitude_threshold: 0.1,
            tau_dot_growth_threshold: 0.5,
            skip_non_finite: true,
        }
    }
}

impl TauConfig {
    pub fn validate(&self) -> Result<()> {
        // tau-dot needs the latest and previous tau after trimming
        if self.smoothing_window < 2 {
            return Err(Error::Config(format!(
                "tau.smoothing_window must be at least 2, got {}",
                self.smoothing_window
            )));
        }
        if self.velocity_magnitude_threshold.is_nan() || self.velocity_magnitude_threshold < 0.0 {
            return Err(Error::Config(format!(
                "tau.velocity_magnitude_threshold must be non-negative, got {}",
                self.velocity_magnitude_threshold
            )));
        }
        if self.tau_dot_growth_threshold.is_nan() || self.tau_dot_growth_threshold < 0.0 {
            return Err(Error::Config(format!(
                "tau.tau_dot_growth_threshold must be non-negative, got {}",
                self.tau_dot_growth_threshold
            )));
        }
        Ok(())
    }
}
