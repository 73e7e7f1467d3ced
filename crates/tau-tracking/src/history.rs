//! Bounded FIFO sample histories.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tau_core::Vec3;

/// One point on a tracker's motion path: an Euler-line vector and the
/// session-relative time it was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub vector: Vec3,
    pub time: f64,
}

impl MotionSample {
    pub fn new(vector: Vec3, time: f64) -> Self {
        Self { vector, time }
    }
}

/// Append-only history that is trimmed from the front on demand.
///
/// Pushing never evicts; callers compute over the full history first and
/// then call [`SampleHistory::trim_to`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleHistory<T> {
    samples: VecDeque<T>,
}

impl<T> SampleHistory<T> {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
    }

    /// Drop the oldest samples until at most `window` remain.
    pub fn trim_to(&mut self, window: usize) {
        while self.samples.len() > window {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// The sample before the latest
    pub fn previous(&self) -> Option<&T> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }
}

impl SampleHistory<f64> {
    pub fn sum(&self) -> f64 {
        self.samples.iter().sum()
    }

    /// Arithmetic mean, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum() / self.samples.len() as f64)
        }
    }
}

impl SampleHistory<Vec3> {
    /// Sum of squared distances between consecutive samples
    pub fn consecutive_squared_distances(&self) -> f64 {
        self.samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(start, end)| (end - start).norm_squared())
            .sum()
    }
}

impl<T> Default for SampleHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for SampleHistory<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
