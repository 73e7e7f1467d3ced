//! The tracker list handed from frame to frame.

use serde::{Deserialize, Serialize};

use crate::tracker::{TauSnapshot, TauTracker};

/// Trackers for every triangle of a topology, in triangle-index order.
///
/// Moved by value into each frame and returned with the result; there is
/// exactly one owner at any time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerStates(Vec<TauTracker>);

impl TrackerStates {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TauTracker> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TauTracker> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TauTracker> {
        self.0.iter_mut()
    }

    pub fn snapshots(&self) -> Vec<TauSnapshot> {
        self.0.iter().map(TauTracker::snapshot).collect()
    }

    pub fn into_inner(self) -> Vec<TauTracker> {
        self.0
    }
}

impl From<Vec<TauTracker>> for TrackerStates {
    fn from(trackers: Vec<TauTracker>) -> Self {
        Self(trackers)
    }
}

impl FromIterator<TauTracker> for TrackerStates {
    fn from_iter<I: IntoIterator<Item = TauTracker>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TrackerStates {
    type Item = &'a TauTracker;
    type IntoIter = std::slice::Iter<'a, TauTracker>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
