//! # Tau-Tracking
//!
//! Temporal tracking of triangle Euler lines.
//!
//! One [`TauTracker`] follows one triangle of the skeleton mesh. Each frame it
//! receives that triangle's Euler line and the time since the previous frame,
//! and emits:
//!
//! - **tau**: the current change divided by the average rate of change over a
//!   short smoothing window, for both the Euler-line angle and position;
//! - **tau-dot**: how fast tau itself is changing, with a "growing" flag when
//!   it crosses the growth threshold.
//!
//! Trackers carry no shared state. A list of them is owned by whoever is
//! processing the current frame and handed on to the next.

pub mod config;
pub mod history;
pub mod states;
pub mod tracker;

pub use config::*;
pub use history::*;
pub use states::*;
pub use tracker::*;
