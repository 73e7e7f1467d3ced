//! # Tau-Pipeline
//!
//! Drives the skeleton mesh and its tau trackers frame by frame.
//!
//! ## Frame Flow
//!
//! 1. **Validation**: raw sensor arrays become a [`tau_core::JointFrame`] or
//!    the frame is dropped with its trackers untouched
//! 2. **Triangulation**: the topology table turns 18 joints into triangles
//! 3. **Euler lines**: centroid minus circumcenter per triangle
//! 4. **Tracking**: each triangle's tracker takes its Euler line and `dt`
//! 5. **Bundling**: geometry and tau snapshots are packed for rendering
//!
//! [`PipelineDriver`] does one frame synchronously. [`PipelineWorker`] runs
//! the same work on tokio's blocking pool, one frame at a time.

pub mod config;
pub mod driver;
pub mod worker;

pub use self::config::*;
pub use driver::*;
pub use worker::*;
