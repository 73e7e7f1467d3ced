//! # Tau-Core
//!
//! Core types and geometry for the tau skeleton pipeline: validated joint
//! frames, the fixed triangle topology over them, and per-triangle
//! circumcenter and Euler-line math.

pub mod construction;
pub mod error;
pub mod euler;
pub mod geometry;
pub mod topology;
pub mod types;

pub use construction::*;
pub use error::{Error, Result};
pub use euler::*;
pub use geometry::*;
pub use topology::*;
pub use types::*;
