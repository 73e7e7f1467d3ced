//! Error types for the tau skeleton pipeline.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(
        "Malformed joint frame: {labels} labels, {positions} positions, \
         {orientations} orientations, {confidences} confidences"
    )]
    MalformedFrame {
        labels: usize,
        positions: usize,
        orientations: usize,
        confidences: usize,
    },

    #[error("Joint count mismatch: expected {expected}, got {actual}")]
    JointCount { expected: usize, actual: usize },

    #[error("Invalid topology: triangle {triangle} references joint slot {index}")]
    InvalidTopology { triangle: usize, index: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline worker already has a frame in flight")]
    WorkerBusy,

    #[error("Pipeline worker channel closed")]
    WorkerClosed,

    #[error("Pipeline worker needs a tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the errors that mean "this frame was dropped".
    pub fn is_frame_rejection(&self) -> bool {
        matches!(self, Error::MalformedFrame { .. } | Error::JointCount { .. })
    }
}
