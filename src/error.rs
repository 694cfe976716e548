//! Domain errors for keypoint extraction, counting and the model handle.
//!
//! Binaries and I/O layers work with `anyhow::Result`; these stay
//! downcastable when they travel through it.

use std::fmt;

use crate::model::ModelState;
use crate::pose::BodyPart;

/// What an output buffer was expected to look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeExpectation {
    /// Length must be a multiple of the tuple size.
    MultipleOf(usize),
    /// Length must be exactly this many values.
    Exactly(usize),
}

impl fmt::Display for ShapeExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeExpectation::MultipleOf(n) => write!(f, "a multiple of {n}"),
            ShapeExpectation::Exactly(n) => write!(f, "exactly {n}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("invalid output shape: got {len} values, expected {expected}")]
    InvalidOutputShape {
        len: usize,
        expected: ShapeExpectation,
    },

    #[error("required keypoint {0} is missing or below confidence threshold")]
    MissingKeypoint(BodyPart),

    #[error("model not ready for inference (state: {0})")]
    ModelUninitialized(ModelState),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type PoseResult<T> = Result<T, PoseError>;
