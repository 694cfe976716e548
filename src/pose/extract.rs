use serde::{Deserialize, Serialize};

use super::Keypoint;
use crate::error::{PoseError, PoseResult, ShapeExpectation};

/// How one keypoint is laid out in a flat model output buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleLayout {
    /// `[x, y]` with no score. Points are reported fully confident.
    Xy,
    /// `[y, x, score]`, as emitted by single-pose lightning/thunder models.
    #[default]
    YxScore,
    /// `[x, y, score]`.
    XyScore,
}

impl TupleLayout {
    pub fn tuple_size(self) -> usize {
        match self {
            TupleLayout::Xy => 2,
            TupleLayout::YxScore | TupleLayout::XyScore => 3,
        }
    }

    fn decode(self, tuple: &[f32]) -> Keypoint {
        match self {
            TupleLayout::Xy => Keypoint::new(tuple[0], tuple[1], 1.0),
            TupleLayout::YxScore => Keypoint::new(tuple[1], tuple[0], clamp_score(tuple[2])),
            TupleLayout::XyScore => Keypoint::new(tuple[0], tuple[1], clamp_score(tuple[2])),
        }
    }
}

/// Group a flat output buffer into keypoints, in buffer order.
///
/// The buffer may describe any number of points; only its length modulo the
/// tuple size is checked.
pub fn extract_keypoints(buffer: &[f32], layout: TupleLayout) -> PoseResult<Vec<Keypoint>> {
    let size = layout.tuple_size();
    if buffer.len() % size != 0 {
        return Err(PoseError::InvalidOutputShape {
            len: buffer.len(),
            expected: ShapeExpectation::MultipleOf(size),
        });
    }
    Ok(buffer
        .chunks_exact(size)
        .map(|tuple| layout.decode(tuple))
        .collect())
}

// NaN scores must never pass a confidence gate.
fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
