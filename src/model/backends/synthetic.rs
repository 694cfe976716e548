use std::f32::consts::TAU;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::model::backend::{InputShape, OutputSpace, PoseBackend};
use crate::pose::{BodyPart, TupleLayout, KEYPOINT_COUNT};

/// Shape of the simulated push-up motion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticMotion {
    /// Frames per full down/up cycle.
    pub period_frames: u32,
    /// Peak shoulder offset from the hips, as a fraction of frame height.
    pub amplitude: f32,
    /// Hip height, as a fraction of frame height.
    pub hip_y: f32,
    /// Score reported for every keypoint.
    pub score: f32,
    /// Every Nth inference reports both shoulders at zero confidence.
    pub occlude_every: Option<u32>,
}

impl Default for SyntheticMotion {
    fn default() -> Self {
        Self {
            period_frames: 20,
            amplitude: 0.25,
            hip_y: 0.5,
            score: 0.9,
            occlude_every: None,
        }
    }
}

/// Deterministic backend that emits a single-pose output buffer for a body
/// doing push-ups. Frame pixels are ignored.
///
/// At tick `t` the shoulders sit `amplitude * cos(TAU * t / period)` below
/// the hips, so the first inference is the bottom of a repetition.
pub struct SyntheticBackend {
    motion: SyntheticMotion,
    ticks: u64,
}

impl SyntheticBackend {
    pub fn new(motion: SyntheticMotion) -> Self {
        Self { motion, ticks: 0 }
    }

    /// Shoulder offset below the hips at tick `t`, in frame-height fractions.
    pub fn offset_at(&self, t: u64) -> f32 {
        let period = self.motion.period_frames.max(1) as f32;
        let phase = (t % self.motion.period_frames.max(1) as u64) as f32 / period;
        self.motion.amplitude * (TAU * phase).cos()
    }

    fn keypoint_row(part: BodyPart, shoulder_y: f32, hip_y: f32) -> (f32, f32) {
        // (y, x) in normalized coordinates, subject seen from the front.
        let ankle_y = (hip_y + 0.35).min(1.0);
        let knee_y = (hip_y + ankle_y) / 2.0;
        match part {
            BodyPart::Nose => (shoulder_y - 0.12, 0.5),
            BodyPart::LeftEye => (shoulder_y - 0.14, 0.52),
            BodyPart::RightEye => (shoulder_y - 0.14, 0.48),
            BodyPart::LeftEar => (shoulder_y - 0.13, 0.55),
            BodyPart::RightEar => (shoulder_y - 0.13, 0.45),
            BodyPart::LeftShoulder => (shoulder_y, 0.62),
            BodyPart::RightShoulder => (shoulder_y, 0.38),
            BodyPart::LeftElbow => (shoulder_y + 0.08, 0.66),
            BodyPart::RightElbow => (shoulder_y + 0.08, 0.34),
            BodyPart::LeftWrist => (shoulder_y + 0.16, 0.64),
            BodyPart::RightWrist => (shoulder_y + 0.16, 0.36),
            BodyPart::LeftHip => (hip_y, 0.58),
            BodyPart::RightHip => (hip_y, 0.42),
            BodyPart::LeftKnee => (knee_y, 0.57),
            BodyPart::RightKnee => (knee_y, 0.43),
            BodyPart::LeftAnkle => (ankle_y, 0.56),
            BodyPart::RightAnkle => (ankle_y, 0.44),
        }
    }
}

impl PoseBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn input_shape(&self) -> InputShape {
        InputShape::new(192, 192)
    }

    fn output_layout(&self) -> TupleLayout {
        TupleLayout::YxScore
    }

    fn output_space(&self) -> OutputSpace {
        OutputSpace::Normalized
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Vec<f32>> {
        let t = self.ticks;
        self.ticks += 1;

        let hip_y = self.motion.hip_y;
        let shoulder_y = hip_y + self.offset_at(t);
        let occluded = self
            .motion
            .occlude_every
            .is_some_and(|n| n > 0 && (t + 1) % n as u64 == 0);

        let mut output = Vec::with_capacity(KEYPOINT_COUNT * 3);
        for part in BodyPart::ALL {
            let (y, x) = Self::keypoint_row(part, shoulder_y, hip_y);
            let score = match part {
                BodyPart::LeftShoulder | BodyPart::RightShoulder if occluded => 0.0,
                _ => self.motion.score,
            };
            output.extend_from_slice(&[y, x, score]);
        }
        Ok(output)
    }
}
