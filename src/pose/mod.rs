//! Body keypoints and the 17-point pose.
//!
//! - `BodyPart`: canonical labels in model output order
//! - `Keypoint`: one labelled point with a confidence score
//! - `Pose`: exactly 17 keypoints, index-addressed, low-confidence points kept in place

mod extract;
pub mod skeleton;

pub use extract::{extract_keypoints, TupleLayout};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PoseError, PoseResult, ShapeExpectation};

/// Number of keypoints in a single-person pose.
pub const KEYPOINT_COUNT: usize = 17;

/// Canonical body-part labels. Discriminants match the model output index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    pub const ALL: [BodyPart; KEYPOINT_COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BodyPart::Nose => "nose",
            BodyPart::LeftEye => "leftEye",
            BodyPart::RightEye => "rightEye",
            BodyPart::LeftEar => "leftEar",
            BodyPart::RightEar => "rightEar",
            BodyPart::LeftShoulder => "leftShoulder",
            BodyPart::RightShoulder => "rightShoulder",
            BodyPart::LeftElbow => "leftElbow",
            BodyPart::RightElbow => "rightElbow",
            BodyPart::LeftWrist => "leftWrist",
            BodyPart::RightWrist => "rightWrist",
            BodyPart::LeftHip => "leftHip",
            BodyPart::RightHip => "rightHip",
            BodyPart::LeftKnee => "leftKnee",
            BodyPart::RightKnee => "rightKnee",
            BodyPart::LeftAnkle => "leftAnkle",
            BodyPart::RightAnkle => "rightAnkle",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Label for an output index; anything past the table is `"unknown"`.
pub fn name_for_index(index: usize) -> &'static str {
    BodyPart::from_index(index).map_or("unknown", BodyPart::name)
}

/// A single detected landmark in some coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Model-reported probability in [0, 1].
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    /// Same point with coordinates multiplied per axis.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
            confidence: self.confidence,
        }
    }
}

/// One detected body in one frame.
///
/// The keypoint array is private so every `Pose` holds exactly
/// `KEYPOINT_COUNT` entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self { keypoints }
    }

    /// Build a pose from a flat model output buffer.
    pub fn from_output(buffer: &[f32], layout: TupleLayout) -> PoseResult<Self> {
        let points = extract_keypoints(buffer, layout)?;
        let keypoints: [Keypoint; KEYPOINT_COUNT] =
            points
                .try_into()
                .map_err(|_| PoseError::InvalidOutputShape {
                    len: buffer.len(),
                    expected: ShapeExpectation::Exactly(KEYPOINT_COUNT * layout.tuple_size()),
                })?;
        Ok(Self { keypoints })
    }

    pub fn get(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part.index()]
    }

    pub fn by_index(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    /// Keypoint for `part` if it clears `min_confidence`.
    pub fn require(&self, part: BodyPart, min_confidence: f32) -> PoseResult<&Keypoint> {
        let kp = self.get(part);
        if kp.is_visible(min_confidence) {
            Ok(kp)
        } else {
            Err(PoseError::MissingKeypoint(part))
        }
    }

    pub fn keypoints(&self) -> &[Keypoint; KEYPOINT_COUNT] {
        &self.keypoints
    }

    /// Keypoints paired with their labels, in canonical order.
    pub fn labelled(&self) -> impl Iterator<Item = (BodyPart, &Keypoint)> + '_ {
        BodyPart::ALL.iter().copied().zip(self.keypoints.iter())
    }

    /// Map every coordinate into another space; confidences are untouched.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            keypoints: self.keypoints.map(|kp| kp.scaled(sx, sy)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with(confidence: f32) -> Pose {
        let mut keypoints = [Keypoint::new(0.0, 0.0, confidence); KEYPOINT_COUNT];
        for (i, kp) in keypoints.iter_mut().enumerate() {
            kp.x = i as f32;
            kp.y = i as f32 * 10.0;
        }
        Pose::new(keypoints)
    }

    #[test]
    fn indices_follow_canonical_order() {
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
            assert_eq!(BodyPart::from_index(i), Some(*part));
        }
        assert_eq!(BodyPart::from_index(KEYPOINT_COUNT), None);
    }

    #[test]
    fn name_lookup_falls_back_to_unknown() {
        assert_eq!(name_for_index(0), "nose");
        assert_eq!(name_for_index(5), "leftShoulder");
        assert_eq!(name_for_index(16), "rightAnkle");
        assert_eq!(name_for_index(17), "unknown");
    }

    #[test]
    fn require_rejects_low_confidence() {
        let pose = pose_with(0.2);
        assert!(matches!(
            pose.require(BodyPart::LeftShoulder, 0.3),
            Err(PoseError::MissingKeypoint(BodyPart::LeftShoulder))
        ));
        assert!(pose.require(BodyPart::LeftShoulder, 0.2).is_ok());
    }

    #[test]
    fn scaling_keeps_confidence() {
        let pose = pose_with(0.7).scaled(2.0, 0.5);
        let hip = pose.get(BodyPart::LeftHip);
        assert_eq!(hip.x, 22.0);
        assert_eq!(hip.y, 55.0);
        assert_eq!(hip.confidence, 0.7);
    }

    #[test]
    fn labelled_pairs_every_keypoint() {
        let pose = pose_with(1.0);
        let labels: Vec<_> = pose.labelled().map(|(part, _)| part).collect();
        assert_eq!(labels, BodyPart::ALL.to_vec());
    }
}
