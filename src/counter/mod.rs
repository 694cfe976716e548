//! Push-up repetition counter.
//!
//! Two phases, `Up` (initial) and `Down`. Shoulders dropping more than the
//! threshold below the hips enters `Down`; rising more than the threshold
//! above them returns to `Up` and completes one repetition. Inside the band
//! `[hip_y - threshold, hip_y + threshold]` the phase never changes, which
//! keeps jitter from double counting.
//!
//! Coordinates are image coordinates: y grows downwards.

pub mod session;

pub use session::SharedCounter;

use serde::{Deserialize, Serialize};

use crate::error::{PoseError, PoseResult};
use crate::pose::{BodyPart, Keypoint, Pose};

pub const DEFAULT_THRESHOLD_PX: f32 = 50.0;
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Up,
    Down,
}

/// Counter state for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepState {
    pub count: u32,
    pub is_down: bool,
}

impl RepState {
    pub fn phase(&self) -> Phase {
        if self.is_down {
            Phase::Down
        } else {
            Phase::Up
        }
    }
}

/// Hysteresis half-width.
///
/// `Pixels` is absolute in the working coordinate space, so it depends on
/// camera resolution and subject distance. `FrameFraction` scales with frame
/// height and behaves the same at any resolution, but still assumes the
/// subject fills a similar share of the frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Pixels(f32),
    FrameFraction(f32),
}

impl Threshold {
    pub fn to_pixels(self, frame_height: f32) -> f32 {
        match self {
            Threshold::Pixels(px) => px,
            Threshold::FrameFraction(fraction) => fraction * frame_height,
        }
    }

    fn magnitude(self) -> f32 {
        match self {
            Threshold::Pixels(v) | Threshold::FrameFraction(v) => v,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Pixels(DEFAULT_THRESHOLD_PX)
    }
}

/// How shoulder and hip heights are read from a pose.
///
/// `Averaged` smooths left/right noise when the subject faces the camera and
/// degrades to one side when the other is occluded, but mixes sides with
/// different depths in a profile view. `MostConfident` keeps shoulder and
/// hip from the same side, which suits profile views, at the cost of
/// switching sides when scores flicker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideStrategy {
    #[default]
    Averaged,
    MostConfident,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub threshold: Threshold,
    pub min_confidence: f32,
    pub sides: SideStrategy,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            sides: SideStrategy::default(),
        }
    }
}

impl CounterConfig {
    pub fn validate(&self) -> PoseResult<()> {
        let magnitude = self.threshold.magnitude();
        if !magnitude.is_finite() || magnitude <= 0.0 {
            return Err(PoseError::InvalidConfig(format!(
                "threshold must be a positive number, got {magnitude}"
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PoseError::InvalidConfig(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

/// Phase change produced by one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    None,
    WentDown,
    RepCompleted { count: u32 },
}

/// Outcome of feeding one frame to the counter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tick {
    /// A required keypoint was absent; state untouched.
    Skipped { missing: BodyPart },
    Observed {
        shoulder_y: f32,
        hip_y: f32,
        transition: Transition,
    },
}

#[derive(Clone, Debug, Default)]
pub struct RepCounter {
    config: CounterConfig,
    state: RepState,
}

impl RepCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            state: RepState::default(),
        }
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Back to `Up` with a zero count.
    pub fn reset(&mut self) {
        self.state = RepState::default();
    }

    /// Single transition step on already-resolved heights.
    pub fn observe(&mut self, shoulder_y: f32, hip_y: f32, threshold_px: f32) -> Transition {
        if !self.state.is_down {
            if shoulder_y > hip_y + threshold_px {
                self.state.is_down = true;
                return Transition::WentDown;
            }
        } else if shoulder_y < hip_y - threshold_px {
            self.state.is_down = false;
            self.state.count += 1;
            return Transition::RepCompleted {
                count: self.state.count,
            };
        }
        Transition::None
    }

    /// Feed one pose in frame pixel space.
    pub fn update(&mut self, pose: &Pose, frame_height: f32) -> Tick {
        match resolve_heights(pose, &self.config) {
            Ok((shoulder_y, hip_y)) => {
                let threshold = self.config.threshold.to_pixels(frame_height);
                let transition = self.observe(shoulder_y, hip_y, threshold);
                Tick::Observed {
                    shoulder_y,
                    hip_y,
                    transition,
                }
            }
            Err(missing) => Tick::Skipped { missing },
        }
    }
}

/// Resolve (shoulder_y, hip_y) for `pose` under the configured side strategy.
pub fn torso_heights(pose: &Pose, config: &CounterConfig) -> PoseResult<(f32, f32)> {
    resolve_heights(pose, config).map_err(PoseError::MissingKeypoint)
}

fn resolve_heights(pose: &Pose, config: &CounterConfig) -> Result<(f32, f32), BodyPart> {
    let min = config.min_confidence;
    match config.sides {
        SideStrategy::Averaged => {
            let shoulder =
                mean_visible_y(pose, BodyPart::LeftShoulder, BodyPart::RightShoulder, min)?;
            let hip = mean_visible_y(pose, BodyPart::LeftHip, BodyPart::RightHip, min)?;
            Ok((shoulder, hip))
        }
        SideStrategy::MostConfident => {
            let left = side_pair(pose, BodyPart::LeftShoulder, BodyPart::LeftHip, min);
            let right = side_pair(pose, BodyPart::RightShoulder, BodyPart::RightHip, min);
            match (left, right) {
                (Ok(l), Ok(r)) => Ok(if r.2 > l.2 { (r.0, r.1) } else { (l.0, l.1) }),
                (Ok(l), Err(_)) => Ok((l.0, l.1)),
                (Err(_), Ok(r)) => Ok((r.0, r.1)),
                (Err(part), Err(_)) => Err(part),
            }
        }
    }
}

fn visible(pose: &Pose, part: BodyPart, min: f32) -> Result<&Keypoint, BodyPart> {
    let kp = pose.get(part);
    if kp.is_visible(min) {
        Ok(kp)
    } else {
        Err(part)
    }
}

fn mean_visible_y(pose: &Pose, left: BodyPart, right: BodyPart, min: f32) -> Result<f32, BodyPart> {
    match (visible(pose, left, min), visible(pose, right, min)) {
        (Ok(l), Ok(r)) => Ok((l.y + r.y) / 2.0),
        (Ok(l), Err(_)) => Ok(l.y),
        (Err(_), Ok(r)) => Ok(r.y),
        (Err(part), Err(_)) => Err(part),
    }
}

// (shoulder_y, hip_y, weakest score of the pair)
fn side_pair(
    pose: &Pose,
    shoulder: BodyPart,
    hip: BodyPart,
    min: f32,
) -> Result<(f32, f32, f32), BodyPart> {
    let s = visible(pose, shoulder, min)?;
    let h = visible(pose, hip, min)?;
    Ok((s.y, h.y, s.confidence.min(h.confidence)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::KEYPOINT_COUNT;

    fn pose(shoulders: (f32, f32), hips: (f32, f32), conf: [f32; 4]) -> Pose {
        let mut keypoints = [Keypoint::new(0.0, 0.0, 0.9); KEYPOINT_COUNT];
        keypoints[BodyPart::LeftShoulder.index()] = Keypoint::new(100.0, shoulders.0, conf[0]);
        keypoints[BodyPart::RightShoulder.index()] = Keypoint::new(200.0, shoulders.1, conf[1]);
        keypoints[BodyPart::LeftHip.index()] = Keypoint::new(100.0, hips.0, conf[2]);
        keypoints[BodyPart::RightHip.index()] = Keypoint::new(200.0, hips.1, conf[3]);
        Pose::new(keypoints)
    }

    fn level_pose(shoulder_y: f32, hip_y: f32) -> Pose {
        pose((shoulder_y, shoulder_y), (hip_y, hip_y), [0.9; 4])
    }

    #[test]
    fn starts_up_with_zero_count() {
        let counter = RepCounter::default();
        assert_eq!(counter.state(), RepState { count: 0, is_down: false });
        assert_eq!(counter.state().phase(), Phase::Up);
    }

    #[test]
    fn upright_start_does_not_count() {
        let mut counter = RepCounter::default();
        assert_eq!(counter.observe(10.0, 110.0, 50.0), Transition::None);
        assert_eq!(counter.state().count, 0);
        assert!(!counter.state().is_down);
    }

    #[test]
    fn down_then_up_counts_one() {
        let mut counter = RepCounter::default();
        // shoulder - hip: -100, +60, -60
        assert_eq!(counter.observe(10.0, 110.0, 50.0), Transition::None);
        assert_eq!(counter.observe(110.0, 50.0, 50.0), Transition::WentDown);
        assert_eq!(counter.state().count, 0);
        assert_eq!(
            counter.observe(50.0, 110.0, 50.0),
            Transition::RepCompleted { count: 1 }
        );
        assert_eq!(counter.state(), RepState { count: 1, is_down: false });
    }

    #[test]
    fn band_jitter_never_transitions() {
        let mut counter = RepCounter::default();
        counter.observe(200.0, 100.0, 50.0);
        assert!(counter.state().is_down);

        for delta in [-50.0, -30.0, 0.0, 12.5, 49.9, 50.0, -49.9, 25.0] {
            assert_eq!(counter.observe(100.0 + delta, 100.0, 50.0), Transition::None);
        }
        assert_eq!(counter.state(), RepState { count: 0, is_down: true });
    }

    #[test]
    fn repeated_input_is_idempotent() {
        for (s, h) in [(10.0, 110.0), (200.0, 100.0), (100.0, 100.0), (0.0, 100.0)] {
            let mut counter = RepCounter::default();
            counter.observe(s, h, 50.0);
            let before = counter.state();
            assert_eq!(counter.observe(s, h, 50.0), Transition::None);
            assert_eq!(counter.state(), before);
        }
    }

    #[test]
    fn many_cycles_count_each_once() {
        let mut counter = RepCounter::default();
        for _ in 0..5 {
            counter.observe(200.0, 100.0, 50.0);
            counter.observe(190.0, 100.0, 50.0);
            counter.observe(0.0, 100.0, 50.0);
            counter.observe(10.0, 100.0, 50.0);
        }
        assert_eq!(counter.state().count, 5);
    }

    #[test]
    fn update_skips_when_shoulders_missing() {
        let mut counter = RepCounter::default();
        let p = pose((300.0, 300.0), (100.0, 100.0), [0.1, 0.2, 0.9, 0.9]);
        assert_eq!(
            counter.update(&p, 480.0),
            Tick::Skipped {
                missing: BodyPart::LeftShoulder
            }
        );
        assert_eq!(counter.state(), RepState::default());
    }

    #[test]
    fn averaged_falls_back_to_single_side() {
        let config = CounterConfig::default();
        let both = pose((100.0, 140.0), (200.0, 220.0), [0.9; 4]);
        assert_eq!(torso_heights(&both, &config).unwrap(), (120.0, 210.0));

        let left_only = pose((100.0, 140.0), (200.0, 220.0), [0.9, 0.1, 0.9, 0.1]);
        assert_eq!(torso_heights(&left_only, &config).unwrap(), (100.0, 200.0));
    }

    #[test]
    fn most_confident_keeps_one_side() {
        let config = CounterConfig {
            sides: SideStrategy::MostConfident,
            ..CounterConfig::default()
        };
        let p = pose((100.0, 140.0), (200.0, 220.0), [0.5, 0.8, 0.9, 0.7]);
        // left pair weakest 0.5, right pair weakest 0.7
        assert_eq!(torso_heights(&p, &config).unwrap(), (140.0, 220.0));

        let crossed = pose((100.0, 140.0), (200.0, 220.0), [0.9, 0.1, 0.1, 0.9]);
        assert!(matches!(
            torso_heights(&crossed, &config),
            Err(PoseError::MissingKeypoint(_))
        ));
    }

    #[test]
    fn frame_fraction_scales_with_height() {
        let threshold = Threshold::FrameFraction(0.1);
        assert_eq!(threshold.to_pixels(480.0), 48.0);
        assert_eq!(threshold.to_pixels(1080.0), 108.0);

        let mut counter = RepCounter::new(CounterConfig {
            threshold,
            ..CounterConfig::default()
        });
        // 60 px drop clears 48 px at 480p but not 108 px at 1080p.
        assert!(matches!(
            counter.update(&level_pose(160.0, 100.0), 1080.0),
            Tick::Observed {
                transition: Transition::None,
                ..
            }
        ));
        assert!(matches!(
            counter.update(&level_pose(160.0, 100.0), 480.0),
            Tick::Observed {
                transition: Transition::WentDown,
                ..
            }
        ));
    }

    #[test]
    fn reset_restarts_session() {
        let mut counter = RepCounter::default();
        counter.observe(200.0, 100.0, 50.0);
        counter.observe(0.0, 100.0, 50.0);
        assert_eq!(counter.state().count, 1);
        counter.reset();
        assert_eq!(counter.state(), RepState::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_threshold = CounterConfig {
            threshold: Threshold::Pixels(0.0),
            ..CounterConfig::default()
        };
        assert!(bad_threshold.validate().is_err());

        let bad_conf = CounterConfig {
            min_confidence: 1.5,
            ..CounterConfig::default()
        };
        assert!(bad_conf.validate().is_err());
        assert!(CounterConfig::default().validate().is_ok());
    }
}
