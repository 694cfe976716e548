//! Renderer-facing overlay data.
//!
//! The renderer only draws. Everything it needs per frame (keypoints and
//! skeleton segments already in display coordinates) is built here.

use serde::{Deserialize, Serialize};

use crate::pose::skeleton::{visible_segments, Edge, EdgeSet};
use crate::pose::{BodyPart, Pose};

pub const DEFAULT_MIN_KEYPOINT_SCORE: f32 = 0.3;
pub const DEFAULT_MIN_SEGMENT_CONFIDENCE: f32 = 0.45;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    pub display_width: u32,
    pub display_height: u32,
    /// Flip horizontally, for front-facing cameras.
    pub mirror_x: bool,
    /// Keypoints at or below this score are not drawn.
    pub min_keypoint_score: f32,
    /// Segments whose first endpoint is at or below this score are not drawn.
    pub min_segment_confidence: f32,
    pub edges: EdgeSet,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            display_width: 640,
            display_height: 480,
            mirror_x: false,
            min_keypoint_score: DEFAULT_MIN_KEYPOINT_SCORE,
            min_segment_confidence: DEFAULT_MIN_SEGMENT_CONFIDENCE,
            edges: EdgeSet::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub part: BodyPart,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlaySegment {
    pub edge: Edge,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Everything to draw for one frame, in display coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub width: u32,
    pub height: u32,
    pub points: Vec<OverlayPoint>,
    pub segments: Vec<OverlaySegment>,
}

/// Per-axis `display / source` ratio.
pub fn scale_ratio(display: (u32, u32), source: (u32, u32)) -> (f32, f32) {
    let ratio = |d: u32, s: u32| if s == 0 { 0.0 } else { d as f32 / s as f32 };
    (ratio(display.0, source.0), ratio(display.1, source.1))
}

impl OverlayFrame {
    /// Scale `pose`, whose coordinates span `source` (width, height), into
    /// display space.
    pub fn build(pose: &Pose, source: (u32, u32), settings: &OverlaySettings) -> Self {
        let display = (settings.display_width, settings.display_height);
        let (sx, sy) = scale_ratio(display, source);
        let mut scaled = pose.scaled(sx, sy);
        if settings.mirror_x {
            scaled = mirror(&scaled, settings.display_width as f32);
        }

        let points = scaled
            .labelled()
            .filter(|(_, kp)| kp.confidence > settings.min_keypoint_score)
            .map(|(part, kp)| OverlayPoint {
                part,
                x: kp.x,
                y: kp.y,
                confidence: kp.confidence,
            })
            .collect();

        let segments = visible_segments(
            &scaled,
            settings.edges.edges(),
            settings.min_segment_confidence,
        )
        .map(|s| OverlaySegment {
            edge: s.edge,
            x1: s.from.x,
            y1: s.from.y,
            x2: s.to.x,
            y2: s.to.y,
        })
        .collect();

        Self {
            width: settings.display_width,
            height: settings.display_height,
            points,
            segments,
        }
    }
}

fn mirror(pose: &Pose, width: f32) -> Pose {
    let mut keypoints = *pose.keypoints();
    for kp in keypoints.iter_mut() {
        kp.x = width - kp.x;
    }
    Pose::new(keypoints)
}
