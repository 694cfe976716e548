//! Static keypoint connection tables for overlay drawing.

use super::{BodyPart, Keypoint, Pose, KEYPOINT_COUNT};

/// A pair of keypoint indices to connect with a line.
pub type Edge = (usize, usize);

/// Overlay connection table, by output index.
pub const SKELETON_EDGES: [Edge; 15] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (0, 8),
    (8, 9),
    (9, 10),
    (11, 12),
    (12, 13),
    (13, 14),
    (11, 15),
    (15, 16),
];

/// Anatomical limb and torso connections.
pub const LIMB_EDGES: [Edge; 12] = [
    (BodyPart::LeftShoulder as usize, BodyPart::LeftElbow as usize),
    (BodyPart::RightShoulder as usize, BodyPart::RightElbow as usize),
    (BodyPart::LeftElbow as usize, BodyPart::LeftWrist as usize),
    (BodyPart::RightElbow as usize, BodyPart::RightWrist as usize),
    (BodyPart::LeftHip as usize, BodyPart::LeftKnee as usize),
    (BodyPart::RightHip as usize, BodyPart::RightKnee as usize),
    (BodyPart::LeftKnee as usize, BodyPart::LeftAnkle as usize),
    (BodyPart::RightKnee as usize, BodyPart::RightAnkle as usize),
    (BodyPart::LeftHip as usize, BodyPart::RightHip as usize),
    (BodyPart::LeftShoulder as usize, BodyPart::RightShoulder as usize),
    (BodyPart::LeftShoulder as usize, BodyPart::LeftHip as usize),
    (BodyPart::RightShoulder as usize, BodyPart::RightHip as usize),
];

/// Edge table selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSet {
    #[default]
    Skeleton,
    Limbs,
}

impl EdgeSet {
    pub fn edges(self) -> &'static [Edge] {
        match self {
            EdgeSet::Skeleton => &SKELETON_EDGES,
            EdgeSet::Limbs => &LIMB_EDGES,
        }
    }
}

/// Endpoints of one edge in the pose's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub edge: Edge,
    pub from: Keypoint,
    pub to: Keypoint,
}

/// Edges whose `from` endpoint is confident enough to draw.
pub fn visible_segments<'a>(
    pose: &'a Pose,
    edges: &'a [Edge],
    min_confidence: f32,
) -> impl Iterator<Item = Segment> + 'a {
    edges.iter().filter_map(move |&(from, to)| {
        let a = pose.by_index(from)?;
        let b = pose.by_index(to)?;
        (a.confidence > min_confidence).then_some(Segment {
            edge: (from, to),
            from: *a,
            to: *b,
        })
    })
}

/// True when every index in `edges` addresses a keypoint.
pub fn edges_in_range(edges: &[Edge]) -> bool {
    edges
        .iter()
        .all(|&(a, b)| a < KEYPOINT_COUNT && b < KEYPOINT_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_table_has_fifteen_edges_in_range() {
        assert_eq!(SKELETON_EDGES.len(), 15);
        assert!(edges_in_range(&SKELETON_EDGES));
        assert!(edges_in_range(&LIMB_EDGES));
    }

    #[test]
    fn edge_sets_resolve_to_tables() {
        assert_eq!(EdgeSet::Skeleton.edges().len(), 15);
        assert_eq!(EdgeSet::Limbs.edges().len(), 12);
    }

    #[test]
    fn out_of_range_edge_detected() {
        assert!(!edges_in_range(&[(0, 17)]));
    }

    #[test]
    fn segments_gate_on_from_confidence() {
        let mut keypoints = [Keypoint::new(1.0, 1.0, 0.9); KEYPOINT_COUNT];
        keypoints[BodyPart::LeftShoulder.index()].confidence = 0.1;
        let pose = Pose::new(keypoints);

        let segments: Vec<_> = visible_segments(&pose, &LIMB_EDGES, 0.45).collect();
        // Left shoulder starts three limb edges.
        assert_eq!(segments.len(), LIMB_EDGES.len() - 3);
        assert!(segments
            .iter()
            .all(|s| s.edge.0 != BodyPart::LeftShoulder.index()));
    }

    #[test]
    fn segment_threshold_is_strict() {
        let pose = Pose::new([Keypoint::new(0.0, 0.0, 0.45); KEYPOINT_COUNT]);
        assert_eq!(visible_segments(&pose, &SKELETON_EDGES, 0.45).count(), 0);
    }
}
