/// Number of body landmarks emitted by the default estimator.
pub const LANDMARK_COUNT: usize = 33;

/// Ordered set of normalized 3-D body landmarks.
///
/// Point `i` always denotes the same anatomical landmark across sets; x and y
/// are image-relative in roughly `[0, 1]`, z is depth-relative and unscaled.
/// Absence of a body is expressed as `Option<LandmarkSet>` by callers, never
/// as an empty set.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<[f32; 3]>,
}

impl LandmarkSet {
    pub fn from_points(points: Vec<[f32; 3]>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<[f32; 3]> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }
}

/// Skeleton edges between landmark indices, used for drawing the overlay.
/// Matches the 33-point body topology of the default estimator.
pub const POSE_CONNECTIONS: &[(usize, usize)] = &[
    // face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // torso
    (11, 12),
    (11, 23),
    (12, 24),
    (23, 24),
    // left arm
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    // right arm
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    // left leg
    (23, 25),
    (25, 27),
    (27, 29),
    (27, 31),
    (29, 31),
    // right leg
    (24, 26),
    (26, 28),
    (28, 30),
    (28, 32),
    (30, 32),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_access_in_and_out_of_range() {
        let set = LandmarkSet::from_points(vec![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.point(1), Some([0.4, 0.5, 0.6]));
        assert_eq!(set.point(2), None);
    }

    #[test]
    fn connections_stay_within_landmark_range() {
        for &(a, b) in POSE_CONNECTIONS {
            assert!(a < LANDMARK_COUNT);
            assert!(b < LANDMARK_COUNT);
        }
    }
}
