//! Hand landmarks as reported by the detector.
//!
//! Coordinates are normalized to the frame: `x` runs 0.0 (left) → 1.0
//! (right), `y` runs 0.0 (top) → 1.0 (bottom).  `z` is carried through but
//! never read by the classifier.

use std::ops::Index;

/// Number of points in one detected hand.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model numbering)
// ════════════════════════════════════════════════════════════════════════════

pub mod idx {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;
}

/// Skeleton edges between landmarks, for drawing the hand overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One keypoint on the hand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    /// Euclidean distance in the image plane; `z` is ignored.
    ///
    /// Coordinates are widened to `f64` before subtracting, so thresholds
    /// compare against the exact `f64` constant.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// Exactly 21 landmarks for a single hand.
///
/// The fixed-size array is the whole invariant: a set with the wrong number
/// of points cannot be built, so the classifier never has to check.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        LandmarkSet { points }
    }

    /// Build from a slice, or `None` if it does not hold exactly 21 points.
    pub fn from_points(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(LandmarkSet { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Copy with every `x` reflected about the vertical centre line.
    pub fn mirrored(&self) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x = 1.0 - p.x;
        }
        LandmarkSet { points }
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, i: usize) -> &Landmark {
        &self.points[i]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_ignores_depth() {
        let a = Landmark { x: 0.0, y: 0.0, z: 5.0 };
        let b = Landmark { x: 0.3, y: 0.4, z: -2.0 };
        assert!((a.distance_2d(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn from_points_requires_exactly_21() {
        let pts = vec![Landmark::default(); 21];
        assert!(LandmarkSet::from_points(&pts).is_some());
        assert!(LandmarkSet::from_points(&pts[..20]).is_none());
        let too_many = vec![Landmark::default(); 22];
        assert!(LandmarkSet::from_points(&too_many).is_none());
    }

    #[test]
    fn mirrored_reflects_x_only() {
        let mut pts = [Landmark::default(); LANDMARK_COUNT];
        pts[idx::INDEX_TIP] = Landmark { x: 0.2, y: 0.3, z: 0.1 };
        let set = LandmarkSet::new(pts).mirrored();
        let tip = set[idx::INDEX_TIP];
        assert!((tip.x - 0.8).abs() < 1e-6);
        assert_eq!(tip.y, 0.3);
        assert_eq!(tip.z, 0.1);
    }

    #[test]
    fn connections_stay_in_range() {
        for &(a, b) in HAND_CONNECTIONS.iter() {
            assert!(a < LANDMARK_COUNT && b < LANDMARK_COUNT, "edge ({}, {})", a, b);
        }
    }
}
