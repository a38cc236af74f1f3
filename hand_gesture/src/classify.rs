//! Finger-extension vector and gesture classification.

use std::fmt;

use crate::landmark::{idx, LandmarkSet};

/// Thumb counts as extended when its MCP→tip distance is strictly greater.
///
/// Tuned by hand in normalized image units.  It is orientation-sensitive
/// (a thumb pointing at the camera reads short); the value and the rule
/// order below are kept as-is for compatibility.
pub const THUMB_EXTENSION_THRESHOLD: f64 = 0.05;

/// Tip landmark for thumb, index, middle, ring, pinky.
pub const FINGERTIPS: [usize; 5] = [
    idx::THUMB_TIP,
    idx::INDEX_TIP,
    idx::MIDDLE_TIP,
    idx::RING_TIP,
    idx::PINKY_TIP,
];

// ════════════════════════════════════════════════════════════════════════════
// FingerVector
// ════════════════════════════════════════════════════════════════════════════

/// Extension state per finger, ordered `[thumb, index, middle, ring, pinky]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    pub fn thumb(&self)  -> bool { self.0[0] }
    pub fn index(&self)  -> bool { self.0[1] }
    pub fn middle(&self) -> bool { self.0[2] }
    pub fn ring(&self)   -> bool { self.0[3] }
    pub fn pinky(&self)  -> bool { self.0[4] }

    /// True when every non-thumb finger is folded.
    pub fn fist_except_thumb(&self) -> bool {
        !self.0[1..].iter().any(|&up| up)
    }
}

impl fmt::Display for FingerVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Thumb rule on an MCP→tip length already widened to `f64`.
pub fn thumb_extended(len: f64) -> bool {
    len > THUMB_EXTENSION_THRESHOLD
}

/// Compute the extension vector for one hand.
///
/// Non-thumb fingers are "up" when the tip sits above (smaller `y` than)
/// its PIP joint, which is always `tip - 2` in this numbering.
pub fn fingers_up(hand: &LandmarkSet) -> FingerVector {
    let thumb_len = hand[idx::THUMB_MCP].distance_2d(&hand[idx::THUMB_TIP]);

    let mut up = [false; 5];
    up[0] = thumb_extended(thumb_len);
    for (finger, &tip) in FINGERTIPS.iter().enumerate().skip(1) {
        up[finger] = hand[tip].y < hand[tip - 2].y;
    }
    FingerVector(up)
}

// ════════════════════════════════════════════════════════════════════════════
// Gesture
// ════════════════════════════════════════════════════════════════════════════

/// A recognised hand shape.  "No gesture" is `Option::<Gesture>::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    ThumbsUp,
    OpenPalm,
    IndexOnly,
    IndexMiddle,
    IndexPinky,
}

impl Gesture {
    pub const ALL: [Gesture; 5] = [
        Gesture::ThumbsUp,
        Gesture::OpenPalm,
        Gesture::IndexOnly,
        Gesture::IndexMiddle,
        Gesture::IndexPinky,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Gesture::ThumbsUp    => "thumbs_up",
            Gesture::OpenPalm    => "open_palm",
            Gesture::IndexOnly   => "index_only",
            Gesture::IndexMiddle => "index_middle",
            Gesture::IndexPinky  => "index_pinky",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Label for an optional gesture, `"none"` when nothing matched.
pub fn label(gesture: Option<Gesture>) -> &'static str {
    gesture.map_or("none", |g| g.name())
}

// ════════════════════════════════════════════════════════════════════════════
// Rule table
// ════════════════════════════════════════════════════════════════════════════

/// One entry of the priority table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub gesture: Gesture,
    pub matches: fn(&FingerVector) -> bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("gesture", &self.gesture).finish()
    }
}

/// Disambiguation policy.  Evaluated top to bottom; the first rule whose
/// predicate holds decides the label.  Order is part of the contract.
pub const GESTURE_RULES: [Rule; 5] = [
    Rule { gesture: Gesture::ThumbsUp,    matches: thumbs_up },
    Rule { gesture: Gesture::OpenPalm,    matches: open_palm },
    Rule { gesture: Gesture::IndexOnly,   matches: index_only },
    Rule { gesture: Gesture::IndexMiddle, matches: index_middle },
    Rule { gesture: Gesture::IndexPinky,  matches: index_pinky },
];

fn thumbs_up(f: &FingerVector) -> bool {
    f.thumb() && f.fist_except_thumb()
}

fn open_palm(f: &FingerVector) -> bool {
    f.0.iter().all(|&up| up)
}

// The three index rules ignore the thumb.

fn index_only(f: &FingerVector) -> bool {
    f.index() && !f.middle() && !f.ring() && !f.pinky()
}

fn index_middle(f: &FingerVector) -> bool {
    f.index() && f.middle() && !f.ring() && !f.pinky()
}

fn index_pinky(f: &FingerVector) -> bool {
    f.index() && !f.middle() && !f.ring() && f.pinky()
}

/// Map a finger vector to a gesture through [`GESTURE_RULES`].
pub fn classify(fingers: &FingerVector) -> Option<Gesture> {
    GESTURE_RULES
        .iter()
        .find(|rule| (rule.matches)(fingers))
        .map(|rule| rule.gesture)
}

/// Classify a hand, returning the label together with the vector it came from.
pub fn detect_gesture(hand: &LandmarkSet) -> (Option<Gesture>, FingerVector) {
    let fingers = fingers_up(hand);
    (classify(&fingers), fingers)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
