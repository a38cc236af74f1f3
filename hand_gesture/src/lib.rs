//! # hand_gesture
//!
//! Turns one detected hand (21 normalized landmarks, MediaPipe numbering)
//! into a five-finger extension vector and, from that, into one of a small
//! closed set of gesture labels.
//!
//! ```text
//!   LandmarkSet ──fingers_up──▶ FingerVector ──classify──▶ Option<Gesture>
//! ```
//!
//! Everything here is pure: no I/O, no clocks, no memory of earlier frames.
//!
//! ## Extension rules
//!
//! | Finger | Extended when |
//! |---|---|
//! | Thumb | distance(landmark 2, landmark 4) > 0.05 |
//! | Index / Middle / Ring / Pinky | tip.y < pip.y (tip higher on screen) |
//!
//! ## Gesture priority (first match wins)
//!
//! | # | Gesture | Vector `[thumb, index, middle, ring, pinky]` |
//! |---|---|---|
//! | 1 | `thumbs_up` | `[T, F, F, F, F]` |
//! | 2 | `open_palm` | `[T, T, T, T, T]` |
//! | 3 | `index_only` | `[*, T, F, F, F]` |
//! | 4 | `index_middle` | `[*, T, T, F, F]` |
//! | 5 | `index_pinky` | `[*, T, F, F, T]` |
//!
//! Anything else is "no gesture" (`None`).

pub mod landmark;
pub mod classify;
pub mod synth;

pub use landmark::{Landmark, LandmarkSet, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use classify::{
    classify, detect_gesture, fingers_up, label, thumb_extended, FingerVector, Gesture, Rule,
    GESTURE_RULES, THUMB_EXTENSION_THRESHOLD,
};
pub use synth::synthesize;
