//! Synthetic upright hands.
//!
//! Produces a plausible right hand, palm toward the camera, whose
//! [`fingers_up`](crate::fingers_up) vector is exactly the one requested.
//! Used by the keyboard simulator and by tests that need real geometry
//! instead of a hand-typed vector.

use crate::classify::FingerVector;
use crate::landmark::{idx, Landmark, LandmarkSet, LANDMARK_COUNT};

const WRIST: Landmark = Landmark::new(0.50, 0.85);

/// Column (x) of index, middle, ring, pinky.
const FINGER_X: [f32; 4] = [0.44, 0.50, 0.56, 0.62];

const MCP_Y: f32 = 0.62;
const PIP_Y: f32 = 0.52;

/// Build a hand whose extension vector equals `fingers`.
pub fn synthesize(fingers: FingerVector) -> LandmarkSet {
    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[idx::WRIST] = WRIST;

    // Thumb: long diagonal when extended, tip tucked against the MCP otherwise.
    pts[idx::THUMB_CMC] = Landmark::new(0.42, 0.78);
    pts[idx::THUMB_MCP] = Landmark::new(0.37, 0.72);
    if fingers.thumb() {
        pts[idx::THUMB_IP]  = Landmark::new(0.32, 0.66);
        pts[idx::THUMB_TIP] = Landmark::new(0.28, 0.60);
    } else {
        pts[idx::THUMB_IP]  = Landmark::new(0.39, 0.70);
        pts[idx::THUMB_TIP] = Landmark::new(0.40, 0.69);
    }

    for (i, &x) in FINGER_X.iter().enumerate() {
        let mcp = idx::INDEX_MCP + i * 4;
        pts[mcp]     = Landmark::new(x, MCP_Y);
        pts[mcp + 1] = Landmark::new(x, PIP_Y);
        if fingers.0[i + 1] {
            pts[mcp + 2] = Landmark::new(x, 0.44);
            pts[mcp + 3] = Landmark::new(x, 0.37);
        } else {
            // Curled: tip folds back below the PIP joint.
            pts[mcp + 2] = Landmark::new(x + 0.01, 0.56);
            pts[mcp + 3] = Landmark::new(x + 0.01, 0.59);
        }
    }

    LandmarkSet::new(pts)
}
