//! Keyboard simulation: drive the full pipeline without a webcam.
//!
//! The preview window maps number keys to canned hand poses.  A
//! [`SimFrames`] source produces a plain backdrop every tick and a
//! [`SimDetector`] reports a synthetic [`LandmarkSet`] for whichever pose is
//! currently held, so classification, cooldown and dispatch run exactly as
//! they would with a camera.
//!
//! | Key | Pose |
//! |---|---|
//! | `1` | thumbs up |
//! | `2` | open palm |
//! | `3` | index |
//! | `4` | index + middle |
//! | `5` | index + pinky |
//! | `0` | fist (hand visible, no gesture) |
//! | `H` | hand hidden |

use std::cell::Cell;
use std::rc::Rc;

use hand_gesture::{synthesize, FingerVector, LandmarkSet};

use crate::detector::LandmarkDetector;
use crate::error::SourceError;
use crate::source::{Frame, FrameSource};

const BACKDROP: [u8; 3] = [0x1A, 0x1A, 0x2E];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPose {
    Hidden,
    Fist,
    ThumbsUp,
    OpenPalm,
    Index,
    IndexMiddle,
    IndexPinky,
}

impl SimPose {
    /// Extension vector for the pose, `None` when no hand is shown.
    pub fn fingers(self) -> Option<FingerVector> {
        let bits = match self {
            SimPose::Hidden      => return None,
            SimPose::Fist        => [false, false, false, false, false],
            SimPose::ThumbsUp    => [true,  false, false, false, false],
            SimPose::OpenPalm    => [true,  true,  true,  true,  true ],
            SimPose::Index       => [false, true,  false, false, false],
            SimPose::IndexMiddle => [false, true,  true,  false, false],
            SimPose::IndexPinky  => [false, true,  false, false, true ],
        };
        Some(FingerVector(bits))
    }
}

/// Handle the window uses to change the held pose.
#[derive(Clone, Debug)]
pub struct SimControl(Rc<Cell<SimPose>>);

impl SimControl {
    pub fn set(&self, pose: SimPose) { self.0.set(pose); }
    pub fn get(&self) -> SimPose     { self.0.get() }
}

pub struct SimFrames {
    width:  usize,
    height: usize,
}

impl FrameSource for SimFrames {
    fn next_frame(&mut self) -> Option<Frame> {
        Some(Frame::solid(self.width, self.height, BACKDROP))
    }
}

pub struct SimDetector {
    pose: Rc<Cell<SimPose>>,
}

impl LandmarkDetector for SimDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<LandmarkSet>, SourceError> {
        Ok(self.pose.get().fingers().map(synthesize).into_iter().collect())
    }
}

/// Frame source, detector and control sharing one pose cell.  Starts hidden.
pub fn rig(width: usize, height: usize) -> (SimFrames, SimDetector, SimControl) {
    let pose = Rc::new(Cell::new(SimPose::Hidden));
    (
        SimFrames { width, height },
        SimDetector { pose: pose.clone() },
        SimControl(pose),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{detect_gesture, Gesture};

    #[test]
    fn hidden_reports_no_hands() {
        let (mut frames, mut det, _ctl) = rig(32, 24);
        let frame = frames.next_frame().unwrap();
        assert!(det.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn control_changes_detected_pose() {
        let (mut frames, mut det, ctl) = rig(32, 24);
        let frame = frames.next_frame().unwrap();

        ctl.set(SimPose::IndexPinky);
        let hands = det.detect(&frame).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(detect_gesture(&hands[0]).0, Some(Gesture::IndexPinky));

        ctl.set(SimPose::Fist);
        let hands = det.detect(&frame).unwrap();
        assert_eq!(detect_gesture(&hands[0]).0, None);
    }

    #[test]
    fn frames_have_requested_size() {
        let (mut frames, _, _) = rig(64, 48);
        let f = frames.next_frame().unwrap();
        assert_eq!((f.width, f.height, f.rgb.len()), (64, 48, 64 * 48 * 3));
    }
}
