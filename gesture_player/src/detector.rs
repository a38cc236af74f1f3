//! Hand-landmark detection.
//!
//! The model itself runs out of process.  [`MediaPipeDetector`] starts a
//! helper program once and talks to it over its stdin/stdout:
//!
//! ```text
//! spawn:     <interpreter> <script> --min-detection-confidence 0.7
//!                                   --min-tracking-confidence 0.7
//! helper  →  "READY\n"
//! request →  width:u32le  height:u32le  channels:u32le  <width*height*channels RGB bytes>
//! helper  →  {"hands":[{"score":0.93,"landmarks":[{"x":..,"y":..,"z":..}, …21]}],"error":null}\n
//! ```
//!
//! Hands come back in the helper's order; the driver only ever looks at the
//! first.  The helper is killed when the detector is dropped.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use hand_gesture::{Landmark, LandmarkSet};

use crate::error::SourceError;
use crate::source::Frame;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkDetector trait
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkDetector {
    /// Zero or more hands found in `frame`.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, SourceError>;
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorConfig
// ════════════════════════════════════════════════════════════════════════════

/// How to start the landmark helper.  Thresholds are fixed for the run.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub interpreter:              String,
    pub script:                   PathBuf,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence:  f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            interpreter:              "python3".to_string(),
            script:                   PathBuf::from("hand_detect.py"),
            min_detection_confidence: 0.7,
            min_tracking_confidence:  0.7,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire format
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct PointJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default = "full_score")]
    score: f32,
    landmarks: Vec<PointJson>,
}

fn full_score() -> f32 { 1.0 }

#[derive(Deserialize, Debug)]
struct ResponseJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one response line into hands at or above `min_score`.
///
/// Hands without exactly 21 points are dropped with a warning.  A response
/// carrying an `error` field counts as "no hands" for this frame.
pub fn parse_response(line: &str, min_score: f32) -> Result<Vec<LandmarkSet>, SourceError> {
    let response: ResponseJson = serde_json::from_str(line.trim())?;

    if let Some(error) = response.error {
        warn!(%error, "hand detector reported an error");
        return Ok(Vec::new());
    }

    let hands = response
        .hands
        .into_iter()
        .filter(|h| h.score >= min_score)
        .filter_map(|h| {
            let points: Vec<Landmark> = h
                .landmarks
                .iter()
                .map(|p| Landmark { x: p.x, y: p.y, z: p.z })
                .collect();
            let set = LandmarkSet::from_points(&points);
            if set.is_none() {
                warn!(count = points.len(), "dropping hand without 21 landmarks");
            }
            set
        })
        .collect();
    Ok(hands)
}

/// Request header: width, height, channel count, little-endian u32 each.
fn frame_header(frame: &Frame) -> [u8; 12] {
    let mut header = [0u8; 12];
    header[0..4].copy_from_slice(&(frame.width as u32).to_le_bytes());
    header[4..8].copy_from_slice(&(frame.height as u32).to_le_bytes());
    header[8..12].copy_from_slice(&3u32.to_le_bytes());
    header
}

// ════════════════════════════════════════════════════════════════════════════
// MediaPipeDetector
// ════════════════════════════════════════════════════════════════════════════

pub struct MediaPipeDetector {
    child:     Child,
    stdin:     ChildStdin,
    stdout:    BufReader<ChildStdout>,
    min_score: f32,
    line:      String,
}

impl MediaPipeDetector {
    /// Start the helper and wait for its `READY` line.
    pub fn spawn(cfg: &DetectorConfig) -> Result<Self, SourceError> {
        info!(script = %cfg.script.display(), "starting hand detector");

        let mut child = Command::new(&cfg.interpreter)
            .arg(&cfg.script)
            .arg("--min-detection-confidence")
            .arg(cfg.min_detection_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(cfg.min_tracking_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn {
                program: format!("{} {}", cfg.interpreter, cfg.script.display()),
                source,
            })?;

        let stdin  = child.stdin.take().ok_or(SourceError::Closed)?;
        let stdout = child.stdout.take().ok_or(SourceError::Closed)?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        let handshake = match stdout.read_line(&mut ready) {
            Ok(0)                          => Err(SourceError::Closed),
            Ok(_) if ready.trim() == "READY" => Ok(()),
            Ok(_)                          => Err(SourceError::NotReady(ready.trim().to_string())),
            Err(e)                         => Err(SourceError::Io(e)),
        };
        if let Err(e) = handshake {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
        info!("hand detector ready");

        Ok(MediaPipeDetector {
            child,
            stdin,
            stdout,
            min_score: cfg.min_detection_confidence,
            line: String::new(),
        })
    }
}

impl LandmarkDetector for MediaPipeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, SourceError> {
        self.stdin
            .write_all(&frame_header(frame))
            .and_then(|()| self.stdin.write_all(&frame.rgb))
            .and_then(|()| self.stdin.flush())
            .map_err(|e| match e.kind() {
                io::ErrorKind::BrokenPipe => SourceError::Closed,
                _                         => SourceError::Io(e),
            })?;

        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(SourceError::Closed);
        }
        let hands = parse_response(&self.line, self.min_score)?;
        debug!(hands = hands.len(), "detector response");
        Ok(hands)
    }
}

impl Drop for MediaPipeDetector {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(score: f32, points: usize, y: f32) -> String {
        let pts: Vec<String> = (0..points)
            .map(|i| format!(r#"{{"x":{},"y":{},"z":0.0}}"#, i as f32 / 100.0, y))
            .collect();
        format!(r#"{{"score":{},"landmarks":[{}]}}"#, score, pts.join(","))
    }

    #[test]
    fn empty_hands_list() {
        let hands = parse_response(r#"{"hands":[],"error":null}"#, 0.7).unwrap();
        assert!(hands.is_empty());
    }

    #[test]
    fn keeps_order_and_coordinates() {
        let line = format!(
            r#"{{"hands":[{},{}]}}"#,
            hand_json(0.9, 21, 0.25),
            hand_json(0.8, 21, 0.75)
        );
        let hands = parse_response(&line, 0.7).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0][0].y, 0.25);
        assert_eq!(hands[1][0].y, 0.75);
        assert!((hands[0][20].x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn low_score_filtered() {
        let line = format!(r#"{{"hands":[{}]}}"#, hand_json(0.5, 21, 0.5));
        assert!(parse_response(&line, 0.7).unwrap().is_empty());
    }

    #[test]
    fn wrong_landmark_count_dropped() {
        let line = format!(
            r#"{{"hands":[{},{}]}}"#,
            hand_json(0.9, 20, 0.1),
            hand_json(0.9, 21, 0.2)
        );
        let hands = parse_response(&line, 0.7).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0][0].y, 0.2);
    }

    #[test]
    fn error_field_means_no_hands() {
        let line = format!(
            r#"{{"hands":[{}],"error":"model crashed"}}"#,
            hand_json(0.9, 21, 0.5)
        );
        assert!(parse_response(&line, 0.7).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(parse_response("not json", 0.7), Err(SourceError::Json(_))));
    }

    #[test]
    fn header_is_little_endian() {
        let frame = Frame::solid(640, 480, [0, 0, 0]);
        let h = frame_header(&frame);
        assert_eq!(&h[0..4], &640u32.to_le_bytes());
        assert_eq!(&h[4..8], &480u32.to_le_bytes());
        assert_eq!(&h[8..12], &3u32.to_le_bytes());
    }

    /// Scratch directory for one test's helper script.
    #[cfg(unix)]
    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "gesture_player-{}-{}", std::process::id(), name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Config that runs `body` with `sh` in place of the real helper.
    #[cfg(unix)]
    fn fake_helper(dir: &std::path::Path, body: &str) -> DetectorConfig {
        let script = dir.join("helper.sh");
        std::fs::write(&script, body).unwrap();
        DetectorConfig {
            interpreter: "sh".to_string(),
            script,
            ..DetectorConfig::default()
        }
    }

    #[cfg(unix)]
    fn two_by_one() -> Frame {
        Frame { width: 2, height: 1, rgb: vec![1, 2, 3, 4, 5, 6] }
    }

    #[cfg(unix)]
    #[test]
    fn helper_round_trip() {
        let dir = scratch("round-trip");
        let captured = dir.join("request.bin");
        let response = format!(r#"{{"hands":[{}]}}"#, hand_json(0.9, 21, 0.4));
        let cfg = fake_helper(&dir, &format!(
            "echo READY\nhead -c 18 > '{}'\nprintf '%s\\n' '{}'\n",
            captured.display(),
            response
        ));

        let mut det = MediaPipeDetector::spawn(&cfg).unwrap();
        let frame = two_by_one();
        let hands = det.detect(&frame).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0][0].y, 0.4);

        // 12-byte header, then width * height * 3 pixel bytes.
        let sent = std::fs::read(&captured).unwrap();
        assert_eq!(sent.len(), 12 + 6);
        assert_eq!(&sent[..12], &frame_header(&frame));
        assert_eq!(&sent[12..], &frame.rgb[..]);

        drop(det);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn helper_empty_hands() {
        let dir = scratch("empty");
        let cfg = fake_helper(
            &dir,
            "echo READY\nhead -c 18 >/dev/null\necho '{\"hands\":[]}'\n",
        );
        let mut det = MediaPipeDetector::spawn(&cfg).unwrap();
        assert!(det.detect(&two_by_one()).unwrap().is_empty());
        drop(det);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn wrong_greeting_is_not_ready() {
        let dir = scratch("nope");
        let cfg = fake_helper(&dir, "echo NOPE\n");
        match MediaPipeDetector::spawn(&cfg) {
            Err(SourceError::NotReady(got)) => assert_eq!(got, "NOPE"),
            other => panic!("expected NotReady, got {:?}", other.map(|_| ())),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn silent_exit_before_ready_is_closed() {
        let dir = scratch("silent");
        let cfg = fake_helper(&dir, "exit 0\n");
        assert!(matches!(MediaPipeDetector::spawn(&cfg), Err(SourceError::Closed)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn helper_exit_after_ready_is_closed() {
        let dir = scratch("exits");
        let cfg = fake_helper(&dir, "echo READY\n");
        let mut det = MediaPipeDetector::spawn(&cfg).unwrap();
        assert!(matches!(det.detect(&two_by_one()), Err(SourceError::Closed)));
        drop(det);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn spawn_missing_interpreter_fails() {
        let cfg = DetectorConfig {
            interpreter: "definitely-not-a-real-interpreter-4c1e".to_string(),
            ..DetectorConfig::default()
        };
        assert!(matches!(MediaPipeDetector::spawn(&cfg), Err(SourceError::Spawn { .. })));
    }
}
