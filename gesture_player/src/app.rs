//! Top-level tick loop.
//!
//! `AppState` owns the frame source, the landmark detector and the
//! dispatcher.  Each call to [`AppState::tick`] runs one complete
//! capture → detect → classify → maybe-dispatch step; [`run`] calls it on a
//! fixed interval and renders the result.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use hand_gesture::{detect_gesture, label, FingerVector, Gesture, LandmarkSet};

use crate::detector::{DetectorConfig, LandmarkDetector};
use crate::dispatch::{Dispatched, Dispatcher, MusicApp};
use crate::error::AppError;
use crate::platform::{self, SystemProcesses};
use crate::sim::{self, SimControl};
use crate::source::{Frame, FrameSource};
use crate::visualizer::{Visualizer, WIN_H, WIN_W};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub camera_index:  u32,
    /// Delay between the starts of consecutive ticks.
    pub tick_interval: Duration,
    pub cooldown:      Duration,
    pub detector:      DetectorConfig,
    pub music_app:     MusicApp,
    /// Flip frames horizontally before detection and display.
    pub mirror:        bool,
    /// Use keyboard poses instead of the webcam.
    pub simulate:      bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            camera_index:  0,
            tick_interval: Duration::from_millis(10),
            cooldown:      Duration::from_secs_f32(2.0),
            detector:      DetectorConfig::default(),
            music_app:     MusicApp::default(),
            mirror:        true,
            simulate:      !cfg!(feature = "camera"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TickOutcome
// ════════════════════════════════════════════════════════════════════════════

/// Result of one tick, handed to the renderer.
#[derive(Debug)]
pub enum TickOutcome {
    /// No frame was available; try again next tick.
    Skipped,
    /// A frame, but no hand in it.
    NoHand { frame: Frame },
    /// The first detected hand and what was made of it.
    Hand {
        frame:      Frame,
        hand:       LandmarkSet,
        gesture:    Option<Gesture>,
        fingers:    FingerVector,
        dispatched: Option<Dispatched>,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    frames:     Box<dyn FrameSource>,
    detector:   Box<dyn LandmarkDetector>,
    dispatcher: Dispatcher,
    mirror:     bool,

    /// Last dispatched action, for the status bar.
    pub status: String,
}

impl AppState {
    pub fn new(
        frames:     Box<dyn FrameSource>,
        detector:   Box<dyn LandmarkDetector>,
        dispatcher: Dispatcher,
        mirror:     bool,
    ) -> Self {
        AppState {
            frames,
            detector,
            dispatcher,
            mirror,
            status: "Ready - show a gesture".to_string(),
        }
    }

    /// Run one tick at time `now`.
    ///
    /// Only the first detected hand is considered.  Detector errors are
    /// returned to the caller; a missing frame is not an error.
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, AppError> {
        let Some(mut frame) = self.frames.next_frame() else {
            debug!("no frame this tick");
            return Ok(TickOutcome::Skipped);
        };
        if self.mirror {
            frame.mirror();
        }

        let hand = match self.detector.detect(&frame)?.into_iter().next() {
            Some(h) => h,
            None    => return Ok(TickOutcome::NoHand { frame }),
        };

        let (gesture, fingers) = detect_gesture(&hand);
        debug!(gesture = label(gesture), %fingers, "classified");

        let dispatched = self.dispatcher.handle(gesture, now);
        if let Some(d) = &dispatched {
            self.status = format!("{} -> {}", label(gesture), describe(d));
        }

        Ok(TickOutcome::Hand { frame, hand, gesture, fingers, dispatched })
    }
}

fn describe(d: &Dispatched) -> String {
    use crate::dispatch::{Action, Key};
    match d {
        Dispatched::Keys(Action::Press(k))   => k.to_string(),
        Dispatched::Keys(Action::Hotkey(ks)) => {
            ks.iter().map(Key::to_string).collect::<Vec<_>>().join("+")
        }
        Dispatched::Keys(Action::ToggleApp)  => "toggle".to_string(),
        Dispatched::Launched                 => "music app launched".to_string(),
        Dispatched::Terminated               => "music app closed".to_string(),
        Dispatched::LaunchFailed             => "music app failed to open".to_string(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Source selection
// ════════════════════════════════════════════════════════════════════════════

type Sources = (Box<dyn FrameSource>, Box<dyn LandmarkDetector>, Option<SimControl>);

#[cfg(feature = "camera")]
fn open_camera(cfg: &AppConfig) -> Result<Option<Sources>, AppError> {
    use crate::detector::MediaPipeDetector;
    use crate::source::CameraSource;

    if cfg.simulate {
        return Ok(None);
    }
    let camera   = CameraSource::open(cfg.camera_index)?;
    let detector = MediaPipeDetector::spawn(&cfg.detector)?;
    Ok(Some((Box::new(camera), Box::new(detector), None)))
}

#[cfg(not(feature = "camera"))]
fn open_camera(cfg: &AppConfig) -> Result<Option<Sources>, AppError> {
    if !cfg.simulate {
        info!("built without `camera`: falling back to keyboard simulation");
    }
    Ok(None)
}

fn open_sources(cfg: &AppConfig) -> Result<Sources, AppError> {
    if let Some(sources) = open_camera(cfg)? {
        return Ok(sources);
    }
    info!("simulation mode: number keys choose a hand pose");
    let (frames, detector, control) = sim::rig(WIN_W, WIN_H);
    Ok((Box::new(frames), Box::new(detector), Some(control)))
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run until the preview window is closed.
///
/// Ticks never overlap: each one completes (including rendering) before the
/// driver sleeps out the rest of `tick_interval`.  Dropping `AppState` on
/// the way out releases the camera and stops the detector helper.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let (frames, detector, sim) = open_sources(&cfg)?;
    let mut vis = Visualizer::new(sim)?;

    let dispatcher = Dispatcher::new(
        platform::key_injector(),
        Box::new(SystemProcesses::new()),
        cfg.music_app.clone(),
        cfg.cooldown,
    );
    let mut app = AppState::new(frames, detector, dispatcher, cfg.mirror);

    info!(cooldown = ?cfg.cooldown, interval = ?cfg.tick_interval, "gesture loop started");

    while vis.is_open() {
        let started = Instant::now();
        if !vis.poll_input() { break; }

        let outcome = app.tick(started)?;
        vis.render(&outcome, &app.status);

        if let Some(rest) = cfg.tick_interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    info!("preview closed, shutting down");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use hand_gesture::synthesize;

    use crate::dispatch::tests::{fake_dispatcher, Event, Log};
    use crate::dispatch::Key;
    use crate::error::SourceError;

    /// Plays back a fixed script of frames; `None` entries are capture failures.
    struct ScriptedFrames(VecDeque<Option<Frame>>);

    impl FrameSource for ScriptedFrames {
        fn next_frame(&mut self) -> Option<Frame> {
            self.0.pop_front().flatten()
        }
    }

    /// Returns the same hands for every frame.
    struct FixedHands(Vec<LandmarkSet>);

    impl LandmarkDetector for FixedHands {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<LandmarkSet>, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn frames(script: Vec<Option<Frame>>) -> Box<ScriptedFrames> {
        Box::new(ScriptedFrames(script.into()))
    }

    fn some_frames(n: usize) -> Box<ScriptedFrames> {
        frames((0..n).map(|_| Some(Frame::solid(4, 4, [0, 0, 0]))).collect())
    }

    fn hand(bits: [bool; 5]) -> LandmarkSet {
        synthesize(FingerVector(bits))
    }

    fn make_app(
        frames: Box<ScriptedFrames>,
        hands: Vec<LandmarkSet>,
    ) -> (AppState, Log) {
        let (dispatcher, log) = fake_dispatcher(false, false);
        (AppState::new(frames, Box::new(FixedHands(hands)), dispatcher, true), log)
    }

    #[test]
    fn missing_frame_skips_tick() {
        let (mut app, log) = make_app(frames(vec![None]), vec![hand([true; 5])]);
        assert!(matches!(app.tick(Instant::now()).unwrap(), TickOutcome::Skipped));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn loop_survives_bad_frames() {
        let script = vec![None, None, Some(Frame::solid(2, 2, [9, 9, 9]))];
        let (mut app, log) = make_app(frames(script), vec![hand([true; 5])]);
        let t = Instant::now();
        assert!(matches!(app.tick(t).unwrap(), TickOutcome::Skipped));
        assert!(matches!(app.tick(t).unwrap(), TickOutcome::Skipped));
        assert!(matches!(app.tick(t).unwrap(), TickOutcome::Hand { .. }));
        assert_eq!(*log.borrow(), vec![Event::Press(Key::Space)]);
    }

    #[test]
    fn no_hand_takes_no_action() {
        let (mut app, log) = make_app(some_frames(1), vec![]);
        assert!(matches!(app.tick(Instant::now()).unwrap(), TickOutcome::NoHand { .. }));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn only_first_hand_is_used() {
        let hands = vec![hand([false, true, true, false, false]), hand([true; 5])];
        let (mut app, log) = make_app(some_frames(1), hands);
        match app.tick(Instant::now()).unwrap() {
            TickOutcome::Hand { gesture, dispatched, .. } => {
                assert_eq!(gesture, Some(Gesture::IndexMiddle));
                assert!(dispatched.is_some());
            }
            other => panic!("expected a hand, got {:?}", other),
        }
        assert_eq!(*log.borrow(), vec![Event::Hotkey(vec![Key::Control, Key::RightArrow])]);
    }

    #[test]
    fn unrecognised_hand_reports_vector_but_does_not_dispatch() {
        let (mut app, log) = make_app(some_frames(1), vec![hand([false; 5])]);
        match app.tick(Instant::now()).unwrap() {
            TickOutcome::Hand { gesture, fingers, dispatched, .. } => {
                assert_eq!(gesture, None);
                assert_eq!(fingers, FingerVector([false; 5]));
                assert_eq!(dispatched, None);
            }
            other => panic!("expected a hand, got {:?}", other),
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn held_gesture_dispatches_once_per_cooldown() {
        let (mut app, log) = make_app(some_frames(4), vec![hand([true, false, false, false, false])]);
        let t = Instant::now();
        app.tick(t).unwrap();
        app.tick(t + Duration::from_millis(500)).unwrap();
        app.tick(t + Duration::from_millis(1900)).unwrap();
        app.tick(t + Duration::from_millis(2100)).unwrap();
        let combo = Event::Hotkey(vec![Key::Alt, Key::Shift, Key::Char('b')]);
        assert_eq!(*log.borrow(), vec![combo.clone(), combo]);
    }

    #[test]
    fn status_tracks_last_dispatch() {
        let (mut app, _log) = make_app(some_frames(1), vec![hand([false, true, false, false, true])]);
        app.tick(Instant::now()).unwrap();
        assert_eq!(app.status, "index_pinky -> music app launched");
    }

    #[test]
    fn status_names_keys_plainly() {
        let t = Instant::now();
        let (mut app, _log) = make_app(some_frames(1), vec![hand([true, false, false, false, false])]);
        app.tick(t).unwrap();
        assert_eq!(app.status, "thumbs_up -> Alt+Shift+B");

        let (mut app, _log) = make_app(some_frames(1), vec![hand([false, true, false, false, false])]);
        app.tick(t).unwrap();
        assert_eq!(app.status, "index_only -> Ctrl+Left");

        let (mut app, _log) = make_app(some_frames(1), vec![hand([true; 5])]);
        app.tick(t).unwrap();
        assert_eq!(app.status, "open_palm -> Space");
    }

    #[test]
    fn frame_is_mirrored_before_detection() {
        let mut f = Frame::solid(2, 1, [0, 0, 0]);
        f.rgb[0] = 255;
        let (mut app, _log) = make_app(frames(vec![Some(f)]), vec![]);
        match app.tick(Instant::now()).unwrap() {
            TickOutcome::NoHand { frame } => assert_eq!(frame.pixel(1, 0), [255, 0, 0]),
            other => panic!("expected no hand, got {:?}", other),
        }
    }

    #[test]
    fn default_config_matches_fixed_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.camera_index, 0);
        assert_eq!(cfg.cooldown, Duration::from_secs(2));
        assert_eq!(cfg.detector.min_detection_confidence, 0.7);
        assert_eq!(cfg.detector.min_tracking_confidence, 0.7);
    }
}
