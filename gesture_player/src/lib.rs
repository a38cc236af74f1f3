//! # gesture_player
//!
//! Webcam hand-gesture controller for media playback.  Each tick pulls a
//! frame, asks the landmark detector for hands, classifies the first one
//! with [`hand_gesture`], and, if a gesture is recognised and the cooldown
//! has run out, fires the matching OS action.
//!
//! ```text
//!   FrameSource ─▶ LandmarkDetector ─▶ classify ─▶ cooldown ─▶ Dispatcher
//!        └───────────────────────▶ Visualizer (frame + overlay)
//! ```
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Action |
//! |---|---|
//! | Thumbs up | Alt+Shift+B |
//! | Open palm | Space (play/pause) |
//! | Index only | Ctrl+Left (previous track) |
//! | Index + middle | Ctrl+Right (next track) |
//! | Index + pinky | Close the music app if running, otherwise open it |
//!
//! At most one action fires per 2 s cooldown window.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: number keys in the preview window pick
//!   a hand pose; key presses are logged instead of injected.
//! * `camera`: webcam capture via `nokhwa` plus the landmark helper process.
//! * `input`: real key injection via `enigo`.
//! * `full`: both.

pub mod error;
pub mod source;
pub mod detector;
pub mod dispatch;
pub mod platform;
pub mod sim;
pub mod visualizer;
pub mod app;
