//! Gesture → OS action, gated by a cooldown.
//!
//! | Gesture | Action |
//! |---|---|
//! | `thumbs_up`    | Alt+Shift+B |
//! | `open_palm`    | Space (play/pause) |
//! | `index_only`   | Ctrl+Left (previous track) |
//! | `index_middle` | Ctrl+Right (next track) |
//! | `index_pinky`  | Toggle the music application |
//!
//! The table is fixed.  Key presses go through a [`KeyInjector`] and the
//! application toggle through a [`ProcessControl`], so both can be swapped
//! for recording fakes in tests.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use hand_gesture::Gesture;

use crate::error::DispatchError;

// ════════════════════════════════════════════════════════════════════════════
// Keys and actions
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Alt,
    Shift,
    Control,
    LeftArrow,
    RightArrow,
    Space,
    Char(char),
}

/// Short names for the status bar, e.g. `Ctrl`, `Left`, `B`.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Alt        => f.write_str("Alt"),
            Key::Shift      => f.write_str("Shift"),
            Key::Control    => f.write_str("Ctrl"),
            Key::LeftArrow  => f.write_str("Left"),
            Key::RightArrow => f.write_str("Right"),
            Key::Space      => f.write_str("Space"),
            Key::Char(c)    => write!(f, "{}", c.to_ascii_uppercase()),
        }
    }
}

const BOOKMARK_COMBO: &[Key]   = &[Key::Alt, Key::Shift, Key::Char('b')];
const PREV_TRACK_COMBO: &[Key] = &[Key::Control, Key::LeftArrow];
const NEXT_TRACK_COMBO: &[Key] = &[Key::Control, Key::RightArrow];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Press all keys in order, release in reverse.
    Hotkey(&'static [Key]),
    /// Single key click.
    Press(Key),
    /// Kill the music app if running, otherwise launch it.
    ToggleApp,
}

pub fn action_for(gesture: Gesture) -> Action {
    match gesture {
        Gesture::ThumbsUp    => Action::Hotkey(BOOKMARK_COMBO),
        Gesture::OpenPalm    => Action::Press(Key::Space),
        Gesture::IndexOnly   => Action::Hotkey(PREV_TRACK_COMBO),
        Gesture::IndexMiddle => Action::Hotkey(NEXT_TRACK_COMBO),
        Gesture::IndexPinky  => Action::ToggleApp,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Backends
// ════════════════════════════════════════════════════════════════════════════

/// Synthetic keyboard input.  Fire-and-forget.
pub trait KeyInjector {
    fn press(&mut self, key: Key);
    fn hotkey(&mut self, keys: &[Key]);
}

/// Process-table access for the music application toggle.
pub trait ProcessControl {
    /// Is a process with exactly this name (ignoring case) running?
    fn is_running(&mut self, name: &str) -> bool;
    /// Start the application through the platform URI handler.
    fn launch(&mut self, uri: &str) -> Result<(), DispatchError>;
    /// Forcefully kill every process with this name.  Returns how many.
    fn terminate(&mut self, name: &str) -> usize;
}

/// Key injector that only logs; used when built without `input`.
#[derive(Debug, Default)]
pub struct LogInjector;

impl KeyInjector for LogInjector {
    fn press(&mut self, key: Key) {
        info!(?key, "key press (not injected)");
    }
    fn hotkey(&mut self, keys: &[Key]) {
        info!(?keys, "hotkey (not injected)");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MusicApp
// ════════════════════════════════════════════════════════════════════════════

/// The application toggled by `index_pinky`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicApp {
    /// Executable name as it appears in the process table.
    pub process_name: String,
    /// URI handed to the platform launcher.
    pub launch_uri: String,
}

impl Default for MusicApp {
    fn default() -> Self {
        let process_name = if cfg!(target_os = "windows") { "Spotify.exe" } else { "spotify" };
        MusicApp {
            process_name: process_name.to_string(),
            launch_uri: "spotify:".to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Cooldown
// ════════════════════════════════════════════════════════════════════════════

/// Minimum spacing between dispatched actions, measured from dispatch start.
#[derive(Clone, Copy, Debug)]
pub struct Cooldown {
    interval: Duration,
    last:     Option<Instant>,
}

impl Cooldown {
    pub fn new(interval: Duration) -> Self {
        Cooldown { interval, last: None }
    }

    pub fn interval(&self) -> Duration { self.interval }

    /// Strictly more than `interval` since the last dispatch (or none yet).
    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            None       => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ════════════════════════════════════════════════════════════════════════════

/// What a dispatch actually did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatched {
    Keys(Action),
    Launched,
    Terminated,
    LaunchFailed,
}

pub struct Dispatcher {
    keys:      Box<dyn KeyInjector>,
    processes: Box<dyn ProcessControl>,
    music:     MusicApp,
    cooldown:  Cooldown,
}

impl Dispatcher {
    pub fn new(
        keys:      Box<dyn KeyInjector>,
        processes: Box<dyn ProcessControl>,
        music:     MusicApp,
        cooldown:  Duration,
    ) -> Self {
        Dispatcher { keys, processes, music, cooldown: Cooldown::new(cooldown) }
    }

    pub fn cooldown(&self) -> &Cooldown { &self.cooldown }

    /// Dispatch `gesture` if there is one and the cooldown has elapsed.
    ///
    /// The cooldown is consumed before the action runs, so a failed launch
    /// still counts as a dispatch.
    pub fn handle(&mut self, gesture: Option<Gesture>, now: Instant) -> Option<Dispatched> {
        let gesture = gesture?;
        if !self.cooldown.ready(now) {
            return None;
        }
        self.cooldown.mark(now);

        let action = action_for(gesture);
        info!(%gesture, ?action, "dispatching");
        Some(self.perform(action))
    }

    fn perform(&mut self, action: Action) -> Dispatched {
        match action {
            Action::Hotkey(keys) => self.keys.hotkey(keys),
            Action::Press(key)   => self.keys.press(key),
            Action::ToggleApp    => return self.toggle_music_app(),
        }
        Dispatched::Keys(action)
    }

    fn toggle_music_app(&mut self) -> Dispatched {
        let name = &self.music.process_name;
        if self.processes.is_running(name) {
            let killed = self.processes.terminate(name);
            info!(process = %name, killed, "music app closed");
            return Dispatched::Terminated;
        }
        match self.processes.launch(&self.music.launch_uri) {
            Ok(()) => {
                info!(uri = %self.music.launch_uri, "music app launched");
                Dispatched::Launched
            }
            Err(e) => {
                warn!(error = %e, "failed to open music app");
                Dispatched::LaunchFailed
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
