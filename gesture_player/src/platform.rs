//! Real OS backends for [`KeyInjector`] and [`ProcessControl`].

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use sysinfo::System;
use tracing::debug;

use crate::dispatch::{KeyInjector, ProcessControl};
#[cfg(feature = "input")]
use crate::dispatch::Key;
use crate::error::DispatchError;

// ════════════════════════════════════════════════════════════════════════════
// SystemProcesses: sysinfo + platform launcher
// ════════════════════════════════════════════════════════════════════════════

pub struct SystemProcesses {
    system: System,
}

impl SystemProcesses {
    pub fn new() -> Self {
        SystemProcesses { system: System::new() }
    }
}

impl Default for SystemProcesses {
    fn default() -> Self { Self::new() }
}

impl ProcessControl for SystemProcesses {
    fn is_running(&mut self, name: &str) -> bool {
        self.system.refresh_processes();
        self.system
            .processes()
            .values()
            .any(|p| p.name().eq_ignore_ascii_case(name))
    }

    fn launch(&mut self, uri: &str) -> Result<(), DispatchError> {
        let mut cmd = launcher_command(uri);
        debug!(?cmd, "launching");
        spawn_reaped(&mut cmd)
            .map(|_reaper| ())
            .map_err(|source| DispatchError::Launch { uri: uri.to_string(), source })
    }

    fn terminate(&mut self, name: &str) -> usize {
        self.system.refresh_processes();
        self.system
            .processes()
            .values()
            .filter(|p| p.name().eq_ignore_ascii_case(name))
            .filter(|p| p.kill())
            .count()
    }
}

/// Start `cmd` detached from stdio and wait for it on a background thread.
///
/// The launcher hands off to the desktop and exits; waiting keeps it from
/// lingering as a zombie.  The handle yields its exit status.
fn spawn_reaped(cmd: &mut Command) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            debug!(error = %e, "launcher wait failed");
            None
        }
    }))
}

/// Command that opens `uri` with the desktop's registered handler.
pub fn launcher_command(uri: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        // Empty title argument so `start` does not treat the URI as one.
        cmd.args(["/C", "start", "", uri]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(uri);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(uri);
        cmd
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EnigoInjector: synthetic key events (feature = "input")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "input")]
pub struct EnigoInjector {
    enigo: enigo::Enigo,
}

#[cfg(feature = "input")]
impl EnigoInjector {
    pub fn new() -> Self {
        EnigoInjector { enigo: enigo::Enigo::new() }
    }
}

#[cfg(feature = "input")]
fn to_enigo(key: Key) -> enigo::Key {
    match key {
        Key::Alt        => enigo::Key::Alt,
        Key::Shift      => enigo::Key::Shift,
        Key::Control    => enigo::Key::Control,
        Key::LeftArrow  => enigo::Key::LeftArrow,
        Key::RightArrow => enigo::Key::RightArrow,
        Key::Space      => enigo::Key::Space,
        Key::Char(c)    => enigo::Key::Layout(c),
    }
}

#[cfg(feature = "input")]
impl KeyInjector for EnigoInjector {
    fn press(&mut self, key: Key) {
        use enigo::KeyboardControllable;
        self.enigo.key_click(to_enigo(key));
    }

    fn hotkey(&mut self, keys: &[Key]) {
        use enigo::KeyboardControllable;
        for &k in keys {
            self.enigo.key_down(to_enigo(k));
        }
        for &k in keys.iter().rev() {
            self.enigo.key_up(to_enigo(k));
        }
    }
}

/// Best available key injector for this build.
pub fn key_injector() -> Box<dyn KeyInjector> {
    #[cfg(feature = "input")]
    {
        Box::new(EnigoInjector::new())
    }
    #[cfg(not(feature = "input"))]
    {
        tracing::info!("built without `input`: gesture key presses are logged, not sent");
        Box::new(crate::dispatch::LogInjector)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_passes_uri_last() {
        let cmd = launcher_command("spotify:");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.last().map(String::as_str), Some("spotify:"));
    }

    #[cfg(unix)]
    #[test]
    fn launched_child_is_reaped() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);
        let status = spawn_reaped(&mut cmd).unwrap().join().unwrap();
        assert_eq!(status.and_then(|s| s.code()), Some(3));
    }

    #[test]
    fn process_lookup_finds_nothing_for_nonsense_name() {
        let mut procs = SystemProcesses::new();
        assert!(!procs.is_running("no-such-process-7f3a9c.exe"));
        assert_eq!(procs.terminate("no-such-process-7f3a9c.exe"), 0);
    }
}
