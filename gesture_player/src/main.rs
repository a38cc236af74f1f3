//! gesture_player: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gesture_player::app::{run, AppConfig};
use gesture_player::error::AppError;

#[derive(Parser, Debug)]
#[command(name = "gesture_player", version, about = "Control music playback with hand gestures")]
struct Args {
    /// Landmark helper script
    #[arg(long)]
    detector: Option<PathBuf>,

    /// Interpreter used to run the landmark helper
    #[arg(long)]
    python: Option<String>,

    /// Drive gestures from the keyboard instead of the webcam
    #[arg(long)]
    simulate: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), AppError> {
    init_logging();
    let args = Args::parse();

    let mut cfg = AppConfig::default();
    cfg.simulate |= args.simulate;
    if let Some(script) = args.detector {
        cfg.detector.script = script;
    }
    if let Some(python) = args.python {
        cfg.detector.interpreter = python;
    }

    #[cfg(feature = "camera")]
    tracing::info!(simulate = cfg.simulate, camera = cfg.camera_index, "Mode: webcam build");
    #[cfg(not(feature = "camera"))]
    tracing::info!("Mode: keyboard simulation  (use --features camera for a webcam)");

    run(cfg)
}
