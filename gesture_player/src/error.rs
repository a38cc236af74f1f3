use std::io;

use thiserror::Error;

// Frame capture and landmark detection

#[derive(Debug, Error)]
pub enum SourceError {
    #[cfg(feature = "camera")]
    #[error("camera error: {0}")]
    Camera(#[from] nokhwa::NokhwaError),
    #[error("failed to start hand detector `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("hand detector did not signal ready, got {0:?}")]
    NotReady(String),
    #[error("hand detector closed its output")]
    Closed,
    #[error("hand detector I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed hand detector response: {0}")]
    Json(#[from] serde_json::Error),
}

// Gesture actions

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to launch `{uri}`: {source}")]
    Launch {
        uri: String,
        #[source]
        source: io::Error,
    },
}

// Main application error type

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Source Error: {0}")]
    Source(#[from] SourceError),
    #[error("Window Error: {0}")]
    Window(#[from] minifb::Error),
}
