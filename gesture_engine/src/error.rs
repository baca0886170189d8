use std::path::PathBuf;

use thiserror::Error;

use crate::landmarks::Unavailable;

/// Why a frame could not be used as a calibration sample.  Shown to the user
/// as the calibration status line; sampling simply tries again next frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SampleRejected {
    #[error("{0}")]
    Unavailable(#[from] Unavailable),
    #[error("No pose detected. Stand naturally and keep torso visible.")]
    NoPose,
    #[error("{0}")]
    LowVisibility(&'static str),
    #[error("Show both hands at comfortable neutral height.")]
    NoHands,
    #[error("Both left and right hands are needed for calibration.")]
    MissingHand,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("calibration store {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("calibration store encoding: {0}")]
    Json(#[from] serde_json::Error),
}
