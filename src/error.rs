use std::path::PathBuf;

use thiserror::Error;

/// Capture-side failures. Opening errors are fatal; a read failure mid-loop
/// is logged and ends the loop gracefully.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0:#}")]
    CameraUnavailable(anyhow::Error),
    #[error("camera stream ended")]
    EndOfStream,
}

/// Detection-side failures. `ModelLoad` is checked once at startup and is
/// fatal; `Inference` is per-frame and the caller skips the stage.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to load model {}: {source:#}", .path.display())]
    ModelLoad {
        path: PathBuf,
        source: anyhow::Error,
    },
    #[error("detection failed: {0:#}")]
    Inference(anyhow::Error),
}

impl From<anyhow::Error> for DetectError {
    fn from(err: anyhow::Error) -> Self {
        DetectError::Inference(err)
    }
}

/// A window/draw call failed. The caller logs it, skips that window's update
/// and keeps the loop running.
#[derive(Debug, Error)]
#[error("window update failed: {0}")]
pub struct DisplayError(#[from] minifb::Error);
