//! Detection model files: fixed relative paths under `models/`, verified
//! once at startup. A missing file gets one download attempt; whatever is
//! still missing after that is fatal.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

const MODEL_DIR: &str = "models";

const FACE_MODEL_FILENAME: &str = "face_detection_short_range.onnx";
const FACE_MODEL_URL: &str =
    "https://raw.githubusercontent.com/camfx-app/models/main/face_detection_short_range.onnx";
const PALM_MODEL_FILENAME: &str = "palm_detection_mediapipe_2023feb.onnx";
const PALM_MODEL_URL: &str =
    "https://raw.githubusercontent.com/camfx-app/models/main/palm_detection_mediapipe_2023feb.onnx";
const HAND_LANDMARK_MODEL_FILENAME: &str = "handpose_estimation_mediapipe_2023feb.onnx";
const HAND_LANDMARK_MODEL_URL: &str =
    "https://raw.githubusercontent.com/camfx-app/models/main/handpose_estimation_mediapipe_2023feb.onnx";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    FaceDetector,
    PalmDetector,
    HandLandmarks,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::FaceDetector,
        ModelKind::PalmDetector,
        ModelKind::HandLandmarks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => "face detector",
            ModelKind::PalmDetector => "palm detector",
            ModelKind::HandLandmarks => "hand landmarks",
        }
    }

    fn filename(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => FACE_MODEL_FILENAME,
            ModelKind::PalmDetector => PALM_MODEL_FILENAME,
            ModelKind::HandLandmarks => HAND_LANDMARK_MODEL_FILENAME,
        }
    }

    fn url(self) -> &'static str {
        match self {
            ModelKind::FaceDetector => FACE_MODEL_URL,
            ModelKind::PalmDetector => PALM_MODEL_URL,
            ModelKind::HandLandmarks => HAND_LANDMARK_MODEL_URL,
        }
    }

    pub fn default_path(self) -> PathBuf {
        PathBuf::from(MODEL_DIR).join(self.filename())
    }
}

/// The fixed model locations the detectors load from.
#[derive(Clone, Debug)]
pub struct ModelPaths {
    pub face: PathBuf,
    pub palm: PathBuf,
    pub hand_landmarks: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        ModelPaths {
            face: ModelKind::FaceDetector.default_path(),
            palm: ModelKind::PalmDetector.default_path(),
            hand_landmarks: ModelKind::HandLandmarks.default_path(),
        }
    }
}

impl ModelPaths {
    pub fn path_for(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::FaceDetector => &self.face,
            ModelKind::PalmDetector => &self.palm,
            ModelKind::HandLandmarks => &self.hand_landmarks,
        }
    }
}

/// Make every model available, printing availability as we go.
pub fn ensure_models_available(paths: &ModelPaths) -> anyhow::Result<()> {
    for kind in ModelKind::ALL {
        ensure_model_available(kind, paths.path_for(kind))?;
    }
    Ok(())
}

pub fn ensure_model_available(kind: ModelKind, path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        println!("{} model available at {}", kind.label(), path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    download_to_path(kind, path)
        .with_context(|| format!("failed to download {} model", kind.label()))?;
    println!("{} model downloaded to {}", kind.label(), path.display());
    Ok(())
}

fn download_to_path(kind: ModelKind, dest: &Path) -> anyhow::Result<()> {
    log::info!(
        "downloading {} model from {} to {}",
        kind.label(),
        kind.url(),
        dest.display()
    );

    let client = Client::new();
    let mut response = client
        .get(kind.url())
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let progress = create_progress_bar(response.content_length());

    let tmp_path = dest.with_extension("download");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        progress.set_position(downloaded);
    }
    progress.finish_with_message("model ready");

    file.sync_all()
        .context("failed to flush downloaded model to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move temp model {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    Ok(())
}

fn create_progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap()
            .progress_chars("=>-");
            pb.set_style(style);
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} downloading model").unwrap();
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
