//! Run hand detection and gesture classification over image files.
//!
//! Usage: cargo run --example gesture_from_image -- hand1.jpg hand2.jpg

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use camfx::detect::{Detector, DetectorConfig};
use camfx::gesture::{self, GestureThresholds};
use camfx::models::{self, ModelPaths};
use camfx::types::{Frame, GestureLabel};

fn main() -> Result<()> {
    env_logger::init();

    let image_paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if image_paths.is_empty() {
        bail!("usage: gesture_from_image <image>...");
    }

    let paths = ModelPaths::default();
    models::ensure_models_available(&paths)?;
    let mut detector = Detector::open(&paths, DetectorConfig::default())?;
    let thresholds = GestureThresholds::default();

    for path in image_paths {
        let frame = load_frame(&path)?;
        let hands = detector
            .detect_hands(&frame)
            .with_context(|| format!("detection failed on {}", path.display()))?;

        if hands.is_empty() {
            println!("{}: no hands", path.display());
            continue;
        }

        for hand in &hands {
            let label = gesture::classify(hand, &thresholds);
            let text = match label {
                GestureLabel::None => "no gesture",
                _ => label.label(),
            };
            println!(
                "{}: {} (confidence {:.0}%, open hand: {})",
                path.display(),
                text,
                hand.confidence * 100.0,
                gesture::is_open_hand(hand)
            );
        }
    }

    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let mut bgr = Vec::with_capacity(img.as_raw().len());
    for px in img.as_raw().chunks_exact(3) {
        bgr.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Ok(Frame::bgr(width, height, bgr))
}
