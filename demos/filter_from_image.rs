//! Apply every filter to an image file and write the results next to it.
//!
//! Usage: cargo run --example filter_from_image -- photo.jpg

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use camfx::filters::{self, FilterKind};
use camfx::types::{Frame, PixelFormat};

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: filter_from_image <image>");
    };

    let frame = load_frame(&path)?;
    println!(
        "loaded {} ({}x{})",
        path.display(),
        frame.width,
        frame.height
    );

    let params = camfx::control::ControlState::default().params();
    for kind in FilterKind::ALL {
        if kind == FilterKind::None {
            continue;
        }
        let out = filters::apply(frame.clone(), kind, &params);
        let out_path = output_path(&path, kind);
        save_frame(&out, &out_path)?;
        println!("{:<12} -> {}", kind.display_name(), out_path.display());
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

fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    match frame.format {
        PixelFormat::Bgr => {
            let mut rgb = Vec::with_capacity(frame.data.len());
            for px in frame.data.chunks_exact(3) {
                rgb.extend_from_slice(&[px[2], px[1], px[0]]);
            }
            let img = image::RgbImage::from_raw(frame.width, frame.height, rgb)
                .context("frame buffer does not match its dimensions")?;
            img.save(path)
                .with_context(|| format!("failed to save {}", path.display()))?;
        }
        PixelFormat::Gray => {
            let img =
                image::GrayImage::from_raw(frame.width, frame.height, frame.data.clone())
                    .context("frame buffer does not match its dimensions")?;
            img.save(path)
                .with_context(|| format!("failed to save {}", path.display()))?;
        }
    }
    Ok(())
}

fn output_path(input: &Path, kind: FilterKind) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    let name = kind.display_name().replace(' ', "_");
    input.with_file_name(format!("{stem}_{name}.png"))
}
