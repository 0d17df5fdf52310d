//! Tensor preparation for the ONNX detectors: letterbox resize of a whole
//! BGR frame, and rotated square crops around hand proposals. Model inputs
//! are RGB floats in [0,1].

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;

use crate::types::{Frame, NUM_LANDMARKS, PixelFormat};

/// Maps letterboxed model coordinates back to frame pixels.
#[derive(Clone, Debug)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

/// Maps rotated-crop coordinates back to frame pixels.
#[derive(Clone, Debug)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
    pub orig_w: u32,
    pub orig_h: u32,
}

fn check_bgr(frame: &Frame) -> Result<()> {
    if frame.format != PixelFormat::Bgr {
        return Err(anyhow!("detector input must be BGR"));
    }
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(3);
    if frame.data.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.data.len(),
            expected_len
        ));
    }
    Ok(())
}

/// Letterbox the frame into a `target_size` square tensor, preserving aspect
/// ratio and padding with black.
pub fn letterbox_frame(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, Letterbox)> {
    check_bgr(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.data.clone(),
        fir::PixelType::U8x3,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new();
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let pad_x = ((target_size as i64 - new_w as i64) / 2).max(0) as usize;
    let pad_y = ((target_size as i64 - new_h as i64) / 2).max(0) as usize;

    let side = target_size as usize;
    let mut tensor = vec![0f32; side * side * 3];
    for row in 0..(new_h as usize) {
        let src_offset = row * new_w as usize * 3;
        let dst_offset = ((pad_y + row) * side + pad_x) * 3;
        for col in 0..(new_w as usize) {
            let src = &resized[src_offset + col * 3..src_offset + col * 3 + 3];
            let dst = &mut tensor[dst_offset + col * 3..dst_offset + col * 3 + 3];
            // BGR bytes to RGB floats.
            dst[0] = src[2] as f32 / 255.0;
            dst[1] = src[1] as f32 / 255.0;
            dst[2] = src[0] as f32 / 255.0;
        }
    }

    let input = Array4::from_shape_vec((1, side, side, 3), tensor)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    let letterbox = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((input, letterbox))
}

impl Letterbox {
    /// Model-input pixel back to frame pixel, clamped to the frame.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let px = (x - self.pad_x) / self.scale;
        let py = (y - self.pad_y) / self.scale;
        (
            px.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            py.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

/// Cut a rotated square (`side` frame pixels, rotated by `angle`) around
/// `center` and resample it to an `output_size` tensor.
pub fn rotated_crop(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_bgr(frame)?;

    let out = output_size as usize;
    let mut data = Vec::with_capacity(out * out * 3);
    let half = output_size as f32 / 2.0;
    let scale = side / output_size as f32;
    let cos = angle.cos();
    let sin = angle.sin();

    for y in 0..output_size {
        let dy = (y as f32 + 0.5 - half) * scale;
        for x in 0..output_size {
            let dx = (x as f32 + 0.5 - half) * scale;
            let src_x = center.0 + dx * cos - dy * sin;
            let src_y = center.1 + dx * sin + dy * cos;
            data.extend_from_slice(&sample_rgb(frame, src_x, src_y));
        }
    }

    let array = Array4::from_shape_vec((1, out, out, 3), data)
        .map_err(|err| anyhow!("failed to build rotated crop tensor: {err}"))?;

    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((array, transform))
}

impl CropTransform {
    /// Crop pixel back to frame pixel, clamped to the frame.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let cos = self.angle.cos();
        let sin = self.angle.sin();
        let ox = self.center.0 + dx * cos - dy * sin;
        let oy = self.center.1 + dx * sin + dy * cos;
        (
            ox.clamp(0.0, (self.orig_w.saturating_sub(1)) as f32),
            oy.clamp(0.0, (self.orig_h.saturating_sub(1)) as f32),
        )
    }
}

/// Bilinear sample; out-of-frame taps read as black.
fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0, 0.0, 0.0];
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;

    let (w, h) = (frame.width as i32, frame.height as i32);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let ix = cx as i32;
        let iy = cy as i32;
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0, 0.0, 0.0];
        }
        let idx = ((iy as u32 * frame.width + ix as u32) as usize) * 3;
        if idx + 2 >= frame.data.len() {
            return [0.0, 0.0, 0.0];
        }
        [
            frame.data[idx + 2] as f32 / 255.0,
            frame.data[idx + 1] as f32 / 255.0,
            frame.data[idx] as f32 / 255.0,
        ]
    };

    let fx = x - x0;
    let fy = y - y0;
    let c00 = fetch(x0, y0);
    let c10 = fetch(x1, y0);
    let c01 = fetch(x0, y1);
    let c11 = fetch(x1, y1);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    [
        lerp(lerp(c00[0], c10[0], fx), lerp(c01[0], c11[0], fx), fy),
        lerp(lerp(c00[1], c10[1], fx), lerp(c01[1], c11[1], fx), fy),
        lerp(lerp(c00[2], c10[2], fx), lerp(c01[2], c11[2], fx), fy),
    ]
}

/// Flat `[x, y, z, ...]` model output into 21 points.
pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>> {
    if flat.len() < NUM_LANDMARKS * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * 3
        ));
    }

    let mut landmarks = Vec::with_capacity(NUM_LANDMARKS);
    for chunk in flat.chunks_exact(3).take(NUM_LANDMARKS) {
        landmarks.push([chunk[0], chunk[1], chunk[2]]);
    }
    Ok(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Frame;

    #[test]
    fn letterbox_pads_portrait_frames_symmetrically() {
        let frame = Frame::solid(50, 100, [0, 0, 255]);
        let (input, letterbox) = letterbox_frame(&frame, 100).unwrap();
        assert_eq!(input.shape(), &[1, 100, 100, 3]);
        assert_eq!(letterbox.pad_y, 0.0);
        assert_eq!(letterbox.pad_x, 25.0);
        // Padding stays black; content is red in RGB order.
        assert_eq!(input[[0, 50, 0, 0]], 0.0);
        assert!(input[[0, 50, 50, 0]] > 0.99);
        assert_eq!(input[[0, 50, 50, 2]], 0.0);
    }

    #[test]
    fn letterbox_projection_round_trips() {
        let frame = Frame::solid(200, 100, [1, 2, 3]);
        let (_, letterbox) = letterbox_frame(&frame, 100).unwrap();
        // Center of the model input maps to the center of the frame.
        let (x, y) = letterbox.project(50.0, 50.0);
        assert!((x - 100.0).abs() < 1.0);
        assert!((y - 50.0).abs() < 1.0);
    }

    #[test]
    fn unrotated_crop_projection_is_affine() {
        let transform = CropTransform {
            center: (100.0, 80.0),
            side: 64.0,
            angle: 0.0,
            output_size: 64,
            orig_w: 400,
            orig_h: 400,
        };
        let (x, y) = transform.project(32.0, 32.0);
        assert_eq!((x, y), (100.0, 80.0));
        let (x, y) = transform.project(0.0, 0.0);
        assert_eq!((x, y), (68.0, 48.0));
    }

    #[test]
    fn landmark_decode_needs_full_payload() {
        assert!(decode_landmarks(&[0.0; 62]).is_err());
        let decoded = decode_landmarks(&[0.5; 63]).unwrap();
        assert_eq!(decoded.len(), 21);
    }
}
