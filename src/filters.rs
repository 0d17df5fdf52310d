//! The filter dispatch table: exactly one transform per frame.

use image::{GrayImage, ImageBuffer, Rgb};
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, laplacian_filter, median_filter};
use rayon::prelude::*;

use crate::color;
use crate::types::{Frame, PixelFormat};

/// Sigma for the 15×15 Gaussian kernel, derived the way OpenCV derives it
/// when sigma is left at 0: 0.3·((k−1)/2 − 1) + 0.8.
const BLUR_SIGMA: f32 = 2.6;
/// Median kernel 5×5.
const MEDIAN_RADIUS: u32 = 2;
const EDGES_THRESHOLDS: (f32, f32) = (50.0, 150.0);
const CANNY_THRESHOLDS: (f32, f32) = (100.0, 200.0);
/// Fixed additive term of the brighten map.
pub const BRIGHTEN_BETA: f32 = 50.0;

/// The closed set of selectable transforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    None,
    Blur,
    Edges,
    MedianBlur,
    CannyEdges,
    Laplacian,
    Brighten,
    Hue,
    Saturation,
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::None,
        FilterKind::Blur,
        FilterKind::Edges,
        FilterKind::MedianBlur,
        FilterKind::CannyEdges,
        FilterKind::Laplacian,
        FilterKind::Brighten,
        FilterKind::Hue,
        FilterKind::Saturation,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Blur => "blur",
            FilterKind::Edges => "edges",
            FilterKind::MedianBlur => "median blur",
            FilterKind::CannyEdges => "canny edges",
            FilterKind::Laplacian => "laplacian",
            FilterKind::Brighten => "brighten",
            FilterKind::Hue => "hue",
            FilterKind::Saturation => "saturation",
        }
    }

    /// Next filter in the cycle, wrapping past the end.
    pub fn next(self) -> FilterKind {
        let idx = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Scalar parameters read by the parameterized filters.
#[derive(Clone, Copy, Debug)]
pub struct FilterParams {
    /// Hue constant, [0,180).
    pub hue: u8,
    /// Saturation scale, [0.5,2.0].
    pub saturation: f32,
    /// Brighten alpha, [0.5,2.0].
    pub brightness: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams {
            hue: 0,
            saturation: 1.0,
            brightness: 1.2,
        }
    }
}

/// Apply the selected transform. Pure: same inputs, same output.
pub fn apply(frame: Frame, kind: FilterKind, params: &FilterParams) -> Frame {
    debug_assert_eq!(frame.format, PixelFormat::Bgr);
    match kind {
        FilterKind::None => frame,
        FilterKind::Blur => blur(frame),
        FilterKind::Edges => edges(frame, EDGES_THRESHOLDS),
        FilterKind::MedianBlur => median_blur(frame),
        FilterKind::CannyEdges => edges(frame, CANNY_THRESHOLDS),
        FilterKind::Laplacian => laplacian(frame),
        FilterKind::Brighten => brighten(frame, params.brightness, BRIGHTEN_BETA),
        FilterKind::Hue => set_hue(frame, params.hue),
        FilterKind::Saturation => scale_saturation(frame, params.saturation),
    }
}

fn bgr_image(frame: &Frame) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    // Channel order is irrelevant to the smoothing kernels, so BGR bytes ride
    // in an Rgb buffer unconverted.
    ImageBuffer::from_raw(frame.width, frame.height, frame.data.clone())
        .expect("frame buffer matches its dimensions")
}

fn blur(frame: Frame) -> Frame {
    let img = bgr_image(&frame);
    let blurred = gaussian_blur_f32(&img, BLUR_SIGMA);
    Frame {
        data: blurred.into_raw(),
        ..frame
    }
}

fn median_blur(frame: Frame) -> Frame {
    let img = bgr_image(&frame);
    let filtered = median_filter(&img, MEDIAN_RADIUS, MEDIAN_RADIUS);
    Frame {
        data: filtered.into_raw(),
        ..frame
    }
}

/// Luma reduction then Canny; output is a 1-channel frame.
fn edges(frame: Frame, thresholds: (f32, f32)) -> Frame {
    let gray = to_gray(&frame);
    let gray_img = GrayImage::from_raw(frame.width, frame.height, gray)
        .expect("gray buffer matches frame dimensions");
    let edges = canny(&gray_img, thresholds.0, thresholds.1);
    Frame {
        data: edges.into_raw(),
        format: PixelFormat::Gray,
        ..frame
    }
}

fn laplacian(frame: Frame) -> Frame {
    let gray = to_gray(&frame);
    let gray_img = GrayImage::from_raw(frame.width, frame.height, gray)
        .expect("gray buffer matches frame dimensions");
    let second = laplacian_filter(&gray_img);
    let rescaled: Vec<u8> = second
        .into_raw()
        .into_par_iter()
        .map(|v: i16| v.unsigned_abs().min(255) as u8)
        .collect();
    Frame {
        data: rescaled,
        format: PixelFormat::Gray,
        ..frame
    }
}

/// Per-pixel affine map `clamp(alpha·v + beta, 0, 255)`.
pub fn brighten(frame: Frame, alpha: f32, beta: f32) -> Frame {
    let mut data = frame.data;
    data.par_iter_mut().for_each(|v| {
        *v = (alpha * *v as f32 + beta).round().clamp(0.0, 255.0) as u8;
    });
    Frame { data, ..frame }
}

fn set_hue(frame: Frame, hue: u8) -> Frame {
    let mut hsv = color::frame_to_hsv(&frame);
    hsv.par_chunks_exact_mut(3).for_each(|px| px[0] = hue);
    Frame {
        data: color::hsv_to_frame_data(&hsv),
        ..frame
    }
}

fn scale_saturation(frame: Frame, scale: f32) -> Frame {
    let mut hsv = color::frame_to_hsv(&frame);
    hsv.par_chunks_exact_mut(3).for_each(|px| {
        px[1] = (px[1] as f32 * scale).clamp(0.0, 255.0) as u8;
    });
    Frame {
        data: color::hsv_to_frame_data(&hsv),
        ..frame
    }
}

fn to_gray(frame: &Frame) -> Vec<u8> {
    let mut gray = vec![0u8; frame.pixel_count()];
    gray.par_iter_mut()
        .zip(frame.data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let b = src[0] as f32;
            let g = src[1] as f32;
            let r = src[2] as f32;
            *dst = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        });
    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_through_all_filters() {
        let mut kind = FilterKind::None;
        for _ in 0..FilterKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, FilterKind::None);
    }

    #[test]
    fn blur_of_constant_signal_is_identity() {
        let frame = Frame::solid(100, 100, [0, 0, 255]);
        let out = apply(frame.clone(), FilterKind::Blur, &FilterParams::default());
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn edges_of_solid_frame_are_empty() {
        let frame = Frame::solid(100, 100, [0, 0, 255]);
        let out = apply(frame, FilterKind::Edges, &FilterParams::default());
        assert_eq!(out.format, PixelFormat::Gray);
        assert!(out.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_and_laplacian_on_solid_frame_are_empty() {
        let frame = Frame::solid(64, 64, [30, 200, 90]);
        let out = apply(
            frame.clone(),
            FilterKind::CannyEdges,
            &FilterParams::default(),
        );
        assert!(out.data.iter().all(|&v| v == 0));
        let out = apply(frame, FilterKind::Laplacian, &FilterParams::default());
        assert!(out.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn median_blur_of_constant_signal_is_identity() {
        let frame = Frame::solid(32, 32, [12, 34, 56]);
        let out = apply(
            frame.clone(),
            FilterKind::MedianBlur,
            &FilterParams::default(),
        );
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn brighten_identity_and_affine() {
        let frame = Frame::solid(10, 10, [100, 100, 100]);
        let out = brighten(frame.clone(), 1.0, 0.0);
        assert_eq!(out.data, frame.data);

        let out = brighten(frame, 1.2, 50.0);
        // clamp(1.2 * 100 + 50) = 170 at every pixel
        assert!(out.data.iter().all(|&v| v == 170));

        let bright = Frame::solid(4, 4, [250, 250, 250]);
        let out = brighten(bright, 1.2, 50.0);
        assert!(out.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn hue_filter_writes_hue_channel() {
        let frame = Frame::solid(8, 8, [0, 0, 255]);
        let params = FilterParams {
            hue: 60,
            ..FilterParams::default()
        };
        let out = apply(frame, FilterKind::Hue, &params);
        // Saturated red with hue forced to 60 is pure green.
        for px in out.data.chunks_exact(3) {
            assert_eq!(px, [0, 255, 0]);
        }
        for px in out.data.chunks_exact(3) {
            assert_eq!(crate::color::bgr_to_hsv([px[0], px[1], px[2]])[0], 60);
        }
    }

    #[test]
    fn saturation_scale_one_is_identity() {
        let frame = Frame::solid(8, 8, [40, 120, 200]);
        let out = apply(frame.clone(), FilterKind::Saturation, &FilterParams::default());
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn saturation_scale_clamps() {
        let frame = Frame::solid(4, 4, [0, 0, 255]);
        let params = FilterParams {
            saturation: 2.0,
            ..FilterParams::default()
        };
        let out = apply(frame.clone(), FilterKind::Saturation, &params);
        // Already fully saturated; doubling clamps back to 255.
        assert_eq!(out.data, frame.data);
    }
}
