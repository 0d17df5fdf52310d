//! BGR↔HSV conversion and HSV range segmentation.
//!
//! Hue lives in [0,180) and saturation/value in [0,255], matching the 8-bit
//! convention the rest of the pipeline assumes.

use rayon::prelude::*;

use crate::types::{Frame, PixelFormat};

/// Named (lower, upper) HSV bounds, componentwise inclusive.
#[derive(Clone, Copy, Debug)]
pub struct ColorBounds {
    pub name: &'static str,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

const COLOR_TABLE: &[ColorBounds] = &[
    ColorBounds {
        name: "red",
        lower: [0, 120, 70],
        upper: [10, 255, 255],
    },
    ColorBounds {
        name: "green",
        lower: [36, 50, 70],
        upper: [89, 255, 255],
    },
    ColorBounds {
        name: "blue",
        lower: [90, 60, 0],
        upper: [128, 255, 255],
    },
];

pub fn color_bounds(name: &str) -> Option<ColorBounds> {
    COLOR_TABLE.iter().copied().find(|c| c.name == name)
}

pub fn color_table() -> &'static [ColorBounds] {
    COLOR_TABLE
}

/// Convert one BGR pixel to HSV.
pub fn bgr_to_hsv(bgr: [u8; 3]) -> [u8; 3] {
    let b = bgr[0] as f32;
    let g = bgr[1] as f32;
    let r = bgr[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h_deg = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    [
        ((h_deg / 2.0).round() as u16 % 180) as u8,
        s.round() as u8,
        v.round() as u8,
    ]
}

/// Convert one HSV pixel back to BGR.
pub fn hsv_to_bgr(hsv: [u8; 3]) -> [u8; 3] {
    let h_deg = hsv[0] as f32 * 2.0;
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32 / 255.0;

    let c = v * s;
    let sector = h_deg / 60.0;
    let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((b1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((r1 + m) * 255.0).round() as u8,
    ]
}

/// Whole-frame BGR→HSV, 3 bytes per pixel in, 3 out.
pub fn frame_to_hsv(frame: &Frame) -> Vec<u8> {
    debug_assert_eq!(frame.format, PixelFormat::Bgr);
    let mut hsv = vec![0u8; frame.data.len()];
    hsv.par_chunks_exact_mut(3)
        .zip(frame.data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst.copy_from_slice(&bgr_to_hsv([src[0], src[1], src[2]]));
        });
    hsv
}

/// Whole-buffer HSV→BGR.
pub fn hsv_to_frame_data(hsv: &[u8]) -> Vec<u8> {
    let mut bgr = vec![0u8; hsv.len()];
    bgr.par_chunks_exact_mut(3)
        .zip(hsv.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst.copy_from_slice(&hsv_to_bgr([src[0], src[1], src[2]]));
        });
    bgr
}

fn in_range(hsv: [u8; 3], lower: [u8; 3], upper: [u8; 3]) -> bool {
    (0..3).all(|i| lower[i] <= hsv[i] && hsv[i] <= upper[i])
}

/// Keep only pixels whose HSV value lies within the bounds; everything else
/// goes to black in BGR. An all-black result is valid output, not an error.
pub fn segment(frame: &Frame, bounds: &ColorBounds) -> Frame {
    debug_assert_eq!(frame.format, PixelFormat::Bgr);
    let mut out = vec![0u8; frame.data.len()];
    out.par_chunks_exact_mut(3)
        .zip(frame.data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let hsv = bgr_to_hsv([src[0], src[1], src[2]]);
            if in_range(hsv, bounds.lower, bounds.upper) {
                dst.copy_from_slice(src);
            }
        });

    Frame {
        data: out,
        width: frame.width,
        height: frame.height,
        format: PixelFormat::Bgr,
        timestamp: frame.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_colors_convert() {
        // Pure blue, green, red in BGR order.
        assert_eq!(bgr_to_hsv([255, 0, 0]), [120, 255, 255]);
        assert_eq!(bgr_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(bgr_to_hsv([0, 0, 255]), [0, 255, 255]);
        assert_eq!(bgr_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(bgr_to_hsv([255, 255, 255]), [0, 0, 255]);
    }

    #[test]
    fn hsv_roundtrip_on_sector_boundaries() {
        for h in [0u8, 30, 60, 90, 120, 150] {
            let bgr = hsv_to_bgr([h, 255, 255]);
            assert_eq!(bgr_to_hsv(bgr)[0], h, "hue {h} did not round-trip");
        }
    }

    #[test]
    fn hsv_roundtrip_general_within_rounding() {
        for h in 0..180u8 {
            let bgr = hsv_to_bgr([h, 255, 255]);
            let back = bgr_to_hsv(bgr)[0] as i32;
            assert!((back - h as i32).abs() <= 1, "hue {h} came back as {back}");
        }
    }

    #[test]
    fn segment_keeps_matching_pixels() {
        let red = color_bounds("red").unwrap();
        let frame = Frame::solid(4, 4, [0, 0, 255]);
        let out = segment(&frame, &red);
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn segment_zeroes_non_matching_pixels() {
        let red = color_bounds("red").unwrap();
        // Solid blue frame has no red HSV pixels.
        let frame = Frame::solid(4, 4, [255, 0, 0]);
        let out = segment(&frame, &red);
        assert!(out.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn degenerate_bounds_on_non_black_frame_give_all_zero() {
        let bounds = ColorBounds {
            name: "black",
            lower: [0, 0, 0],
            upper: [0, 0, 0],
        };
        let frame = Frame::solid(8, 8, [10, 200, 30]);
        let out = segment(&frame, &bounds);
        assert!(out.data.iter().all(|&b| b == 0));
    }
}
