//! Overlay drawing on BGR frame buffers: face boxes, the hand skeleton and
//! a small bitmap-font status label.

use crate::types::{FaceBox, Frame, HandLandmarks, PixelFormat};

/// Bone list of the 21-point hand topology.
pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const BOX_COLOR: [u8; 3] = [255, 0, 0];
const LINE_COLOR: [u8; 3] = [248, 189, 56];
const POINT_COLOR: [u8; 3] = [113, 113, 248];
pub const LABEL_COLOR: [u8; 3] = [80, 255, 80];

const BOX_THICKNESS: i32 = 2;
const LINE_THICKNESS: i32 = 3;

pub fn draw_face_boxes(frame: &mut Frame, boxes: &[FaceBox]) {
    for face in boxes {
        draw_rect(
            frame,
            face.x,
            face.y,
            face.x + face.w,
            face.y + face.h,
            BOX_COLOR,
            BOX_THICKNESS,
        );
    }
}

pub fn draw_hand_skeleton(frame: &mut Frame, hand: &HandLandmarks) {
    let w = frame.width as f32;
    let h = frame.height as f32;
    let points: Vec<(f32, f32)> = hand.points.iter().map(|&(x, y)| (x * w, y * h)).collect();

    for &(a, b) in CONNECTIONS {
        if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
            draw_line(frame, *pa, *pb, LINE_COLOR, LINE_THICKNESS);
        }
    }

    let radius = (LINE_THICKNESS / 2).max(2) + 1;
    for &(x, y) in &points {
        draw_circle(frame, (x as i32, y as i32), radius, POINT_COLOR);
    }
}

fn draw_rect(frame: &mut Frame, x1: f32, y1: f32, x2: f32, y2: f32, color: [u8; 3], thickness: i32) {
    draw_line(frame, (x1, y1), (x2, y1), color, thickness);
    draw_line(frame, (x2, y1), (x2, y2), color, thickness);
    draw_line(frame, (x2, y2), (x1, y2), color, thickness);
    draw_line(frame, (x1, y2), (x1, y1), color, thickness);
}

fn draw_line(frame: &mut Frame, p0: (f32, f32), p1: (f32, f32), color: [u8; 3], thickness: i32) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel(frame, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if ox == 0 && oy == 0 {
                        continue;
                    }
                    if ox.abs() + oy.abs() <= radius {
                        put_pixel(frame, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_circle(frame: &mut Frame, center: (i32, i32), radius: i32, color: [u8; 3]) {
    let (cx, cy) = center;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    debug_assert_eq!(frame.format, PixelFormat::Bgr);
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= frame.width || uy >= frame.height {
        return;
    }
    let idx = ((uy * frame.width + ux) as usize) * 3;
    if idx + 2 < frame.data.len() {
        frame.data[idx..idx + 3].copy_from_slice(&color);
    }
}

/// 5×7 glyph rows, bit 4 the leftmost column. Uppercase letters, digits and
/// the handful of punctuation the status line needs.
fn glyph(c: char) -> [u8; 7] {
    match c {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x01, 0x01, 0x01, 0x01, 0x11, 0x11, 0x0E],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        _ => [0x00; 7],
    }
}

/// Draw `text` (uppercased) at `(x, y)` with a pixel `scale`.
pub fn draw_label(frame: &mut Frame, x: i32, y: i32, text: &str, color: [u8; 3], scale: i32) {
    let scale = scale.max(1);
    let mut cursor_x = x;
    for c in text.chars() {
        let rows = glyph(c.to_ascii_uppercase());
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        put_pixel(
                            frame,
                            cursor_x + col * scale + sx,
                            y + row as i32 * scale + sy,
                            color,
                        );
                    }
                }
            }
        }
        cursor_x += 6 * scale;
    }
}
