use std::time::Instant;

/// Pixel layout of a [`Frame`] buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, blue-green-red interleaved.
    Bgr,
    /// 1 byte per pixel.
    Gray,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr => 3,
            PixelFormat::Gray => 1,
        }
    }
}

/// One captured or processed image, owned by whichever pipeline stage is
/// currently working on it and moved to the next.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub timestamp: Instant,
}

impl Frame {
    pub fn bgr(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        Frame {
            data,
            width,
            height,
            format: PixelFormat::Bgr,
            timestamp: Instant::now(),
        }
    }

    pub fn gray(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Frame {
            data,
            width,
            height,
            format: PixelFormat::Gray,
            timestamp: Instant::now(),
        }
    }

    /// Solid-color BGR frame.
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&bgr);
        }
        Frame::bgr(width, height, data)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Expand a gray frame to BGR; BGR frames pass through unchanged.
    pub fn into_bgr(self) -> Frame {
        match self.format {
            PixelFormat::Bgr => self,
            PixelFormat::Gray => {
                let mut data = Vec::with_capacity(self.data.len() * 3);
                for &v in &self.data {
                    data.extend_from_slice(&[v, v, v]);
                }
                Frame {
                    data,
                    format: PixelFormat::Bgr,
                    ..self
                }
            }
        }
    }
}

/// Axis-aligned face box in pixel coordinates of the source frame.
#[derive(Clone, Copy, Debug)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub score: f32,
}

/// MediaPipe hand topology: wrist, then four joints per finger,
/// thumb through pinky.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

pub const NUM_LANDMARKS: usize = 21;

/// One tracked hand: 21 ordered keypoints in normalized [0,1] frame
/// coordinates, discarded after the gesture classifier has seen them.
#[derive(Clone, Debug)]
pub struct HandLandmarks {
    pub points: [(f32, f32); NUM_LANDMARKS],
    pub confidence: f32,
    pub handedness: f32,
}

impl HandLandmarks {
    pub fn thumb_tip(&self) -> (f32, f32) {
        self.points[landmark::THUMB_TIP]
    }

    pub fn index_tip(&self) -> (f32, f32) {
        self.points[landmark::INDEX_TIP]
    }

    /// Tip and PIP-joint pairs for all five fingers, thumb first.
    pub fn finger_pairs(&self) -> [((f32, f32), (f32, f32)); 5] {
        use landmark::*;
        [
            (self.points[THUMB_TIP], self.points[THUMB_IP]),
            (self.points[INDEX_TIP], self.points[INDEX_PIP]),
            (self.points[MIDDLE_TIP], self.points[MIDDLE_PIP]),
            (self.points[RING_TIP], self.points[RING_PIP]),
            (self.points[PINKY_TIP], self.points[PINKY_PIP]),
        ]
    }
}

/// Discrete gesture vocabulary, derived per frame and never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    ThumbsUp,
    ChangeFilter,
    PauseResume,
    None,
}

impl GestureLabel {
    pub fn label(self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp => "thumbs up",
            GestureLabel::ChangeFilter => "change filter",
            GestureLabel::PauseResume => "pause/resume",
            GestureLabel::None => "",
        }
    }
}
