//! minifb-backed presentation: ARGB conversion, window updates and the
//! keyboard front end.

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::control::ControlEvent;
use crate::error::DisplayError;
use crate::filters::FilterKind;
use crate::types::{Frame, PixelFormat};

/// One live output window.
pub struct VideoWindow {
    window: Window,
    buffer: Vec<u32>,
}

impl VideoWindow {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions::default(),
        )?;
        Ok(VideoWindow {
            window,
            buffer: Vec::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Draw one frame. On failure the caller logs and skips this window;
    /// the loop keeps running.
    pub fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        frame_to_argb(frame, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, frame.width as usize, frame.height as usize)?;
        Ok(())
    }

    /// Map discrete key presses to control events. Presses, not levels:
    /// holding a key does not re-fire.
    pub fn poll_events(&mut self) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        if !self.window.is_open() {
            events.push(ControlEvent::Quit);
            return events;
        }

        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            match key {
                Key::Q => events.push(ControlEvent::Quit),
                Key::B => events.push(ControlEvent::Select(FilterKind::Blur)),
                Key::E => events.push(ControlEvent::Select(FilterKind::Edges)),
                Key::R => events.push(ControlEvent::Select(FilterKind::Brighten)),
                Key::H => {
                    events.push(ControlEvent::Select(FilterKind::Hue));
                    events.push(ControlEvent::StepHue);
                }
                Key::S => {
                    events.push(ControlEvent::Select(FilterKind::Saturation));
                    events.push(ControlEvent::StepSaturation);
                }
                _ => {}
            }
        }
        events
    }
}

/// BGR or gray bytes into the 0RGB u32 layout minifb wants.
pub fn frame_to_argb(frame: &Frame, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.reserve(frame.pixel_count());
    match frame.format {
        PixelFormat::Bgr => {
            for px in frame.data.chunks_exact(3) {
                let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
                buffer.push((r << 16) | (g << 8) | b);
            }
        }
        PixelFormat::Gray => {
            for &v in &frame.data {
                let v = v as u32;
                buffer.push((v << 16) | (v << 8) | v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_frame_packs_into_argb() {
        let frame = Frame::bgr(1, 2, vec![255, 0, 0, 0, 0, 255]);
        let mut buffer = Vec::new();
        frame_to_argb(&frame, &mut buffer);
        assert_eq!(buffer, vec![0x0000FF, 0xFF0000]);
    }

    #[test]
    fn gray_frame_replicates_channels() {
        let frame = Frame::gray(2, 1, vec![0x40, 0xFF]);
        let mut buffer = Vec::new();
        frame_to_argb(&frame, &mut buffer);
        assert_eq!(buffer, vec![0x404040, 0xFFFFFF]);
    }
}
