//! The video loop: one thread owns the control state, the detector and the
//! windows; the camera thread feeds it frames, every front end feeds it
//! events. One frame in flight, next frame is the de facto retry.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::camera;
use crate::color::{self, ColorBounds};
use crate::config::Config;
use crate::control::{ControlEvent, ControlState, GestureEdge, gesture_event};
use crate::detect::Detector;
use crate::display::VideoWindow;
use crate::error::CaptureError;
use crate::filters;
use crate::gesture;
use crate::overlay;
use crate::types::{Frame, GestureLabel};

const WINDOW_TITLE: &str = "camfx";
const LABEL_SCALE: i32 = 2;
const LABEL_MARGIN: i32 = 10;

/// Queue connecting front ends to the loop. GUI adapters clone the sender;
/// the loop drains the receiver once per frame.
pub fn control_channel() -> (Sender<ControlEvent>, Receiver<ControlEvent>) {
    unbounded()
}

/// Run the capture→detect→segment→filter→present loop until quit,
/// end-of-stream or a failed read. The camera handle and windows are
/// released on every exit path.
pub fn run(
    config: &Config,
    mut detector: Option<Detector>,
    control_rx: Receiver<ControlEvent>,
) -> Result<()> {
    let (frame_tx, frame_rx) = bounded(1);
    let _stream = camera::start_stream(config.camera_index, frame_tx)?;

    let mut frame = match next_frame(&frame_rx) {
        Ok(frame) => frame,
        Err(err) => {
            log::warn!("{err} before the first frame");
            return Ok(());
        }
    };

    let mut window = VideoWindow::open(WINDOW_TITLE, frame.width, frame.height)?;
    let mut segment_windows = open_segment_windows(config, frame.width, frame.height);

    let mut state = ControlState::default();
    let mut edge = GestureEdge::new();

    loop {
        let mut quit = false;
        let events = control_rx
            .try_iter()
            .collect::<Vec<_>>()
            .into_iter()
            .chain(window.poll_events());
        for event in events {
            if !state.apply(event) {
                quit = true;
            }
        }
        if quit {
            log::info!("quit requested");
            break;
        }

        let gesture_label =
            process_detections(&mut detector, config, &mut frame, &mut edge, &mut state);

        for (bounds, seg_window) in &mut segment_windows {
            let segmented = color::segment(&frame, bounds);
            if let Err(err) = seg_window.present(&segmented) {
                log::warn!("segmented window '{}' skipped: {err}", bounds.name);
            }
        }

        let shown = if state.paused {
            frame.clone()
        } else {
            let input = match &config.segment {
                Some(bounds) => color::segment(&frame, bounds),
                None => frame.clone(),
            };
            filters::apply(input, state.filter, &state.params())
        };

        let mut shown = shown.into_bgr();
        draw_status(&mut shown, &state, gesture_label);
        window.set_title(&title_for(&state));
        if let Err(err) = window.present(&shown) {
            log::warn!("window update skipped: {err}");
        }

        frame = match next_frame(&frame_rx) {
            Ok(next) => next,
            Err(err) => {
                log::info!("{err}, leaving the video loop");
                break;
            }
        };
    }

    Ok(())
}

/// Blocking read of the next frame; a closed channel means the capture
/// thread is gone (read failure or stop).
fn next_frame(frame_rx: &Receiver<Frame>) -> Result<Frame, CaptureError> {
    frame_rx.recv().map_err(|_| CaptureError::EndOfStream)
}

/// Detection side of one frame: boxes and skeletons drawn onto the frame,
/// gesture edges turned into control events. Detection failures are logged
/// and the frame passes through undetected.
fn process_detections(
    detector: &mut Option<Detector>,
    config: &Config,
    frame: &mut Frame,
    edge: &mut GestureEdge,
    state: &mut ControlState,
) -> GestureLabel {
    let Some(detector) = detector.as_mut() else {
        return GestureLabel::None;
    };

    match detector.detect_faces(frame) {
        Ok(faces) => overlay::draw_face_boxes(frame, &faces),
        Err(err) => log::warn!("face detection skipped: {err}"),
    }

    let hands = match detector.detect_hands(frame) {
        Ok(hands) => hands,
        Err(err) => {
            log::warn!("hand detection skipped: {err}");
            return GestureLabel::None;
        }
    };

    let mut label = GestureLabel::None;
    if let Some(hand) = hands.first() {
        label = gesture::classify(hand, &config.thresholds);
        if let Some(fired) = edge.update(label) {
            if let Some(event) = gesture_event(fired) {
                state.apply(event);
            }
        }
    } else {
        edge.update(GestureLabel::None);
    }

    for hand in &hands {
        overlay::draw_hand_skeleton(frame, hand);
    }

    label
}

fn open_segment_windows(
    config: &Config,
    width: u32,
    height: u32,
) -> Vec<(ColorBounds, VideoWindow)> {
    if !config.segment_windows {
        return Vec::new();
    }
    color::color_table()
        .iter()
        .filter_map(|bounds| match VideoWindow::open(bounds.name, width, height) {
            Ok(window) => Some((*bounds, window)),
            Err(err) => {
                log::warn!("could not open segmented window '{}': {err}", bounds.name);
                None
            }
        })
        .collect()
}

fn draw_status(frame: &mut Frame, state: &ControlState, gesture_label: GestureLabel) {
    let mut text = String::from(state.filter.display_name());
    if state.paused {
        text.push_str(" - paused");
    }
    if gesture_label != GestureLabel::None {
        text.push_str(" - ");
        text.push_str(gesture_label.label());
    }
    overlay::draw_label(
        frame,
        LABEL_MARGIN,
        LABEL_MARGIN,
        &text,
        overlay::LABEL_COLOR,
        LABEL_SCALE,
    );
}

fn title_for(state: &ControlState) -> String {
    if state.paused {
        format!("{WINDOW_TITLE} - {} (paused)", state.filter.display_name())
    } else {
        format!("{WINDOW_TITLE} - {}", state.filter.display_name())
    }
}
