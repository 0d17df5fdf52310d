//! Pipeline tests over synthetic frames: no camera, no windows, no models.

use camfx::color::{self, ColorBounds};
use camfx::control::{ControlEvent, ControlState, GestureEdge, gesture_event};
use camfx::filters::{self, FilterKind, FilterParams};
use camfx::types::{Frame, GestureLabel, PixelFormat};

/// A tiled frame of saturated colors, no black or white pixels.
fn mixed_frame(width: u32, height: u32) -> Frame {
    let palette: [[u8; 3]; 6] = [
        [0, 0, 255],
        [0, 255, 0],
        [255, 0, 0],
        [0, 255, 255],
        [255, 255, 0],
        [128, 64, 200],
    ];
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for i in 0..(width as usize * height as usize) {
        data.extend_from_slice(&palette[i % palette.len()]);
    }
    Frame::bgr(width, height, data)
}

#[test]
fn solid_red_frame_has_no_edges_and_blurs_to_itself() {
    let frame = Frame::solid(100, 100, [0, 0, 255]);

    let edges = filters::apply(frame.clone(), FilterKind::Edges, &FilterParams::default());
    assert_eq!(edges.format, PixelFormat::Gray);
    assert!(edges.data.iter().all(|&v| v == 0));

    let blurred = filters::apply(frame.clone(), FilterKind::Blur, &FilterParams::default());
    assert_eq!(blurred.data, frame.data);
}

#[test]
fn segment_then_filter_passes_matching_colors_through() {
    let red_bounds = color::color_bounds("red").unwrap();
    let frame = Frame::solid(50, 50, [0, 0, 255]);

    let segmented = color::segment(&frame, &red_bounds);
    assert_eq!(segmented.data, frame.data);

    let params = FilterParams {
        hue: 60,
        ..FilterParams::default()
    };
    let shifted = filters::apply(segmented, FilterKind::Hue, &params);
    for px in shifted.data.chunks_exact(3) {
        assert_eq!(px, [0, 255, 0]);
    }
}

#[test]
fn segmenting_out_everything_yields_black_not_an_error() {
    let red_bounds = color::color_bounds("red").unwrap();
    let frame = Frame::solid(50, 50, [255, 0, 0]);

    let segmented = color::segment(&frame, &red_bounds);
    assert!(segmented.data.iter().all(|&b| b == 0));

    // Black is still a valid pipeline input.
    let edges = filters::apply(segmented, FilterKind::Edges, &FilterParams::default());
    assert!(edges.data.iter().all(|&v| v == 0));
}

#[test]
fn hue_filter_sets_every_non_degenerate_pixel() {
    let frame = mixed_frame(30, 30);
    let params = FilterParams {
        hue: 45,
        ..FilterParams::default()
    };
    let out = filters::apply(frame, FilterKind::Hue, &params);
    for px in out.data.chunks_exact(3) {
        let hue = color::bgr_to_hsv([px[0], px[1], px[2]])[0] as i32;
        assert!((hue - 45).abs() <= 1, "pixel {px:?} read back hue {hue}");
    }
}

#[test]
fn saturation_identity_within_rounding() {
    let frame = mixed_frame(24, 24);
    let out = filters::apply(
        frame.clone(),
        FilterKind::Saturation,
        &FilterParams::default(),
    );
    for (a, b) in out.data.iter().zip(frame.data.iter()) {
        assert!((*a as i32 - *b as i32).abs() <= 6);
    }
}

#[test]
fn brighten_on_constant_frame_is_constant() {
    let frame = Frame::solid(100, 100, [90, 90, 90]);
    let params = FilterParams::default();
    let out = filters::apply(frame, FilterKind::Brighten, &params);
    // clamp(1.2 * 90 + 50) = 158
    assert!(out.data.iter().all(|&v| v == 158));
}

#[test]
fn keyboard_and_gui_events_mutate_state_identically() {
    // Keyboard: `h` twice = select hue + two 10-degree steps.
    let mut keyboard = ControlState::default();
    for event in [
        ControlEvent::Select(FilterKind::Hue),
        ControlEvent::StepHue,
        ControlEvent::Select(FilterKind::Hue),
        ControlEvent::StepHue,
    ] {
        keyboard.apply(event);
    }

    // GUI: dropdown to hue, slider straight to 20.
    let mut gui = ControlState::default();
    for event in [
        ControlEvent::Select(FilterKind::Hue),
        ControlEvent::SetHue(20),
    ] {
        gui.apply(event);
    }

    assert_eq!(keyboard.filter, gui.filter);
    assert_eq!(keyboard.hue, gui.hue);
    assert_eq!(keyboard.paused, gui.paused);
}

#[test]
fn change_filter_gesture_cycles_through_all_filters_and_back() {
    let mut state = ControlState::default();
    let mut edge = GestureEdge::new();
    let start = state.filter;

    for _ in 0..FilterKind::ALL.len() {
        // Hold, release, hold again: each hold fires exactly one cycle.
        if let Some(label) = edge.update(GestureLabel::ChangeFilter) {
            if let Some(event) = gesture_event(label) {
                state.apply(event);
            }
        }
        assert!(edge.update(GestureLabel::ChangeFilter).is_none());
        edge.update(GestureLabel::None);
    }

    assert_eq!(state.filter, start);
}

#[test]
fn pause_gesture_gates_filter_cycling() {
    let mut state = ControlState::default();
    state.apply(gesture_event(GestureLabel::PauseResume).unwrap());
    assert!(state.paused);

    let before = state.filter;
    state.apply(gesture_event(GestureLabel::ChangeFilter).unwrap());
    assert_eq!(state.filter, before);

    state.apply(gesture_event(GestureLabel::PauseResume).unwrap());
    assert!(!state.paused);
    state.apply(gesture_event(GestureLabel::ChangeFilter).unwrap());
    assert_ne!(state.filter, before);
}

#[test]
fn segmented_gray_output_stays_displayable() {
    // A gray edge frame expanded for overlay drawing keeps its dimensions.
    let frame = Frame::solid(20, 10, [0, 0, 255]);
    let edges = filters::apply(frame, FilterKind::Edges, &FilterParams::default());
    let bgr = edges.into_bgr();
    assert_eq!(bgr.format, PixelFormat::Bgr);
    assert_eq!(bgr.data.len(), 20 * 10 * 3);
}

#[test]
fn unknown_segment_color_is_absent_from_the_table() {
    assert!(color::color_bounds("magenta").is_none());
    let names: Vec<&str> = color::color_table().iter().map(|c| c.name).collect();
    assert_eq!(names, ["red", "green", "blue"]);
}

#[test]
fn segmentation_bounds_are_inclusive() {
    let bounds = ColorBounds {
        name: "exact",
        lower: [120, 255, 255],
        upper: [120, 255, 255],
    };
    // Pure blue sits exactly on both bounds.
    let frame = Frame::solid(4, 4, [255, 0, 0]);
    let out = color::segment(&frame, &bounds);
    assert_eq!(out.data, frame.data);
}
