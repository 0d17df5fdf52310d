//! Control state owned by the video loop, mutated only through events.
//!
//! Every front end (keyboard, GUI controls, detected gestures) speaks
//! [`ControlEvent`]; identical logical events produce identical mutations
//! regardless of where they came from.

use crate::filters::{FilterKind, FilterParams};
use crate::types::GestureLabel;

pub const HUE_STEP: u8 = 10;
pub const SATURATION_STEP: f32 = 0.1;
pub const SATURATION_RANGE: (f32, f32) = (0.5, 2.0);
pub const BRIGHTNESS_RANGE: (f32, f32) = (0.5, 2.0);

/// A discrete external input. Transitions fire only on these, never on a
/// timer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    /// Dropdown selection / filter hotkey.
    Select(FilterKind),
    /// Advance to the next filter, wrapping. Ignored while paused.
    Cycle,
    /// Keyboard `h`: +10 hue, wrapping mod 180.
    StepHue,
    /// Hue slider, [0,180).
    SetHue(u8),
    /// Keyboard `s`: +0.1 saturation, clamped.
    StepSaturation,
    /// Saturation slider, [0.5,2.0].
    SetSaturation(f32),
    /// Brightness slider, [0.5,2.0].
    SetBrightness(f32),
    /// Pause/Resume button or gesture.
    TogglePause,
    /// Start button.
    SetPaused(bool),
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub struct ControlState {
    pub filter: FilterKind,
    pub hue: u8,
    pub saturation: f32,
    pub brightness: f32,
    pub paused: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState {
            filter: FilterKind::None,
            hue: 0,
            saturation: 1.0,
            brightness: 1.2,
            paused: false,
        }
    }
}

impl ControlState {
    /// Apply one event. Returns false for `Quit`, which the loop handles;
    /// every other event mutates in place and returns true.
    pub fn apply(&mut self, event: ControlEvent) -> bool {
        match event {
            ControlEvent::Select(kind) => self.filter = kind,
            ControlEvent::Cycle => {
                if !self.paused {
                    self.filter = self.filter.next();
                }
            }
            ControlEvent::StepHue => self.hue = (self.hue + HUE_STEP) % 180,
            ControlEvent::SetHue(hue) => self.hue = hue % 180,
            ControlEvent::StepSaturation => {
                self.saturation =
                    (self.saturation + SATURATION_STEP).clamp(SATURATION_RANGE.0, SATURATION_RANGE.1)
            }
            ControlEvent::SetSaturation(s) => {
                self.saturation = s.clamp(SATURATION_RANGE.0, SATURATION_RANGE.1)
            }
            ControlEvent::SetBrightness(b) => {
                self.brightness = b.clamp(BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1)
            }
            ControlEvent::TogglePause => self.paused = !self.paused,
            ControlEvent::SetPaused(paused) => self.paused = paused,
            ControlEvent::Quit => return false,
        }
        true
    }

    pub fn params(&self) -> FilterParams {
        FilterParams {
            hue: self.hue,
            saturation: self.saturation,
            brightness: self.brightness,
        }
    }
}

/// Maps a gesture to its state effect. ThumbsUp is reserved and has none.
pub fn gesture_event(label: GestureLabel) -> Option<ControlEvent> {
    match label {
        GestureLabel::ChangeFilter => Some(ControlEvent::Cycle),
        GestureLabel::PauseResume => Some(ControlEvent::TogglePause),
        GestureLabel::ThumbsUp | GestureLabel::None => None,
    }
}

/// Turns per-frame gesture levels into edges: an event fires only on the
/// frame a non-None label first appears, not while it is held.
#[derive(Debug, Default)]
pub struct GestureEdge {
    last: Option<GestureLabel>,
}

impl GestureEdge {
    pub fn new() -> Self {
        GestureEdge { last: None }
    }

    pub fn update(&mut self, label: GestureLabel) -> Option<GestureLabel> {
        let fired = match label {
            GestureLabel::None => None,
            _ if self.last == Some(label) => None,
            _ => Some(label),
        };
        self.last = Some(label);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_filter_and_wraps() {
        let mut state = ControlState::default();
        let start = state.filter;
        let mut seen = Vec::new();
        for _ in 0..FilterKind::ALL.len() {
            state.apply(ControlEvent::Cycle);
            seen.push(state.filter);
        }
        assert_eq!(state.filter, start);
        for kind in FilterKind::ALL {
            assert!(seen.contains(&kind));
        }
    }

    #[test]
    fn cycle_is_ignored_while_paused() {
        let mut state = ControlState::default();
        state.apply(ControlEvent::TogglePause);
        state.apply(ControlEvent::Cycle);
        assert_eq!(state.filter, FilterKind::None);
    }

    #[test]
    fn pause_toggle_restores_in_pairs() {
        let mut state = ControlState::default();
        for _ in 0..2 {
            state.apply(ControlEvent::TogglePause);
        }
        assert!(!state.paused);
    }

    #[test]
    fn hue_wraps_mod_180() {
        let mut state = ControlState::default();
        for _ in 0..18 {
            state.apply(ControlEvent::StepHue);
        }
        assert_eq!(state.hue, 0);
        state.apply(ControlEvent::SetHue(185));
        assert_eq!(state.hue, 5);
    }

    #[test]
    fn saturation_steps_clamp_at_two() {
        let mut state = ControlState::default();
        for _ in 0..30 {
            state.apply(ControlEvent::StepSaturation);
        }
        assert!((state.saturation - 2.0).abs() < 1e-6);
    }

    #[test]
    fn sliders_clamp_to_their_ranges() {
        let mut state = ControlState::default();
        state.apply(ControlEvent::SetSaturation(9.0));
        assert_eq!(state.saturation, 2.0);
        state.apply(ControlEvent::SetBrightness(0.1));
        assert_eq!(state.brightness, 0.5);
    }

    #[test]
    fn quit_reports_without_mutating() {
        let mut state = ControlState::default();
        assert!(!state.apply(ControlEvent::Quit));
        assert_eq!(state.filter, FilterKind::None);
        assert!(!state.paused);
    }

    #[test]
    fn gesture_edge_fires_once_per_hold() {
        let mut edge = GestureEdge::new();
        assert_eq!(
            edge.update(GestureLabel::ChangeFilter),
            Some(GestureLabel::ChangeFilter)
        );
        assert_eq!(edge.update(GestureLabel::ChangeFilter), None);
        assert_eq!(edge.update(GestureLabel::None), None);
        assert_eq!(
            edge.update(GestureLabel::ChangeFilter),
            Some(GestureLabel::ChangeFilter)
        );
    }

    #[test]
    fn gesture_events_match_buttons() {
        assert_eq!(
            gesture_event(GestureLabel::ChangeFilter),
            Some(ControlEvent::Cycle)
        );
        assert_eq!(
            gesture_event(GestureLabel::PauseResume),
            Some(ControlEvent::TogglePause)
        );
        assert_eq!(gesture_event(GestureLabel::ThumbsUp), None);
    }
}
