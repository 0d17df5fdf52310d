//! Rule-based gesture classification over one set of hand landmarks.
//!
//! The rules compare thumb and index fingertip positions in normalized
//! image coordinates (y grows downward). Thresholds are empirical and kept
//! as data so a deployment can retune them for hand size or camera distance.

use crate::types::{GestureLabel, HandLandmarks};

/// Tunable decision thresholds.
#[derive(Clone, Copy, Debug)]
pub struct GestureThresholds {
    /// Maximum horizontal thumb-to-index distance that reads as a pinch.
    pub pinch_x: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds { pinch_x: 0.03 }
    }
}

/// Classify one hand. Rules evaluate in order; first match wins.
pub fn classify(hand: &HandLandmarks, thresholds: &GestureThresholds) -> GestureLabel {
    let (thumb_x, thumb_y) = hand.thumb_tip();
    let (index_x, index_y) = hand.index_tip();

    if (thumb_x - index_x).abs() < thresholds.pinch_x {
        GestureLabel::ThumbsUp
    } else if thumb_y < index_y {
        GestureLabel::ChangeFilter
    } else if thumb_y > index_y {
        GestureLabel::PauseResume
    } else {
        GestureLabel::None
    }
}

/// True when every fingertip sits above its PIP joint, a fully extended
/// open hand. Extra predicate; nothing downstream keys off it yet.
pub fn is_open_hand(hand: &HandLandmarks) -> bool {
    hand.finger_pairs()
        .iter()
        .all(|&((_, tip_y), (_, joint_y))| tip_y < joint_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NUM_LANDMARKS, landmark};

    fn hand_with(thumb: (f32, f32), index: (f32, f32)) -> HandLandmarks {
        let mut points = [(0.5, 0.5); NUM_LANDMARKS];
        points[landmark::THUMB_TIP] = thumb;
        points[landmark::INDEX_TIP] = index;
        HandLandmarks {
            points,
            confidence: 1.0,
            handedness: 1.0,
        }
    }

    #[test]
    fn pinch_reads_as_thumbs_up() {
        let hand = hand_with((0.50, 0.40), (0.52, 0.60));
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::ThumbsUp
        );
    }

    #[test]
    fn pinch_rule_beats_y_comparison() {
        // Thumb above index AND horizontally close: rule 1 wins.
        let hand = hand_with((0.50, 0.20), (0.51, 0.80));
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::ThumbsUp
        );
    }

    #[test]
    fn thumb_above_index_changes_filter() {
        let hand = hand_with((0.30, 0.20), (0.60, 0.60));
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::ChangeFilter
        );
    }

    #[test]
    fn thumb_below_index_pauses() {
        let hand = hand_with((0.30, 0.80), (0.60, 0.40));
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::PauseResume
        );
    }

    #[test]
    fn equal_heights_read_as_none() {
        let hand = hand_with((0.30, 0.50), (0.60, 0.50));
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::None
        );
    }

    #[test]
    fn thresholds_are_data() {
        let hand = hand_with((0.30, 0.40), (0.45, 0.60));
        let wide = GestureThresholds { pinch_x: 0.2 };
        assert_eq!(classify(&hand, &wide), GestureLabel::ThumbsUp);
        assert_eq!(
            classify(&hand, &GestureThresholds::default()),
            GestureLabel::ChangeFilter
        );
    }

    #[test]
    fn open_hand_requires_all_five_fingers() {
        let mut points = [(0.5, 0.8); NUM_LANDMARKS];
        for (tip, joint) in [
            (landmark::THUMB_TIP, landmark::THUMB_IP),
            (landmark::INDEX_TIP, landmark::INDEX_PIP),
            (landmark::MIDDLE_TIP, landmark::MIDDLE_PIP),
            (landmark::RING_TIP, landmark::RING_PIP),
            (landmark::PINKY_TIP, landmark::PINKY_PIP),
        ] {
            points[tip] = (0.5, 0.2);
            points[joint] = (0.5, 0.4);
        }
        let hand = HandLandmarks {
            points,
            confidence: 1.0,
            handedness: 0.0,
        };
        assert!(is_open_hand(&hand));

        let mut folded = hand.clone();
        folded.points[landmark::PINKY_TIP] = (0.5, 0.6);
        assert!(!is_open_hand(&folded));
    }
}
