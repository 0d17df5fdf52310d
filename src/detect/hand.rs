//! Two-stage hand tracking: the palm detector proposes regions on the
//! 192×192 letterboxed frame, then a rotated square crop around each
//! proposal feeds the 224×224 landmark model.

use std::f32::consts::PI;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::DetectError;
use crate::types::{Frame, HandLandmarks, NUM_LANDMARKS};

use super::anchors::{SSD_LAYOUT, generate_anchors};
use super::prep::{decode_landmarks, letterbox_frame, rotated_crop};
use super::{DetectorConfig, Proposal, decode_proposals, load_session, nms};

const PALM_INPUT_SIZE: u32 = 192;
const LANDMARK_INPUT_SIZE: u32 = 224;
/// Wrist center and middle-finger base in the palm keypoint set.
const KP_WRIST: usize = 0;
const KP_MIDDLE: usize = 2;
const NUM_PALM_KEYPOINTS: usize = 7;
/// Crop expansion around a proposal so fingers are not cut away.
const CROP_EXPANSION: f32 = 2.4;
const MIN_CROP_SIDE: f32 = 80.0;

pub struct HandTracker {
    palm: Session,
    landmarks: Session,
    anchors: Vec<[f32; 2]>,
    cfg: DetectorConfig,
}

impl HandTracker {
    pub(crate) fn load(
        palm_path: &Path,
        landmark_path: &Path,
        cfg: DetectorConfig,
    ) -> Result<Self, DetectError> {
        Ok(HandTracker {
            palm: load_session(palm_path)?,
            landmarks: load_session(landmark_path)?,
            anchors: generate_anchors(PALM_INPUT_SIZE, SSD_LAYOUT),
            cfg,
        })
    }

    /// Landmark sets for zero or more hands, normalized to [0,1] frame
    /// coordinates.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>> {
        let proposals = self.propose_palms(frame)?;

        let mut hands = Vec::new();
        for proposal in proposals.into_iter().take(self.cfg.max_hands) {
            if let Some(hand) = self.estimate_landmarks(frame, &proposal)? {
                hands.push(hand);
            }
        }
        Ok(hands)
    }

    fn propose_palms(&mut self, frame: &Frame) -> Result<Vec<Proposal>> {
        let (input, letterbox) = letterbox_frame(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .palm
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let box_shape = boxes.shape().to_vec();
        let score_shape = scores.shape().to_vec();

        let proposals = decode_proposals(
            boxes
                .as_slice()
                .ok_or_else(|| anyhow!("palm boxes not contiguous"))?,
            &box_shape,
            scores
                .as_slice()
                .ok_or_else(|| anyhow!("palm scores not contiguous"))?,
            &score_shape,
            &self.anchors,
            PALM_INPUT_SIZE,
            NUM_PALM_KEYPOINTS,
            &letterbox,
            self.cfg.min_detection_confidence,
        )?;

        Ok(nms(proposals, self.cfg.nms_threshold, self.cfg.max_hands * 2))
    }

    fn estimate_landmarks(
        &mut self,
        frame: &Frame,
        proposal: &Proposal,
    ) -> Result<Option<HandLandmarks>> {
        let (center, side, angle) = crop_params(proposal);
        let (input, transform) = rotated_crop(frame, center, side, angle, LANDMARK_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .landmarks
            .run(ort::inputs![tensor])
            .context("failed to run hand landmark session")?;
        if outputs.len() == 0 {
            return Err(anyhow!("hand landmark model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let raw = decode_landmarks(&flattened)?;

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
                .clamp(0.0, 1.0)
        } else {
            0.0
        };
        if confidence < self.cfg.min_tracking_confidence {
            return Ok(None);
        }
        let handedness = if outputs.len() > 2 {
            outputs[2]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let mut points = [(0.0f32, 0.0f32); NUM_LANDMARKS];
        for (slot, [x, y, _z]) in points.iter_mut().zip(raw.iter()) {
            let (px, py) = transform.project(*x, *y);
            *slot = (
                px / frame.width.max(1) as f32,
                py / frame.height.max(1) as f32,
            );
        }

        Ok(Some(HandLandmarks {
            points,
            confidence,
            handedness,
        }))
    }
}

/// Square crop around a palm proposal: centered on its keypoints, expanded
/// so the fingers fit, rotated so the palm faces up.
fn crop_params(proposal: &Proposal) -> ((f32, f32), f32, f32) {
    let center = if proposal.keypoints.is_empty() {
        (
            (proposal.bbox[0] + proposal.bbox[2]) * 0.5,
            (proposal.bbox[1] + proposal.bbox[3]) * 0.5,
        )
    } else {
        let (sum_x, sum_y) = proposal
            .keypoints
            .iter()
            .fold((0.0f32, 0.0f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (
            sum_x / proposal.keypoints.len() as f32,
            sum_y / proposal.keypoints.len() as f32,
        )
    };

    let box_w = (proposal.bbox[2] - proposal.bbox[0]).abs();
    let box_h = (proposal.bbox[3] - proposal.bbox[1]).abs();
    let kp_span = keypoint_span(&proposal.keypoints);
    let side = box_w.max(box_h).max(kp_span).max(MIN_CROP_SIDE) * CROP_EXPANSION;

    (center, side, orientation(proposal))
}

fn keypoint_span(points: &[(f32, f32)]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let (min_x, max_x, min_y, max_y) = points
        .iter()
        .fold((f32::MAX, f32::MIN, f32::MAX, f32::MIN), |acc, (x, y)| {
            (acc.0.min(*x), acc.1.max(*x), acc.2.min(*y), acc.3.max(*y))
        });
    (max_x - min_x).max(max_y - min_y)
}

/// Rotation from the wrist-to-middle-finger direction.
fn orientation(proposal: &Proposal) -> f32 {
    let (Some(&(wx, wy)), Some(&(mx, my))) = (
        proposal.keypoints.get(KP_WRIST),
        proposal.keypoints.get(KP_MIDDLE),
    ) else {
        return 0.0;
    };
    let dx = mx - wx;
    let dy = my - wy;
    if dx.abs() < 1e-6 && dy.abs() < 1e-6 {
        return 0.0;
    }
    dy.atan2(dx) + PI * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(bbox: [f32; 4], keypoints: Vec<(f32, f32)>) -> Proposal {
        Proposal {
            bbox,
            keypoints,
            score: 0.9,
        }
    }

    #[test]
    fn crop_centers_on_keypoints_and_expands() {
        let p = proposal(
            [90.0, 90.0, 110.0, 110.0],
            vec![(100.0, 110.0), (100.0, 100.0), (100.0, 90.0)],
        );
        let (center, side, _angle) = crop_params(&p);
        assert_eq!(center, (100.0, 100.0));
        // 20px box and span beaten by the 80px floor, times the expansion.
        assert_eq!(side, MIN_CROP_SIDE * CROP_EXPANSION);
    }

    #[test]
    fn crop_falls_back_to_box_center_without_keypoints() {
        let p = proposal([0.0, 0.0, 40.0, 20.0], Vec::new());
        let (center, _side, angle) = crop_params(&p);
        assert_eq!(center, (20.0, 10.0));
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn upright_hand_needs_no_rotation_beyond_convention() {
        // Middle-finger base straight above the wrist: direction is -y,
        // atan2 gives -π/2, convention offset brings it to 0.
        let p = proposal(
            [0.0, 0.0, 10.0, 10.0],
            vec![(5.0, 9.0), (5.0, 8.0), (5.0, 1.0)],
        );
        let angle = orientation(&p);
        assert!(angle.abs() < 1e-6);
    }
}
