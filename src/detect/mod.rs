//! Face and hand detection behind one adapter. Models load once at startup
//! (`ModelLoad` failures are fatal there); per-frame failures surface as
//! `Inference` errors the video loop logs and skips.

mod anchors;
mod face;
mod hand;
mod prep;

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};

use crate::error::DetectError;
use crate::models::ModelPaths;
use crate::types::{FaceBox, Frame, HandLandmarks};

pub use face::FaceDetector;
pub use hand::HandTracker;
pub use prep::Letterbox;

#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    /// Score floor for face boxes and palm proposals.
    pub min_detection_confidence: f32,
    /// Landmark-confidence floor below which a hand is dropped. The
    /// landmark model is single-shot, so this is the closest analogue of a
    /// tracking confidence.
    pub min_tracking_confidence: f32,
    pub nms_threshold: f32,
    pub max_hands: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.7,
            nms_threshold: 0.3,
            max_hands: 2,
        }
    }
}

/// Owns every detection model for the session.
pub struct Detector {
    faces: FaceDetector,
    hands: HandTracker,
}

impl Detector {
    /// Load all models. Called once at startup; any missing or unparsable
    /// model file fails here, never per frame.
    pub fn open(paths: &ModelPaths, cfg: DetectorConfig) -> Result<Self, DetectError> {
        let faces = FaceDetector::load(&paths.face, cfg)?;
        let hands = HandTracker::load(&paths.palm, &paths.hand_landmarks, cfg)?;
        Ok(Detector { faces, hands })
    }

    pub fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, DetectError> {
        Ok(self.faces.detect(frame)?)
    }

    pub fn detect_hands(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>, DetectError> {
        Ok(self.hands.detect(frame)?)
    }
}

pub(crate) fn load_session(path: &Path) -> Result<Session, DetectError> {
    let build = || -> Result<Session, ort::Error> {
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(path)
    };
    build().map_err(|err| DetectError::ModelLoad {
        path: path.to_path_buf(),
        source: err.into(),
    })
}

/// One decoded detector candidate, in frame pixel coordinates.
#[derive(Clone, Debug)]
pub(crate) struct Proposal {
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

/// Decode the `[1, anchors, 4 + 2·kp]` box tensor and `[1, anchors, 1]`
/// score tensor of a MediaPipe-style single-shot detector into frame-space
/// proposals.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decode_proposals(
    raw_boxes: &[f32],
    box_shape: &[usize],
    raw_scores: &[f32],
    score_shape: &[usize],
    anchors: &[[f32; 2]],
    input_size: u32,
    num_keypoints: usize,
    letterbox: &Letterbox,
    score_threshold: f32,
) -> Result<Vec<Proposal>> {
    if box_shape.len() < 3 || score_shape.len() < 3 {
        return Err(anyhow!(
            "unexpected detector output shapes: boxes {box_shape:?}, scores {score_shape:?}"
        ));
    }

    let anchor_dim = box_shape[box_shape.len() - 2];
    let feature_dim = box_shape[box_shape.len() - 1];
    let score_anchor_dim = score_shape[score_shape.len() - 2];
    let score_feature_dim = score_shape[score_shape.len() - 1];

    if feature_dim < 4 + num_keypoints * 2 {
        return Err(anyhow!("detector feature dimension too small: {feature_dim}"));
    }
    if anchor_dim != score_anchor_dim {
        return Err(anyhow!(
            "anchor dimension mismatch between boxes ({anchor_dim}) and scores ({score_anchor_dim})"
        ));
    }

    let input = input_size as f32;
    let count = anchors.len().min(anchor_dim);
    let mut proposals = Vec::new();

    for idx in 0..count {
        let raw_score = *raw_scores
            .get(idx * score_feature_dim)
            .ok_or_else(|| anyhow!("missing score for anchor {idx}"))?;
        let score = sigmoid(raw_score);
        if score < score_threshold {
            continue;
        }

        let features = raw_boxes
            .get(idx * feature_dim..(idx + 1) * feature_dim)
            .ok_or_else(|| anyhow!("missing box features for anchor {idx}"))?;
        let anchor = anchors[idx];

        let cx = features[0] + anchor[0] * input;
        let cy = features[1] + anchor[1] * input;
        let hw = features[2] / 2.0;
        let hh = features[3] / 2.0;

        if hw <= 0.0 || hh <= 0.0 {
            continue;
        }

        let (x1, y1) = letterbox.project(cx - hw, cy - hh);
        let (x2, y2) = letterbox.project(cx + hw, cy + hh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let keypoints = (0..num_keypoints)
            .map(|k| {
                let kx = features[4 + k * 2] + anchor[0] * input;
                let ky = features[4 + k * 2 + 1] + anchor[1] * input;
                letterbox.project(kx, ky)
            })
            .collect();

        proposals.push(Proposal {
            bbox: [x1, y1, x2, y2],
            keypoints,
            score,
        });
    }

    Ok(proposals)
}

/// Greedy NMS over score-sorted proposals.
pub(crate) fn nms(mut proposals: Vec<Proposal>, threshold: f32, top_k: usize) -> Vec<Proposal> {
    proposals.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut keep: Vec<Proposal> = Vec::new();
    'outer: for candidate in proposals {
        for kept in &keep {
            if iou(&candidate.bbox, &kept.bbox) >= threshold {
                continue 'outer;
            }
        }
        keep.push(candidate);
        if keep.len() >= top_k {
            break;
        }
    }
    keep
}

pub(crate) fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter <= 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(bbox: [f32; 4], score: f32) -> Proposal {
        Proposal {
            bbox,
            keypoints: Vec::new(),
            score,
        }
    }

    #[test]
    fn nms_keeps_highest_scoring_of_overlapping_pair() {
        let kept = nms(
            vec![
                proposal([0.0, 0.0, 10.0, 10.0], 0.6),
                proposal([1.0, 1.0, 11.0, 11.0], 0.9),
                proposal([100.0, 100.0, 110.0, 110.0], 0.5),
            ],
            0.3,
            10,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].bbox, [100.0, 100.0, 110.0, 110.0]);
    }

    #[test]
    fn nms_respects_top_k() {
        let kept = nms(
            vec![
                proposal([0.0, 0.0, 10.0, 10.0], 0.6),
                proposal([50.0, 50.0, 60.0, 60.0], 0.9),
                proposal([100.0, 100.0, 110.0, 110.0], 0.5),
            ],
            0.3,
            1,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(
            iou(&[0.0, 0.0, 1.0, 1.0], &[2.0, 2.0, 3.0, 3.0]),
            0.0
        );
    }

    #[test]
    fn sigmoid_midpoint() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }
}
