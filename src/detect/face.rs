//! Single-shot face detector: 128×128 letterboxed input, 896 anchors,
//! 16 features per anchor (box + 6 keypoints, unused here).

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::DetectError;
use crate::types::{FaceBox, Frame};

use super::anchors::{SSD_LAYOUT, generate_anchors};
use super::prep::letterbox_frame;
use super::{DetectorConfig, decode_proposals, load_session, nms};

const INPUT_SIZE: u32 = 128;
const NUM_KEYPOINTS: usize = 6;
const TOP_K: usize = 16;

pub struct FaceDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: DetectorConfig,
}

impl FaceDetector {
    pub(crate) fn load(path: &Path, cfg: DetectorConfig) -> Result<Self, DetectError> {
        Ok(FaceDetector {
            session: load_session(path)?,
            anchors: generate_anchors(INPUT_SIZE, SSD_LAYOUT),
            cfg,
        })
    }

    /// Boxes for every detected face, in frame pixels. Drawing them is the
    /// caller's business.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>> {
        let (input, letterbox) = letterbox_frame(frame, INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run face detector session")?;
        if outputs.len() < 2 {
            return Err(anyhow!(
                "face detector returned {} outputs, expected at least 2",
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
                .ok_or_else(|| anyhow!("face boxes not contiguous"))?,
            &box_shape,
            scores
                .as_slice()
                .ok_or_else(|| anyhow!("face scores not contiguous"))?,
            &score_shape,
            &self.anchors,
            INPUT_SIZE,
            NUM_KEYPOINTS,
            &letterbox,
            self.cfg.min_detection_confidence,
        )?;

        let kept = nms(proposals, self.cfg.nms_threshold, TOP_K);
        Ok(kept
            .into_iter()
            .map(|p| FaceBox {
                x: p.bbox[0],
                y: p.bbox[1],
                w: p.bbox[2] - p.bbox[0],
                h: p.bbox[3] - p.bbox[1],
                score: p.score,
            })
            .collect())
    }
}
