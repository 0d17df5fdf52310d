//! Process configuration. The binary takes no arguments; everything is a
//! `CAMFX_*` environment variable with a default, read once at startup.

use std::env;
use std::str::FromStr;

use crate::color::{ColorBounds, color_bounds};
use crate::detect::DetectorConfig;
use crate::gesture::GestureThresholds;

#[derive(Clone, Debug)]
pub struct Config {
    /// CAMFX_CAMERA: capture device index.
    pub camera_index: u32,
    /// CAMFX_DETECT: run face/hand detection.
    pub detection: bool,
    /// CAMFX_SEGMENT: named color ("red", "green", "blue") to segment before
    /// filtering; unset means no segmentation.
    pub segment: Option<ColorBounds>,
    /// CAMFX_SEGMENT_WINDOWS: per-color segmented side windows.
    pub segment_windows: bool,
    pub thresholds: GestureThresholds,
    pub detector: DetectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            camera_index: 0,
            detection: true,
            segment: None,
            segment_windows: false,
            thresholds: GestureThresholds::default(),
            detector: DetectorConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let segment = match env::var("CAMFX_SEGMENT") {
            Ok(name) if !name.is_empty() => {
                let bounds = color_bounds(&name);
                if bounds.is_none() {
                    log::warn!("CAMFX_SEGMENT={name} is not a known color, ignoring");
                }
                bounds
            }
            _ => None,
        };

        let mut detector = defaults.detector;
        detector.min_detection_confidence = env_parse(
            "CAMFX_MIN_DETECTION_CONFIDENCE",
            detector.min_detection_confidence,
        );
        detector.min_tracking_confidence = env_parse(
            "CAMFX_MIN_TRACKING_CONFIDENCE",
            detector.min_tracking_confidence,
        );

        Config {
            camera_index: env_parse("CAMFX_CAMERA", defaults.camera_index),
            detection: env_parse("CAMFX_DETECT", defaults.detection),
            segment,
            segment_windows: env_parse("CAMFX_SEGMENT_WINDOWS", defaults.segment_windows),
            thresholds: GestureThresholds {
                pinch_x: env_parse("CAMFX_PINCH_X", defaults.thresholds.pinch_x),
            },
            detector,
        }
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("ignoring unparsable {key}={raw}");
                default
            }
        },
        Err(_) => default,
    }
}
