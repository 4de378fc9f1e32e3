//! Eye-to-screen distance with a pinhole camera model

use crate::config::DistanceConfig;
use crate::landmarks::FaceLandmarks;

/// Spans narrower than this (pixels) are treated as degenerate
const MIN_SPAN_PX: f64 = 1.0;

/// Estimates viewer distance from the pixel span between the eyes.
///
/// `distance_cm = eye_span_cm * focal_length_px / span_px`
#[derive(Debug, Clone)]
pub struct EyeDistanceEstimator {
    config: DistanceConfig,
}

impl EyeDistanceEstimator {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    /// Distance in centimetres, `None` for a degenerate span
    pub fn estimate(&self, face: &FaceLandmarks) -> Option<f64> {
        self.estimate_from_span(face.anchor_span())
    }

    pub fn estimate_from_span(&self, span_px: f64) -> Option<f64> {
        if !span_px.is_finite() || span_px < MIN_SPAN_PX {
            return None;
        }
        Some(self.config.eye_span_cm * self.config.focal_length_px / span_px)
    }
}

impl Default for EyeDistanceEstimator {
    fn default() -> Self {
        Self::new(DistanceConfig::default())
    }
}
