//! Vision Building Blocks for the Wellness Monitor
//!
//! Per-frame geometry and detector adapters:
//! - Face-mesh eye landmarks and eye aspect ratio (blinks)
//! - Pinhole eye-to-screen distance
//! - Ambient lighting classification
//! - Posture verdicts from a remote vision-language model
//! - Emotion classification with a local ONNX model

pub mod config;
pub mod detector;
pub mod distance;
pub mod ear;
pub mod emotion;
pub mod labels;
pub mod landmarks;
pub mod lighting;
pub mod posture;

pub use config::{DistanceConfig, EmotionConfig, PostureConfig};
pub use detector::{FaceLandmarker, NoFaceLandmarker, PresenceDetector};
pub use distance::EyeDistanceEstimator;
pub use ear::{eye_aspect_ratio, EyeClosureEstimator};
pub use emotion::OnnxEmotionClassifier;
pub use labels::{Emotion, Mood, PostureLabel};
pub use landmarks::{EyeLandmarks, FaceLandmarks, Point};
pub use lighting::Lighting;
pub use posture::GeminiPostureClassifier;

use thiserror::Error;

/// Vision error types
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}
