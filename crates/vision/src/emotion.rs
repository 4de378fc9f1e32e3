//! Local emotion classification
//!
//! Runs a FER+-style ONNX model (64x64 grayscale input, 8 scores) with
//! tract. Inference happens on the blocking pool so the caller's runtime
//! is never stalled.

use crate::config::EmotionConfig;
use crate::labels::Emotion;
use crate::VisionError;
use async_trait::async_trait;
use camera_capture::VideoFrame;
use image::imageops::{self, FilterType};
use image::GrayImage;
use inspector::{Probe, ProbeError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Model input side length
pub const INPUT_SIZE: u32 = 64;

type EmotionPlan = TypedRunnableModel<TypedModel>;

/// Emotion probe backed by an ONNX model
pub struct OnnxEmotionClassifier {
    model: Arc<EmotionPlan>,
}

impl OnnxEmotionClassifier {
    /// Load and optimise the model
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let path = path.as_ref();
        info!("Loading emotion model from {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, f32::fact([1, 1, INPUT_SIZE as usize, INPUT_SIZE as usize]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| VisionError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        Ok(Self { model: Arc::new(model) })
    }

    /// Load the configured model; `Ok(None)` when no model is configured
    pub fn from_config(config: &EmotionConfig) -> Result<Option<Self>, VisionError> {
        match config.model_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Self::load(path).map(Some),
            _ => Ok(None),
        }
    }
}

/// Centre-square crop, grayscale, resize to the model input.
///
/// Pixel values stay in 0..255 as FER+ expects.
pub fn preprocess(frame: &VideoFrame) -> Result<Vec<f32>, ProbeError> {
    if !frame.is_well_formed() {
        return Err(ProbeError::Frame("buffer does not match dimensions".into()));
    }

    let side = frame.width.min(frame.height);
    let x = (frame.width - side) / 2;
    let y = (frame.height - side) / 2;
    let square = frame
        .crop(x, y, side, side)
        .ok_or_else(|| ProbeError::Frame("centre crop out of bounds".into()))?;

    let gray = GrayImage::from_raw(side, side, square.to_grayscale())
        .ok_or_else(|| ProbeError::Frame("grayscale conversion failed".into()))?;
    let resized = imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    Ok(resized.into_raw().into_iter().map(f32::from).collect())
}

/// Highest-scoring emotion; `None` for empty or non-finite scores
pub fn top_emotion(scores: &[f32]) -> Option<Emotion> {
    let (index, _) = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    Emotion::from_index(index)
}

fn run_model(model: &EmotionPlan, pixels: Vec<f32>) -> Result<Vec<f32>, ProbeError> {
    let side = INPUT_SIZE as usize;
    let input: Tensor = tract_ndarray::Array4::from_shape_vec((1, 1, side, side), pixels)
        .map_err(|e| ProbeError::Model(e.to_string()))?
        .into();
    let outputs = model
        .run(tvec!(input.into()))
        .map_err(|e| ProbeError::Model(e.to_string()))?;
    let scores = outputs
        .first()
        .ok_or_else(|| ProbeError::Model("model produced no output".into()))?
        .to_array_view::<f32>()
        .map_err(|e| ProbeError::Model(e.to_string()))?
        .iter()
        .copied()
        .collect();
    Ok(scores)
}

#[async_trait]
impl Probe for OnnxEmotionClassifier {
    type Output = Emotion;

    fn name(&self) -> &'static str {
        "emotion"
    }

    async fn probe(&self, frame: &VideoFrame) -> Result<Option<Emotion>, ProbeError> {
        let pixels = preprocess(frame)?;
        let model = Arc::clone(&self.model);

        let scores = tokio::task::spawn_blocking(move || run_model(&model, pixels))
            .await
            .map_err(|e| ProbeError::Model(format!("inference task: {}", e)))??;

        let emotion = top_emotion(&scores)
            .ok_or_else(|| ProbeError::InvalidResponse(format!("unexpected scores: {:?}", scores)))?;
        debug!(%emotion, "Emotion classified");
        Ok(Some(emotion))
    }
}
