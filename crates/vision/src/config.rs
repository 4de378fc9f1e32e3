//! Vision configuration

use serde::{Deserialize, Serialize};

/// Remote posture classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// API credential; the posture probe is disabled when unset
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Vision-language model name
    pub model: String,

    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// JPEG quality of the uploaded frame (1-100)
    pub jpeg_quality: u8,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            request_timeout_ms: 5000,
            jpeg_quality: 80,
        }
    }
}

impl PostureConfig {
    /// Whether a credential has been supplied
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.trim().is_empty()).unwrap_or(false)
    }
}

/// Local emotion classifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Path to a FER+-style ONNX model; the emotion probe is disabled when unset
    pub model_path: Option<String>,
}

/// Pinhole eye-distance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Real-world distance between the two eye anchor points (cm)
    pub eye_span_cm: f64,

    /// Camera focal length (pixels)
    pub focal_length_px: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            eye_span_cm: 6.3,
            focal_length_px: 820.0,
        }
    }
}
