//! Camera Capture Library for the Wellness Monitor
//!
//! Provides the frame stream the monitoring loop samples:
//! - `VideoFrame`: one decoded RGB frame with timestamp and sequence number
//! - `FrameSource`: acquire/release contract over a camera or file replay
//! - `ImageSequenceSource`: replays a directory of still images

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, ImageSequenceSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture timeout")]
    Timeout,

    #[error("Frame source not opened")]
    NotInitialized,

    #[error("End of frame stream")]
    EndOfStream,
}

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of still images replayed as frames
    pub directory: String,
    /// Restart from the first image once the sequence is exhausted
    pub looping: bool,
    /// Mirror frames horizontally (selfie view)
    pub mirror: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: "frames".to_string(),
            looping: true,
            mirror: true,
        }
    }
}
