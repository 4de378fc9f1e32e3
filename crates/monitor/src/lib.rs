//! Desk Wellness Monitor
//!
//! Samples a frame stream at a fixed cadence and keeps the current signals
//! (blink rate, sitting time, eye distance, posture, emotion, lighting) up to
//! date. Cheap geometry runs every tick; expensive detectors run on their own
//! cadences. Notifications and signal snapshots go to a display sink.

mod config;
mod logging;
mod monitoring;
mod sink;

pub use config::{CadenceConfig, InspectionMode, LogFormat, LoggingConfig, MonitorConfig, ENV_PREFIX};
pub use logging::init_logging;
pub use monitoring::{MonitorBuilder, MonitorStats, MonitoringLoop, TickOutcome};
pub use sink::{DisplaySink, LogSink};

use camera_capture::CameraError;
use thiserror::Error;
use vision::VisionError;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame source error: {0}")]
    Source(#[from] CameraError),

    #[error("Detector setup failed: {0}")]
    Vision(#[from] VisionError),

    #[error("No frame source configured")]
    MissingSource,

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
