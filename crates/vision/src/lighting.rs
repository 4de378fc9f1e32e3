//! Ambient lighting classification

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean luma below this is dark
pub const DARK_THRESHOLD: f64 = 50.0;

/// Mean luma below this (and not dark) is dim
pub const DIM_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lighting {
    Dark,
    Dim,
    Bright,
}

impl Lighting {
    pub fn classify(mean_luma: f64) -> Self {
        if mean_luma < DARK_THRESHOLD {
            Lighting::Dark
        } else if mean_luma < DIM_THRESHOLD {
            Lighting::Dim
        } else {
            Lighting::Bright
        }
    }

    /// `None` for an empty or malformed frame
    pub fn from_frame(frame: &VideoFrame) -> Option<Self> {
        if !frame.is_well_formed() {
            return None;
        }
        Some(Self::classify(frame.mean_luma() as f64))
    }
}

impl fmt::Display for Lighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lighting::Dark => f.write_str("dark"),
            Lighting::Dim => f.write_str("dim"),
            Lighting::Bright => f.write_str("bright"),
        }
    }
}
