//! Periodic Inspections for Expensive Detectors
//!
//! Wraps low-frequency, possibly slow or failing checks (remote posture
//! classification, local emotion models) behind a wall-clock cadence and a
//! timeout. Failures never escape: they degrade the reading to
//! [`Reading::Unavailable`] and the caller keeps going.

mod cadence;
mod scheduler;

pub use cadence::{duration_from_secs, Cadence};
pub use scheduler::{PendingInspection, PeriodicInspector};

use async_trait::async_trait;
use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors a probe may report
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("Inspection timed out after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unusable frame: {0}")]
    Frame(String),
}

/// An expensive check run against a single frame.
///
/// `Ok(None)` means the check ran but had nothing to measure (e.g. no face in
/// view).
#[async_trait]
pub trait Probe: Send + Sync {
    type Output: Send + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Run the check
    async fn probe(&self, frame: &VideoFrame) -> Result<Option<Self::Output>, ProbeError>;
}

/// Latest known value of a monitored quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    /// Never measured, or nothing to measure
    Unknown,
    /// The detector failed or timed out
    Unavailable,
    /// A fresh measurement
    Value(T),
}

impl<T> Default for Reading<T> {
    fn default() -> Self {
        Reading::Unknown
    }
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Reading::Unavailable)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Unknown => Reading::Unknown,
            Reading::Unavailable => Reading::Unavailable,
            Reading::Value(v) => Reading::Value(f(v)),
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Unknown => f.write_str("unknown"),
            Reading::Unavailable => f.write_str("error"),
            Reading::Value(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::<u32>::Unknown.to_string(), "unknown");
        assert_eq!(Reading::<u32>::Unavailable.to_string(), "error");
        assert_eq!(Reading::Value(42).to_string(), "42");
    }

    #[test]
    fn test_reading_from_option() {
        assert_eq!(Reading::from(Some(3)), Reading::Value(3));
        assert_eq!(Reading::<i32>::from(None), Reading::Unknown);
        assert_eq!(Reading::Value(2).map(|v| v * 10), Reading::Value(20));
    }
}
