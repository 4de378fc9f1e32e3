//! Per-frame detector interfaces
//!
//! Face-mesh and presence models run once per tick on the loop thread, so
//! they are synchronous. Implementations wrap whatever backend is available.

use crate::landmarks::FaceLandmarks;
use crate::VisionError;
use camera_capture::VideoFrame;

/// Locates the eye landmarks of the primary face
pub trait FaceLandmarker: Send {
    /// `Ok(None)` when no face is visible
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, VisionError>;
}

/// Decides whether a person is at the desk
pub trait PresenceDetector: Send {
    fn is_present(&mut self, frame: &VideoFrame) -> Result<bool, VisionError>;
}

impl<F> FaceLandmarker for F
where
    F: FnMut(&VideoFrame) -> Result<Option<FaceLandmarks>, VisionError> + Send,
{
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, VisionError> {
        self(frame)
    }
}

/// Landmarker for setups without a face-mesh backend: never sees a face
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFaceLandmarker;

impl FaceLandmarker for NoFaceLandmarker {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<FaceLandmarks>, VisionError> {
        Ok(None)
    }
}
