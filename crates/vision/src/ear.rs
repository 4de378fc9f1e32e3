//! Eye aspect ratio (EAR)

use crate::landmarks::{EyeLandmarks, FaceLandmarks};

/// Below this corner-to-corner span (pixels) the geometry is unusable
const MIN_EYE_WIDTH: f64 = 1e-6;

/// EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)
///
/// `None` when the eye width is degenerate.
pub fn eye_aspect_ratio(eye: &EyeLandmarks) -> Option<f64> {
    let [p1, p2, p3, p4, p5, p6] = eye.0;
    let horizontal = p1.distance(&p4);
    if !horizontal.is_finite() || horizontal < MIN_EYE_WIDTH {
        return None;
    }
    let ear = (p2.distance(&p6) + p3.distance(&p5)) / (2.0 * horizontal);
    ear.is_finite().then_some(ear)
}

/// Computes the per-frame eye openness score for both eyes
#[derive(Debug, Clone, Copy, Default)]
pub struct EyeClosureEstimator;

impl EyeClosureEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Mean EAR of both eyes, or `None` if either eye is degenerate
    pub fn average_ear(&self, face: &FaceLandmarks) -> Option<f64> {
        let left = eye_aspect_ratio(&face.left_eye)?;
        let right = eye_aspect_ratio(&face.right_eye)?;
        Some((left + right) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;
    use proptest::prelude::*;

    /// Eye 30px wide with lids `opening` px apart
    fn eye(opening: f64) -> EyeLandmarks {
        let half = opening / 2.0;
        EyeLandmarks([
            Point::new(0.0, 0.0),
            Point::new(10.0, -half),
            Point::new(20.0, -half),
            Point::new(30.0, 0.0),
            Point::new(20.0, half),
            Point::new(10.0, half),
        ])
    }

    #[test]
    fn test_open_and_closed_eye() {
        let open = eye_aspect_ratio(&eye(9.0)).unwrap();
        assert!((open - 0.3).abs() < 1e-9);

        let closed = eye_aspect_ratio(&eye(3.0)).unwrap();
        assert!((closed - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_width() {
        let collapsed = EyeLandmarks([Point::new(5.0, 5.0); 6]);
        assert_eq!(eye_aspect_ratio(&collapsed), None);

        let face = FaceLandmarks {
            left_eye: eye(9.0),
            right_eye: collapsed,
            left_anchor: Point::default(),
            right_anchor: Point::new(60.0, 0.0),
        };
        assert_eq!(EyeClosureEstimator::new().average_ear(&face), None);
    }

    #[test]
    fn test_average_of_both_eyes() {
        let face = FaceLandmarks {
            left_eye: eye(9.0),
            right_eye: eye(3.0),
            left_anchor: Point::default(),
            right_anchor: Point::new(60.0, 0.0),
        };
        let ear = EyeClosureEstimator::new().average_ear(&face).unwrap();
        assert!((ear - 0.2).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_ear_is_scale_invariant(opening in 0.0f64..20.0, scale in 0.1f64..50.0) {
            let base = eye(opening);
            let mut scaled = base;
            for p in scaled.0.iter_mut() {
                p.x *= scale;
                p.y *= scale;
            }
            let a = eye_aspect_ratio(&base).unwrap();
            let b = eye_aspect_ratio(&scaled).unwrap();
            prop_assert!((a - b).abs() < 1e-9);
        }
    }
}
