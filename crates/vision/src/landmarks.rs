//! Face-mesh landmark types

use serde::{Deserialize, Serialize};

/// Face-mesh indices of the six left-eye contour points (p1..p6)
pub const LEFT_EYE_IDX: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Face-mesh indices of the six right-eye contour points (p1..p6)
pub const RIGHT_EYE_IDX: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Face-mesh indices of the points used as the eye span for distance estimation
pub const EYE_ANCHOR_IDX: (usize, usize) = (145, 374);

/// Smallest mesh that covers every index used here
pub const MIN_MESH_POINTS: usize = 468;

/// 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Six eye-contour points for one eye.
///
/// p1/p4 are the corners, p2/p3 the upper lid, p6/p5 the matching lower lid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks(pub [Point; 6]);

impl EyeLandmarks {
    pub fn points(&self) -> &[Point; 6] {
        &self.0
    }
}

/// Eye landmarks for one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: EyeLandmarks,
    pub right_eye: EyeLandmarks,
    /// Anchor points spanning both eyes (mesh 145 and 374)
    pub left_anchor: Point,
    pub right_anchor: Point,
}

impl FaceLandmarks {
    /// Build from a normalised face mesh (coordinates in 0..1), scaled to the
    /// frame size. `None` if the mesh is too short.
    pub fn from_mesh(mesh: &[Point], width: u32, height: u32) -> Option<Self> {
        if mesh.len() < MIN_MESH_POINTS {
            return None;
        }

        let scale = |p: &Point| Point::new(p.x * width as f64, p.y * height as f64);
        let eye = |idx: &[usize; 6]| {
            let mut points = [Point::default(); 6];
            for (slot, &i) in points.iter_mut().zip(idx.iter()) {
                *slot = scale(&mesh[i]);
            }
            EyeLandmarks(points)
        };

        Some(Self {
            left_eye: eye(&LEFT_EYE_IDX),
            right_eye: eye(&RIGHT_EYE_IDX),
            left_anchor: scale(&mesh[EYE_ANCHOR_IDX.0]),
            right_anchor: scale(&mesh[EYE_ANCHOR_IDX.1]),
        })
    }

    /// Pixel distance between the two eye anchors
    pub fn anchor_span(&self) -> f64 {
        self.left_anchor.distance(&self.right_anchor)
    }
}
