//! Reference-landmark motion between frames.

use parallax_record_model::frame::{FaceDelta, Landmark};

/// Nose bridge on the 468-point face mesh.
pub const DEFAULT_REFERENCE_LANDMARK: usize = 168;

/// Follows one reference landmark in pixel space.
///
/// The last position is forgotten whenever a frame has no face, so the first
/// frame after the face reappears reports zero motion.
#[derive(Debug, Clone)]
pub struct FaceMotionTracker {
    reference_index: usize,
    last_position: Option<(f64, f64)>,
}

impl FaceMotionTracker {
    pub fn new(reference_index: usize) -> Self {
        Self {
            reference_index,
            last_position: None,
        }
    }

    /// Displacement of the reference landmark since the previous frame, in
    /// pixels of a `width x height` frame.
    pub fn advance(&mut self, landmarks: Option<&[Landmark]>, width: u32, height: u32) -> FaceDelta {
        let Some(reference) = landmarks.and_then(|l| l.get(self.reference_index)) else {
            if self.last_position.take().is_some() {
                tracing::debug!("Face lost");
            }
            return FaceDelta::ZERO;
        };

        let position = (reference.x * f64::from(width), reference.y * f64::from(height));
        let delta = match self.last_position {
            Some((px, py)) => FaceDelta::new(position.0 - px, position.1 - py),
            None => FaceDelta::ZERO,
        };
        self.last_position = Some(position);
        delta
    }

    pub fn reference_index(&self) -> usize {
        self.reference_index
    }

    pub fn last_position(&self) -> Option<(f64, f64)> {
        self.last_position
    }

    pub fn reset(&mut self) {
        self.last_position = None;
    }
}

impl Default for FaceMotionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_LANDMARK)
    }
}
