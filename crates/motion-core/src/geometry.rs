//! Pixel-space points and rectangles.

use parallax_record_model::frame::FaceBox;

/// A background feature position in base-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackedPoint {
    pub x: f32,
    pub y: f32,
}

impl TrackedPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Half-open pixel rectangle `[min_x, max_x) x [min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl PixelRect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Convert a normalized face box to pixels, grow it by `margin` on each
    /// side, and clamp it to a `width x height` frame.
    pub fn from_face_box(face: &FaceBox, width: u32, height: u32, margin: u32) -> Self {
        let w = f64::from(width);
        let h = f64::from(height);
        let m = f64::from(margin);
        Self {
            min_x: ((face.min_x * w).floor() - m).clamp(0.0, w) as f32,
            min_y: ((face.min_y * h).floor() - m).clamp(0.0, h) as f32,
            max_x: ((face.max_x * w).ceil() + m).clamp(0.0, w) as f32,
            max_y: ((face.max_y * h).ceil() + m).clamp(0.0, h) as f32,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }
}
