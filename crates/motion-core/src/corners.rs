//! Shi-Tomasi corner detection with an exclusion rectangle.
//!
//! Response is the minimum eigenvalue of the 3x3 structure tensor:
//!
//! ```text
//! M = [Σ Ix²   Σ IxIy]
//!     [Σ IxIy  Σ Iy² ]     λ_min = (trace - √(trace² - 4·det)) / 2
//! ```
//!
//! Candidates must exceed `quality_level` times the strongest response, be a
//! 3x3 local maximum, and lie at least `min_distance` from every stronger
//! accepted corner.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::geometry::{PixelRect, TrackedPoint};

/// Pixels this close to the border are never corners.
const BORDER: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct CornerConfig {
    pub max_corners: usize,
    pub quality_level: f32,
    pub min_distance: f32,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.01,
            min_distance: 15.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CornerDetector {
    config: CornerConfig,
}

impl CornerDetector {
    pub fn new(config: CornerConfig) -> Self {
        Self { config }
    }

    /// Detect up to `max_corners` corners, strongest first, skipping any
    /// pixel inside `exclude`.
    pub fn detect(&self, image: &GrayImage, exclude: Option<&PixelRect>) -> Vec<TrackedPoint> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        if width <= 2 * BORDER + 2 || height <= 2 * BORDER + 2 || self.config.max_corners == 0 {
            return Vec::new();
        }

        let response = min_eigen_response(image);
        let allowed = |x: usize, y: usize| {
            x >= BORDER
                && y >= BORDER
                && x < width - BORDER
                && y < height - BORDER
                && !exclude.is_some_and(|r| r.contains(x as f32, y as f32))
        };

        let mut max_response = 0.0f32;
        for y in 0..height {
            for x in 0..width {
                if allowed(x, y) {
                    max_response = max_response.max(response[y * width + x]);
                }
            }
        }
        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = max_response * self.config.quality_level;

        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        for y in BORDER..height - BORDER {
            for x in BORDER..width - BORDER {
                let r = response[y * width + x];
                if r <= threshold || !allowed(x, y) {
                    continue;
                }
                let is_peak = (y - 1..=y + 1).all(|ny| {
                    (x - 1..=x + 1).all(|nx| response[ny * width + nx] <= r)
                });
                if is_peak {
                    candidates.push((r, x, y));
                }
            }
        }

        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let min_dist_sq = self.config.min_distance * self.config.min_distance;
        let mut kept: Vec<TrackedPoint> = Vec::with_capacity(self.config.max_corners);
        for (_, x, y) in candidates {
            let p = TrackedPoint::new(x as f32, y as f32);
            if kept.iter().all(|k| k.distance_sq(&p) >= min_dist_sq) {
                kept.push(p);
                if kept.len() == self.config.max_corners {
                    break;
                }
            }
        }

        tracing::debug!(
            width,
            height,
            corners = kept.len(),
            masked = exclude.is_some(),
            "Detected background corners"
        );
        kept
    }
}

/// Per-pixel minimum eigenvalue of the 3x3 summed structure tensor.
fn min_eigen_response(image: &GrayImage) -> Vec<f32> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let n = width * height;
    let mut xx = vec![0.0f32; n];
    let mut yy = vec![0.0f32; n];
    let mut xy = vec![0.0f32; n];
    for (i, (&dx, &dy)) in gx.as_raw().iter().zip(gy.as_raw().iter()).enumerate() {
        let dx = dx as f32 / 8.0;
        let dy = dy as f32 / 8.0;
        xx[i] = dx * dx;
        yy[i] = dy * dy;
        xy[i] = dx * dy;
    }

    let mut response = vec![0.0f32; n];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
            for ny in y - 1..=y + 1 {
                let row = ny * width;
                for nx in x - 1..=x + 1 {
                    sxx += xx[row + nx];
                    syy += yy[row + nx];
                    sxy += xy[row + nx];
                }
            }
            let trace = sxx + syy;
            let discriminant = (sxx - syy) * (sxx - syy) + 4.0 * sxy * sxy;
            response[y * width + x] = (0.5 * (trace - discriminant.sqrt())).max(0.0);
        }
    }
    response
}
