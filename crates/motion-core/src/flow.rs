//! Pyramidal sparse optical flow (Lucas-Kanade).
//!
//! Each point is tracked coarse-to-fine. At every level the template window
//! is taken from the previous frame around the point, and the displacement is
//! refined by Gauss-Newton steps against the current frame:
//!
//! ```text
//! G = Σ [Ix² IxIy; IxIy Iy²]      b = Σ (I(p) - J(p + g + v)) [Ix; Iy]
//! v ← v + G⁻¹ b                    g_next = 2 (g + v)
//! ```
//!
//! A point is lost when its window is textureless (small minimum eigenvalue
//! of `G / window_area`) or when its refined position leaves the frame.

use image::GrayImage;

use parallax_common::error::{ParallaxError, ParallaxResult};

use crate::geometry::TrackedPoint;
use crate::pyramid::{build_pyramid, PyramidLevel};

#[derive(Debug, Clone, Copy)]
pub struct LucasKanadeConfig {
    pub window_radius: usize,
    pub pyramid_levels: usize,
    pub max_iterations: usize,
    pub epsilon: f32,
    pub min_eigen: f32,
}

impl Default for LucasKanadeConfig {
    fn default() -> Self {
        Self {
            window_radius: 7,
            pyramid_levels: 2,
            max_iterations: 20,
            epsilon: 0.03,
            min_eigen: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Tracked,
    /// Window had too little texture to solve for motion.
    Textureless,
    /// Refined position fell outside the frame.
    OutOfBounds,
}

#[derive(Debug, Clone, Copy)]
pub struct FlowResult {
    pub from: TrackedPoint,
    pub to: TrackedPoint,
    pub status: FlowStatus,
}

impl FlowResult {
    pub fn is_tracked(&self) -> bool {
        self.status == FlowStatus::Tracked
    }

    pub fn displacement(&self) -> (f32, f32) {
        (self.to.x - self.from.x, self.to.y - self.from.y)
    }
}

pub struct PyramidalLk {
    config: LucasKanadeConfig,
}

impl PyramidalLk {
    pub fn new(config: LucasKanadeConfig) -> Self {
        Self { config }
    }

    /// Track `points` from `previous` into `current`. Results are returned in
    /// input order.
    pub fn track(
        &self,
        previous: &GrayImage,
        current: &GrayImage,
        points: &[TrackedPoint],
    ) -> ParallaxResult<Vec<FlowResult>> {
        if previous.dimensions() != current.dimensions() {
            return Err(ParallaxError::tracking(format!(
                "frame size changed from {:?} to {:?}",
                previous.dimensions(),
                current.dimensions()
            )));
        }
        let min_side = (2 * self.config.window_radius + 1) as u32;
        if previous.width() < min_side || previous.height() < min_side {
            return Err(ParallaxError::tracking(format!(
                "frame {:?} smaller than the flow window",
                previous.dimensions()
            )));
        }

        let prev_pyramid = build_pyramid(previous, self.config.pyramid_levels, min_side);
        let curr_pyramid = build_pyramid(current, self.config.pyramid_levels, min_side);
        let width = previous.width() as f32;
        let height = previous.height() as f32;

        Ok(points
            .iter()
            .map(|&from| {
                let (to, status) = match self.track_point(
                    prev_pyramid.levels(),
                    curr_pyramid.levels(),
                    from,
                ) {
                    Some(to) if in_frame(to, width, height) => (to, FlowStatus::Tracked),
                    Some(to) => (to, FlowStatus::OutOfBounds),
                    None => (from, FlowStatus::Textureless),
                };
                FlowResult { from, to, status }
            })
            .collect())
    }

    fn track_point(
        &self,
        prev_levels: &[PyramidLevel],
        curr_levels: &[PyramidLevel],
        point: TrackedPoint,
    ) -> Option<TrackedPoint> {
        // Carried displacement estimate, in the current level's pixels.
        let mut gx = 0.0f32;
        let mut gy = 0.0f32;

        for (level_idx, (prev, curr)) in prev_levels.iter().zip(curr_levels).enumerate().rev() {
            let px = point.x * prev.scale;
            let py = point.y * prev.scale;
            let (vx, vy) = self.refine_level(prev, curr, px, py, gx, gy)?;

            if level_idx == 0 {
                return Some(TrackedPoint::new(point.x + gx + vx, point.y + gy + vy));
            }
            gx = 2.0 * (gx + vx);
            gy = 2.0 * (gy + vy);
        }
        None
    }

    /// Solve for the residual motion `v` at one level, given the guess `g`.
    fn refine_level(
        &self,
        prev: &PyramidLevel,
        curr: &PyramidLevel,
        px: f32,
        py: f32,
        gx: f32,
        gy: f32,
    ) -> Option<(f32, f32)> {
        let r = self.config.window_radius as i32;
        let side = (2 * r + 1) as usize;
        let area = (side * side) as f32;

        let mut template = Vec::with_capacity(side * side);
        let (mut gxx, mut gxy, mut gyy) = (0.0f32, 0.0f32, 0.0f32);
        for dy in -r..=r {
            for dx in -r..=r {
                let x = px + dx as f32;
                let y = py + dy as f32;
                let ix = prev.grad_x.sample(x, y);
                let iy = prev.grad_y.sample(x, y);
                gxx += ix * ix;
                gxy += ix * iy;
                gyy += iy * iy;
                template.push((prev.image.sample(x, y), ix, iy));
            }
        }

        let trace = gxx + gyy;
        let discriminant = ((gxx - gyy) * (gxx - gyy) + 4.0 * gxy * gxy).sqrt();
        let min_eigen = 0.5 * (trace - discriminant) / area;
        let det = gxx * gyy - gxy * gxy;
        if min_eigen < self.config.min_eigen || det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let eps_sq = self.config.epsilon * self.config.epsilon;
        let (mut vx, mut vy) = (0.0f32, 0.0f32);
        for _ in 0..self.config.max_iterations {
            let (mut bx, mut by) = (0.0f32, 0.0f32);
            let mut k = 0;
            for dy in -r..=r {
                for dx in -r..=r {
                    let (i, ix, iy) = template[k];
                    k += 1;
                    let j = curr
                        .image
                        .sample(px + dx as f32 + gx + vx, py + dy as f32 + gy + vy);
                    let diff = i - j;
                    bx += diff * ix;
                    by += diff * iy;
                }
            }

            let ex = inv_det * (gyy * bx - gxy * by);
            let ey = inv_det * (gxx * by - gxy * bx);
            vx += ex;
            vy += ey;
            if !vx.is_finite() || !vy.is_finite() {
                return None;
            }
            if ex * ex + ey * ey <= eps_sq {
                break;
            }
        }
        Some((vx, vy))
    }
}

fn in_frame(p: TrackedPoint, width: f32, height: f32) -> bool {
    p.x >= 0.0 && p.y >= 0.0 && p.x <= width - 1.0 && p.y <= height - 1.0
}
