//! Background feature tracking across consecutive frames.

use image::GrayImage;

use parallax_common::config::TrackingDefaults;
use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::frame::{FaceBox, MotionStats};

use crate::corners::{CornerConfig, CornerDetector};
use crate::flow::{LucasKanadeConfig, PyramidalLk};
use crate::geometry::{PixelRect, TrackedPoint};

#[derive(Debug, Clone, Copy)]
pub struct BackgroundTrackerConfig {
    /// Re-detect when fewer points than this survive.
    pub reacquire_below: usize,
    /// Pixels added around the face box before masking.
    pub face_margin: u32,
    pub corners: CornerConfig,
    pub flow: LucasKanadeConfig,
}

impl Default for BackgroundTrackerConfig {
    fn default() -> Self {
        Self {
            reacquire_below: 30,
            face_margin: 20,
            corners: CornerConfig::default(),
            flow: LucasKanadeConfig::default(),
        }
    }
}

impl From<&TrackingDefaults> for BackgroundTrackerConfig {
    fn from(t: &TrackingDefaults) -> Self {
        Self {
            reacquire_below: t.reacquire_below,
            face_margin: t.face_margin,
            corners: CornerConfig {
                max_corners: t.max_corners,
                quality_level: t.quality_level,
                min_distance: t.min_distance,
            },
            flow: LucasKanadeConfig {
                window_radius: t.window_radius,
                pyramid_levels: t.pyramid_levels,
                max_iterations: t.max_iterations,
                epsilon: t.epsilon,
                min_eigen: t.min_eigen,
            },
        }
    }
}

/// Tracks background corners from one grayscale frame to the next.
///
/// Owns the previous frame and the live point set. Both are replaced by move
/// on every [`advance`](Self::advance) and dropped together when a frame
/// cannot be processed.
pub struct BackgroundTracker {
    config: BackgroundTrackerConfig,
    detector: CornerDetector,
    flow: PyramidalLk,
    previous: Option<GrayImage>,
    points: Option<Vec<TrackedPoint>>,
    reacquisitions: u64,
}

impl BackgroundTracker {
    pub fn new(config: BackgroundTrackerConfig) -> Self {
        Self {
            detector: CornerDetector::new(config.corners),
            flow: PyramidalLk::new(config.flow),
            config,
            previous: None,
            points: None,
            reacquisitions: 0,
        }
    }

    /// Consume the next frame and report background motion since the last one.
    ///
    /// The first frame (and the first after a reset) only primes the tracker
    /// and yields zero stats. Errors are absorbed: state is reset and zero
    /// stats are returned.
    pub fn advance(&mut self, gray: GrayImage, face: Option<&FaceBox>) -> MotionStats {
        match self.step(gray, face) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "Background tracking failed; resetting");
                self.reset();
                MotionStats::default()
            }
        }
    }

    fn step(&mut self, gray: GrayImage, face: Option<&FaceBox>) -> ParallaxResult<MotionStats> {
        let Some(previous) = self.previous.take() else {
            self.previous = Some(gray);
            return Ok(MotionStats::default());
        };
        if gray.width() == 0 || gray.height() == 0 {
            return Err(ParallaxError::tracking("empty frame"));
        }

        let points = match self.points.take() {
            Some(points) if points.len() >= self.config.reacquire_below => points,
            stale => {
                let exclude = face.map(|f| {
                    PixelRect::from_face_box(f, gray.width(), gray.height(), self.config.face_margin)
                });
                let fresh = self.detector.detect(&gray, exclude.as_ref());
                self.reacquisitions += 1;
                tracing::debug!(
                    previous = stale.map_or(0, |p| p.len()),
                    detected = fresh.len(),
                    "Re-acquired background points"
                );
                fresh
            }
        };

        let results = self.flow.track(&previous, &gray, &points)?;
        drop(previous);

        let mut displacements = Vec::with_capacity(results.len());
        let mut survivors = Vec::with_capacity(results.len());
        for r in results.into_iter().filter(|r| r.is_tracked()) {
            let (dx, dy) = r.displacement();
            displacements.push((f64::from(dx), f64::from(dy)));
            survivors.push(r.to);
        }

        self.points = Some(survivors);
        self.previous = Some(gray);
        Ok(MotionStats::from_displacements(&displacements))
    }

    /// Drop the previous frame and all tracked points.
    pub fn reset(&mut self) {
        self.previous = None;
        self.points = None;
    }

    /// Points carried into the next frame.
    pub fn tracked_points(&self) -> &[TrackedPoint] {
        self.points.as_deref().unwrap_or(&[])
    }

    /// Number of corner re-detections so far.
    pub fn reacquisitions(&self) -> u64 {
        self.reacquisitions
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

impl Default for BackgroundTracker {
    fn default() -> Self {
        Self::new(BackgroundTrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blobs(width: u32, height: u32, shift_x: f32, shift_y: f32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let fx = x as f32 - shift_x;
            let fy = y as f32 - shift_y;
            let v = 128.0 + 50.0 * (fx * 0.19).sin() * (fy * 0.23).sin()
                + 25.0 * (fx * 0.07 + fy * 0.05).cos();
            Luma([v.clamp(0.0, 255.0) as u8])
        })
    }

    #[test]
    fn test_first_frame_primes_with_zero_stats() {
        let mut tracker = BackgroundTracker::default();
        let stats = tracker.advance(blobs(160, 120, 0.0, 0.0), None);
        assert_eq!(stats, MotionStats::default());
        assert!(tracker.has_previous());
        assert!(tracker.tracked_points().is_empty());
    }

    #[test]
    fn test_static_scene_reports_zero_motion() {
        let mut tracker = BackgroundTracker::default();
        tracker.advance(blobs(200, 160, 0.0, 0.0), None);
        let stats = tracker.advance(blobs(200, 160, 0.0, 0.0), None);

        assert!(stats.count > 0);
        assert!(stats.avg_magnitude.abs() < 1e-9);
        assert!(stats.variance.abs() < 1e-9);
    }

    #[test]
    fn test_size_change_resets_state() {
        let mut tracker = BackgroundTracker::default();
        tracker.advance(blobs(160, 120, 0.0, 0.0), None);
        tracker.advance(blobs(160, 120, 0.0, 0.0), None);

        let stats = tracker.advance(blobs(120, 160, 0.0, 0.0), None);
        assert_eq!(stats, MotionStats::default());
        assert!(!tracker.has_previous());
        assert!(tracker.tracked_points().is_empty());

        // Next frame primes again.
        let stats = tracker.advance(blobs(120, 160, 0.0, 0.0), None);
        assert_eq!(stats.count, 0);
        assert!(tracker.has_previous());
    }

    #[test]
    fn test_flat_frames_keep_reacquiring() {
        let mut tracker = BackgroundTracker::default();
        let flat = GrayImage::from_pixel(100, 100, Luma([90]));
        tracker.advance(flat.clone(), None);
        tracker.advance(flat.clone(), None);
        tracker.advance(flat, None);
        assert_eq!(tracker.reacquisitions(), 2);
        assert!(tracker.tracked_points().is_empty());
    }

    #[test]
    fn test_config_from_tracking_defaults() {
        let config = BackgroundTrackerConfig::from(&TrackingDefaults::default());
        assert_eq!(config.reacquire_below, 30);
        assert_eq!(config.face_margin, 20);
        assert_eq!(config.corners.max_corners, 100);
        assert_eq!(config.flow.window_radius, 7);
        assert_eq!(config.flow.max_iterations, 20);
    }
}
