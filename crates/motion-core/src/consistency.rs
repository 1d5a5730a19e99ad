//! Face-versus-background motion comparison.

use parallax_record_model::frame::{FaceDelta, MotionAnalysis, MotionStats};

/// Compare face motion with the mean background motion for one frame.
///
/// A live face in front of a distant background moves differently from it,
/// so `relative_magnitude` is large; a flat replay moves as one surface and
/// stays near zero.
pub fn analyze(face: &FaceDelta, background: &MotionStats) -> MotionAnalysis {
    MotionAnalysis {
        face_dx: face.dx,
        face_dy: face.dy,
        bg_dx: background.avg_dx,
        bg_dy: background.avg_dy,
        relative_magnitude: (face.dx - background.avg_dx).hypot(face.dy - background.avg_dy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(avg_dx: f64, avg_dy: f64) -> MotionStats {
        MotionStats {
            count: 40,
            avg_dx,
            avg_dy,
            avg_magnitude: avg_dx.hypot(avg_dy),
            variance: 0.0,
        }
    }

    #[test]
    fn test_matching_motion_has_zero_relative_magnitude() {
        let analysis = analyze(&FaceDelta::new(2.5, -1.0), &stats(2.5, -1.0));
        assert!(analysis.relative_magnitude.abs() < 1e-12);
    }

    #[test]
    fn test_relative_magnitude_is_vector_difference() {
        let analysis = analyze(&FaceDelta::new(4.0, 5.0), &stats(1.0, 1.0));
        assert!((analysis.relative_magnitude - 5.0).abs() < 1e-12);
        assert_eq!(analysis.face_dx, 4.0);
        assert_eq!(analysis.bg_dy, 1.0);
    }

    #[test]
    fn test_no_background_points() {
        let analysis = analyze(&FaceDelta::new(3.0, 4.0), &MotionStats::default());
        assert!((analysis.relative_magnitude - 5.0).abs() < 1e-12);
    }
}
