//! Record sets on disk.
//!
//! A record set is one committed [`UploadPayload`] stored as pretty-printed
//! JSON. Files are named `{scenario}_{MMDD_HHMMSS}.json` inside a collection
//! directory.

use std::path::{Path, PathBuf};

use crate::payload::{scenario_file_component, UploadPayload};

/// Errors that can occur when reading or writing record sets.
#[derive(Debug, thiserror::Error)]
pub enum RecordSetError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// File name for a record set saved at `at`. The scenario is reduced with
/// [`scenario_file_component`] first.
pub fn record_set_file_name(scenario: &str, at: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}_{}.json",
        scenario_file_component(scenario),
        at.format("%m%d_%H%M%S")
    )
}

/// Write a payload into `dir`, returning the path written.
pub fn save_record_set(dir: &Path, payload: &UploadPayload) -> Result<PathBuf, RecordSetError> {
    std::fs::create_dir_all(dir).map_err(|e| RecordSetError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(record_set_file_name(
        &payload.scenario_or_unknown(),
        chrono::Local::now(),
    ));
    let json = serde_json::to_string_pretty(payload).map_err(|e| RecordSetError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    std::fs::write(&path, json).map_err(|e| RecordSetError::IoError {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Load a previously saved record set.
pub fn load_record_set(path: &Path) -> Result<UploadPayload, RecordSetError> {
    let content = std::fs::read_to_string(path).map_err(|e| RecordSetError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| RecordSetError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Coverage and motion summary for a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSetSummary {
    pub frames: usize,
    pub duration_ms: i64,
    pub frames_with_face: usize,
    pub frames_with_accel: usize,
    pub frames_with_gyro: usize,
    pub frames_with_image: usize,
    pub mean_tracked_points: f64,
    pub mean_relative_magnitude: f64,
    pub max_relative_magnitude: f64,
}

impl RecordSetSummary {
    pub fn from_payload(payload: &UploadPayload) -> Self {
        let data = &payload.data;
        if data.is_empty() {
            return Self::default();
        }

        let n = data.len() as f64;
        let duration_ms = match (data.first(), data.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        };

        Self {
            frames: data.len(),
            duration_ms,
            frames_with_face: data.iter().filter(|r| r.landmarks.is_some()).count(),
            frames_with_accel: data.iter().filter(|r| r.sensors.accel.is_some()).count(),
            frames_with_gyro: data.iter().filter(|r| r.sensors.gyro.is_some()).count(),
            frames_with_image: data.iter().filter(|r| r.image.is_some()).count(),
            mean_tracked_points: data
                .iter()
                .map(|r| r.optical_flow_stats.count as f64)
                .sum::<f64>()
                / n,
            mean_relative_magnitude: data
                .iter()
                .map(|r| r.motion_analysis.relative_magnitude)
                .sum::<f64>()
                / n,
            max_relative_magnitude: data
                .iter()
                .map(|r| r.motion_analysis.relative_magnitude)
                .fold(0.0, f64::max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{
        FacingMode, FrameMeta, FrameRecord, MotionAnalysis, MotionStats, RecordedSensors, Vec3,
    };
    use crate::payload::CaptureLabels;
    use chrono::TimeZone;

    fn record(timestamp: i64, relative: f64, with_face: bool) -> FrameRecord {
        FrameRecord {
            timestamp,
            landmarks: with_face.then(|| vec![0.5, 0.5, 0.0]),
            sensors: RecordedSensors {
                accel: Some(Vec3::default()),
                gyro: None,
            },
            optical_flow_stats: MotionStats {
                count: 40,
                ..Default::default()
            },
            motion_analysis: MotionAnalysis {
                relative_magnitude: relative,
                ..Default::default()
            },
            image: None,
            meta: FrameMeta {
                facing_mode: FacingMode::Front,
            },
        }
    }

    #[test]
    fn test_file_name_format() {
        let at = chrono::Local
            .with_ymd_and_hms(2026, 3, 7, 9, 5, 2)
            .single()
            .unwrap();
        assert_eq!(record_set_file_name("photo", at), "photo_0307_090502.json");
    }

    #[test]
    fn test_save_and_load_record_set() {
        let dir = std::env::temp_dir().join("parallax_test_record_set");
        let _ = std::fs::remove_dir_all(&dir);

        let payload = UploadPayload::new(
            CaptureLabels::default(),
            vec![record(0, 1.0, true), record(33, 2.0, false)],
        );
        let path = save_record_set(&dir, &payload).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("live_"));

        let loaded = load_record_set(&path).unwrap();
        assert_eq!(loaded, payload);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_traversing_scenario_stays_in_dir() {
        let dir = std::env::temp_dir().join("parallax_test_record_set_traversal");
        let _ = std::fs::remove_dir_all(&dir);

        let mut labels = CaptureLabels::default();
        labels.scenario = "../../escaped".to_string();
        let path = save_record_set(&dir, &UploadPayload::new(labels, vec![])).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("escaped_"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_record_set(Path::new("/nonexistent/parallax.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/parallax.json"));
    }

    #[test]
    fn test_summary_counts_coverage() {
        let payload = UploadPayload::new(
            CaptureLabels::default(),
            vec![record(100, 1.0, true), record(133, 3.0, false), record(166, 2.0, true)],
        );
        let summary = RecordSetSummary::from_payload(&payload);
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.duration_ms, 66);
        assert_eq!(summary.frames_with_face, 2);
        assert_eq!(summary.frames_with_accel, 3);
        assert_eq!(summary.frames_with_gyro, 0);
        assert!((summary.mean_relative_magnitude - 2.0).abs() < 1e-9);
        assert!((summary.max_relative_magnitude - 3.0).abs() < 1e-9);
        assert!((summary.mean_tracked_points - 40.0).abs() < 1e-9);
    }
}
