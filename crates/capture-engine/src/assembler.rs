//! Per-frame fusion of landmarks, background flow, sensors and snapshots.

use parallax_common::config::AppConfig;
use parallax_motion_core::{analyze, BackgroundTracker, BackgroundTrackerConfig, FaceMotionTracker};
use parallax_record_model::frame::{
    flatten_landmarks, FaceBox, FrameMeta, FrameRecord, Landmark, MotionAnalysis, MotionStats,
    RecordedSensors,
};
use parallax_sensor_tracker::SharedSensorBuffer;

use crate::session::RecordingSession;
use crate::snapshot::{JpegSnapshotEncoder, SnapshotEncoder};
use crate::sources::VideoFrame;

/// What one frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub stats: MotionStats,
    pub analysis: MotionAnalysis,
    /// Whether a record was appended to the session.
    pub recorded: bool,
}

/// Drives the trackers on every frame and appends a [`FrameRecord`] while
/// the session is recording.
///
/// Trackers advance whether or not the session is recording so that the
/// first recorded frame already has a motion history.
pub struct FrameAssembler {
    face: FaceMotionTracker,
    background: BackgroundTracker,
    sensors: SharedSensorBuffer,
    snapshots: Option<Box<dyn SnapshotEncoder>>,
    recorded_landmarks: Vec<usize>,
}

impl FrameAssembler {
    pub fn new(
        face: FaceMotionTracker,
        background: BackgroundTracker,
        sensors: SharedSensorBuffer,
    ) -> Self {
        Self {
            face,
            background,
            sensors,
            snapshots: None,
            recorded_landmarks: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig, sensors: SharedSensorBuffer) -> Self {
        let mut assembler = Self::new(
            FaceMotionTracker::new(config.capture.reference_landmark),
            BackgroundTracker::new(BackgroundTrackerConfig::from(&config.tracking)),
            sensors,
        )
        .with_recorded_landmarks(config.capture.recorded_landmarks.clone());
        if config.capture.snapshots {
            assembler = assembler.with_snapshots(Box::new(JpegSnapshotEncoder::from_config(
                &config.capture,
            )));
        }
        assembler
    }

    pub fn with_snapshots(mut self, encoder: Box<dyn SnapshotEncoder>) -> Self {
        self.snapshots = Some(encoder);
        self
    }

    /// Landmark indices copied into each record.
    pub fn with_recorded_landmarks(mut self, indices: Vec<usize>) -> Self {
        self.recorded_landmarks = indices;
        self
    }

    pub fn sensors(&self) -> &SharedSensorBuffer {
        &self.sensors
    }

    pub fn background(&self) -> &BackgroundTracker {
        &self.background
    }

    /// Process one frame. When no face box is given it is derived from the
    /// landmarks, if any.
    pub fn process(
        &mut self,
        session: &mut RecordingSession,
        frame: &VideoFrame,
        landmarks: Option<&[Landmark]>,
        face_box: Option<FaceBox>,
    ) -> FrameOutcome {
        let (width, height) = (frame.width(), frame.height());
        let face_box = face_box.or_else(|| landmarks.and_then(FaceBox::from_landmarks));

        let face_delta = self.face.advance(landmarks, width, height);
        let stats = self
            .background
            .advance(frame.image.to_luma8(), face_box.as_ref());
        let analysis = analyze(&face_delta, &stats);

        if !session.is_recording() {
            return FrameOutcome {
                stats,
                analysis,
                recorded: false,
            };
        }

        let facing = session.recording_facing();
        let reading = self.sensors.interpolate(frame.timestamp);
        let image = self
            .snapshots
            .as_ref()
            .and_then(|encoder| encoder.encode(&frame.image));

        let record = FrameRecord {
            timestamp: frame.timestamp,
            landmarks: landmarks.map(|l| flatten_landmarks(l, &self.recorded_landmarks)),
            sensors: RecordedSensors::from_reading(&reading, facing),
            optical_flow_stats: stats,
            motion_analysis: analysis,
            image,
            meta: FrameMeta {
                facing_mode: facing,
            },
        };
        let recorded = session.append(record);
        tracing::trace!(
            timestamp = frame.timestamp,
            points = stats.count,
            relative = analysis.relative_magnitude,
            "Frame recorded"
        );

        FrameOutcome {
            stats,
            analysis,
            recorded,
        }
    }
}
