//! Recording session lifecycle.

use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::frame::{FacingMode, FrameRecord};
use parallax_record_model::payload::{CaptureLabels, UploadPayload};

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not recording; the buffer is empty.
    Idle,
    /// Frames are being appended.
    Recording,
    /// Recording stopped with data awaiting commit or discard.
    Reviewing,
}

/// Result of stopping a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// At least one frame was recorded; the session is now reviewing.
    Reviewing { frames: usize },
    /// Nothing was recorded; the session went straight back to idle.
    NoData,
}

/// Owns the frame buffer and gates appends on the session state.
#[derive(Debug)]
pub struct RecordingSession {
    state: SessionState,
    records: Vec<FrameRecord>,
    facing_mode: FacingMode,
    recording_facing: FacingMode,
}

impl RecordingSession {
    pub fn new(facing_mode: FacingMode) -> Self {
        Self {
            state: SessionState::Idle,
            records: Vec::new(),
            facing_mode,
            recording_facing: facing_mode,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Camera currently selected.
    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// Camera latched at the last `start`; drives sensor sign adjustment.
    pub fn recording_facing(&self) -> FacingMode {
        self.recording_facing
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Begin recording. Clears any previous frames.
    pub fn start(&mut self) -> ParallaxResult<()> {
        if self.state != SessionState::Idle {
            return Err(ParallaxError::session(format!(
                "cannot start while {:?}",
                self.state
            )));
        }
        self.records.clear();
        self.recording_facing = self.facing_mode;
        self.state = SessionState::Recording;
        tracing::info!(facing = %self.recording_facing, "Recording started");
        Ok(())
    }

    /// Stop recording. An empty session returns to idle with
    /// [`StopOutcome::NoData`].
    pub fn stop(&mut self) -> ParallaxResult<StopOutcome> {
        if self.state != SessionState::Recording {
            return Err(ParallaxError::session(format!(
                "cannot stop while {:?}",
                self.state
            )));
        }
        if self.records.is_empty() {
            self.state = SessionState::Idle;
            tracing::warn!("No data collected");
            return Ok(StopOutcome::NoData);
        }
        self.state = SessionState::Reviewing;
        let frames = self.records.len();
        tracing::info!(frames, "Recording stopped");
        Ok(StopOutcome::Reviewing { frames })
    }

    /// Drop the reviewed frames. Returns how many were discarded.
    pub fn discard(&mut self) -> ParallaxResult<usize> {
        if self.state != SessionState::Reviewing {
            return Err(ParallaxError::session(format!(
                "cannot discard while {:?}",
                self.state
            )));
        }
        let frames = self.records.len();
        self.records.clear();
        self.state = SessionState::Idle;
        tracing::info!(frames, "Recording discarded");
        Ok(frames)
    }

    /// Hand the reviewed frames off as one payload and return to idle.
    pub fn commit(&mut self, labels: CaptureLabels) -> ParallaxResult<UploadPayload> {
        if self.state != SessionState::Reviewing {
            return Err(ParallaxError::session(format!(
                "cannot commit while {:?}",
                self.state
            )));
        }
        let data = std::mem::take(&mut self.records);
        self.state = SessionState::Idle;
        tracing::info!(frames = data.len(), scenario = %labels.scenario, "Recording committed");
        Ok(UploadPayload::new(labels, data))
    }

    /// Append a record. Ignored unless recording; returns whether it was kept.
    pub fn append(&mut self, record: FrameRecord) -> bool {
        if self.state != SessionState::Recording {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Switch cameras. No effect while recording.
    pub fn toggle_facing_mode(&mut self) -> FacingMode {
        if self.state == SessionState::Recording {
            tracing::debug!("Facing mode locked while recording");
        } else {
            self.facing_mode = self.facing_mode.toggled();
        }
        self.facing_mode
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(FacingMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_record_model::frame::{FrameMeta, MotionAnalysis, MotionStats, RecordedSensors};

    fn record(timestamp: i64) -> FrameRecord {
        FrameRecord {
            timestamp,
            landmarks: None,
            sensors: RecordedSensors::default(),
            optical_flow_stats: MotionStats::default(),
            motion_analysis: MotionAnalysis::default(),
            image: None,
            meta: FrameMeta::default(),
        }
    }

    #[test]
    fn test_stop_on_empty_returns_to_idle() {
        let mut session = RecordingSession::default();
        session.start().unwrap();
        assert_eq!(session.stop().unwrap(), StopOutcome::NoData);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_clears_previous_frames() {
        let mut session = RecordingSession::default();
        session.start().unwrap();
        session.append(record(1));
        session.append(record(2));
        session.stop().unwrap();
        session.discard().unwrap();

        session.start().unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_discard_empties_and_goes_idle() {
        let mut session = RecordingSession::default();
        session.start().unwrap();
        session.append(record(1));
        assert_eq!(session.stop().unwrap(), StopOutcome::Reviewing { frames: 1 });
        assert_eq!(session.discard().unwrap(), 1);
        assert!(session.is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_commit_hands_off_in_order() {
        let mut session = RecordingSession::default();
        session.start().unwrap();
        for t in [10, 20, 30] {
            assert!(session.append(record(t)));
        }
        session.stop().unwrap();

        let payload = session.commit(CaptureLabels::default()).unwrap();
        let timestamps: Vec<i64> = payload.data.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20, 30]);
        assert!(session.is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut session = RecordingSession::default();
        assert!(session.stop().is_err());
        assert!(session.commit(CaptureLabels::default()).is_err());
        assert!(session.discard().is_err());

        session.start().unwrap();
        assert!(session.start().is_err());
        session.append(record(1));
        session.stop().unwrap();
        assert!(session.start().is_err());
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_append_ignored_unless_recording() {
        let mut session = RecordingSession::default();
        assert!(!session.append(record(1)));
        assert!(session.is_empty());
    }

    #[test]
    fn test_facing_toggle_locked_while_recording() {
        let mut session = RecordingSession::new(FacingMode::Front);
        assert_eq!(session.toggle_facing_mode(), FacingMode::Rear);

        session.start().unwrap();
        assert_eq!(session.recording_facing(), FacingMode::Rear);
        assert_eq!(session.toggle_facing_mode(), FacingMode::Rear);

        session.stop().unwrap();
        assert_eq!(session.toggle_facing_mode(), FacingMode::Front);
    }
}
