//! Operator-facing capture controller.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::frame::FacingMode;
use parallax_record_model::payload::{CaptureLabels, UploadReceipt};

use crate::assembler::{FrameAssembler, FrameOutcome};
use crate::session::{RecordingSession, SessionState, StopOutcome};
use crate::sources::{LandmarkSource, VideoSource};
use crate::upload::RecordUploader;

/// Progress of the most recent commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Sending,
    Sent { filename: Option<String> },
    Failed { message: String },
}

/// Wires a video source, an optional landmark source, the frame assembler
/// and an uploader around one [`RecordingSession`].
pub struct CaptureController {
    session: RecordingSession,
    assembler: FrameAssembler,
    video: Box<dyn VideoSource>,
    landmarks: Option<Box<dyn LandmarkSource>>,
    uploader: Arc<dyn RecordUploader>,
    upload_status: Arc<Mutex<UploadStatus>>,
}

impl CaptureController {
    pub fn new(
        video: Box<dyn VideoSource>,
        assembler: FrameAssembler,
        uploader: Arc<dyn RecordUploader>,
    ) -> Self {
        let facing = video.facing_mode();
        Self {
            session: RecordingSession::new(facing),
            assembler,
            video,
            landmarks: None,
            uploader,
            upload_status: Arc::new(Mutex::new(UploadStatus::Idle)),
        }
    }

    pub fn with_landmarks(mut self, source: Box<dyn LandmarkSource>) -> Self {
        self.landmarks = Some(source);
        self
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Begin recording. Fails without touching the session when the video
    /// source cannot deliver frames.
    pub fn start(&mut self) -> ParallaxResult<()> {
        if !self.video.is_available() {
            return Err(ParallaxError::device_unavailable(format!(
                "video source {} is not available",
                self.video.name()
            )));
        }
        self.session.start()
    }

    /// Pull and process the next frame. `None` once the source is exhausted.
    pub fn process_next_frame(&mut self) -> ParallaxResult<Option<FrameOutcome>> {
        let Some(frame) = self.video.next_frame()? else {
            return Ok(None);
        };
        let landmarks = self
            .landmarks
            .as_mut()
            .and_then(|source| source.landmarks_for(frame.timestamp));

        Ok(Some(self.assembler.process(
            &mut self.session,
            &frame,
            landmarks.as_deref(),
            None,
        )))
    }

    pub fn stop(&mut self) -> ParallaxResult<StopOutcome> {
        self.session.stop()
    }

    pub fn discard(&mut self) -> ParallaxResult<usize> {
        self.session.discard()
    }

    /// Commit the reviewed frames and upload them on a blocking task.
    ///
    /// The session is emptied before the upload starts; a failed upload does
    /// not restore it. Must be called from within a tokio runtime.
    pub fn commit(
        &mut self,
        labels: CaptureLabels,
    ) -> ParallaxResult<JoinHandle<ParallaxResult<UploadReceipt>>> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ParallaxError::upload(format!("no async runtime: {e}")))?;
        let payload = self.session.commit(labels)?;

        set_status(&self.upload_status, UploadStatus::Sending);
        let uploader = Arc::clone(&self.uploader);
        let status = Arc::clone(&self.upload_status);

        Ok(runtime.spawn_blocking(move || {
            let result = uploader.upload(&payload);
            match &result {
                Ok(receipt) => set_status(
                    &status,
                    UploadStatus::Sent {
                        filename: receipt.filename.clone(),
                    },
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Upload failed");
                    set_status(
                        &status,
                        UploadStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
            result
        }))
    }

    /// Switch cameras unless recording. Returns the selected camera.
    pub fn toggle_facing_mode(&mut self) -> FacingMode {
        let mode = self.session.toggle_facing_mode();
        if mode != self.video.facing_mode() {
            self.video.set_facing_mode(mode);
            tracing::info!(facing = %mode, "Camera switched");
        }
        mode
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.upload_status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

fn set_status(status: &Mutex<UploadStatus>, value: UploadStatus) {
    match status.lock() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}
