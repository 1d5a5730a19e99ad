//! Parallax Capture Engine
//!
//! Turns a stream of camera frames into labeled record sets. Each frame is
//! fused with the face landmarks, background optical flow, and inertial
//! readings for its timestamp; while a session is recording the result is
//! appended as a [`FrameRecord`](parallax_record_model::frame::FrameRecord).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                CaptureController                 │
//! │  ┌─────────────┐ ┌───────────────┐ ┌───────────┐ │
//! │  │ VideoSource │ │ LandmarkSource│ │ Sensor    │ │
//! │  │             │ │               │ │ Buffer    │ │
//! │  └──────┬──────┘ └───────┬───────┘ └─────┬─────┘ │
//! │         ▼                ▼               ▼       │
//! │  ┌─────────────────────────────────────────────┐ │
//! │  │ FrameAssembler ──► RecordingSession buffer  │ │
//! │  └──────────────────────┬──────────────────────┘ │
//! │                         ▼ commit                 │
//! │                  RecordUploader                  │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod assembler;
pub mod controller;
pub mod session;
pub mod snapshot;
pub mod sources;
pub mod upload;

pub use assembler::{FrameAssembler, FrameOutcome};
pub use controller::{CaptureController, UploadStatus};
pub use session::*;
pub use snapshot::{JpegSnapshotEncoder, SnapshotEncoder};
pub use sources::{ImageSequenceSource, JsonlLandmarkSource, LandmarkSource, VideoFrame, VideoSource};
pub use upload::{DirectoryUploader, HttpUploader, RecordUploader};
