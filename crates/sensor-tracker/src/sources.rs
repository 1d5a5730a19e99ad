//! Inertial source implementations.
//!
//! Each source yields raw platform motion events; the pump stamps and
//! converts them into samples.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::sensor::{parse_motion_events, RawMotionEvent};

use crate::InertialSource;

/// Replays a recorded list of motion events.
///
/// When paced, an event is released only once the shared playhead has reached
/// its timestamp, so a frame-driven replay sees exactly the samples that
/// would have arrived before each frame.
pub struct ReplaySource {
    events: VecDeque<RawMotionEvent>,
    playhead: Option<Arc<AtomicI64>>,
}

impl ReplaySource {
    pub fn new(events: Vec<RawMotionEvent>) -> Self {
        Self {
            events: events.into(),
            playhead: None,
        }
    }

    /// Load events from a JSONL file.
    pub fn from_jsonl_file(path: &Path) -> ParallaxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ParallaxError::sensor(format!("Failed to read {}: {e}", path.display()))
        })?;
        let events = parse_motion_events(&content)?;
        tracing::debug!(path = %path.display(), events = events.len(), "Loaded sensor replay");
        Ok(Self::new(events))
    }

    /// Gate events on a playhead timestamp.
    pub fn paced(mut self, playhead: Arc<AtomicI64>) -> Self {
        self.playhead = Some(playhead);
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InertialSource for ReplaySource {
    fn poll(&mut self) -> ParallaxResult<Option<RawMotionEvent>> {
        let Some(next) = self.events.front() else {
            return Ok(None);
        };
        if let (Some(playhead), Some(ts)) = (&self.playhead, next.timestamp) {
            if ts > playhead.load(Ordering::Acquire) {
                return Ok(None);
            }
        }
        Ok(self.events.pop_front())
    }

    fn name(&self) -> &str {
        "replay"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_finished(&self) -> bool {
        self.events.is_empty()
    }
}

/// Receives motion events pushed from a platform callback.
pub struct ChannelSource {
    receiver: Receiver<RawMotionEvent>,
    disconnected: bool,
}

impl ChannelSource {
    /// Create a source and the sender half handed to the platform callback.
    pub fn new() -> (Self, Sender<RawMotionEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                receiver,
                disconnected: false,
            },
            sender,
        )
    }
}

impl InertialSource for ChannelSource {
    fn poll(&mut self) -> ParallaxResult<Option<RawMotionEvent>> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                Ok(None)
            }
        }
    }

    fn name(&self) -> &str {
        "channel"
    }

    fn is_available(&self) -> bool {
        !self.disconnected
    }

    fn is_finished(&self) -> bool {
        self.disconnected
    }
}
