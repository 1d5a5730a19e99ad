//! Parallax Sensor Tracker
//!
//! Buffers inertial samples that arrive independently of video frames and
//! resolves them onto frame timestamps by interpolation. Uses a pluggable
//! source architecture:
//!
//! - **Channel:** events pushed from a platform motion callback
//! - **Replay:** events recorded to JSONL, optionally paced by a playhead
//!
//! The [`SensorPump`] drains a source into a [`SharedSensorBuffer`], which is
//! the only structure shared between the sensor and frame paths.

pub mod buffer;
pub mod shared;
pub mod sources;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parallax_common::clock::CaptureClock;
use parallax_common::error::ParallaxResult;
use parallax_record_model::sensor::{RawMotionEvent, SensorSample};

pub use buffer::SensorBuffer;
pub use shared::SharedSensorBuffer;

/// Trait for inertial event sources.
pub trait InertialSource: Send {
    /// Poll for the next motion event. Returns `None` if no event is available.
    fn poll(&mut self) -> ParallaxResult<Option<RawMotionEvent>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Check if the source can deliver events on this system.
    fn is_available(&self) -> bool;

    /// Whether the source will never deliver another event.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Moves events from a source into the shared buffer.
pub struct SensorPump {
    source: Box<dyn InertialSource>,
    buffer: SharedSensorBuffer,
    clock: CaptureClock,
    stop_flag: Arc<AtomicBool>,
    poll_interval: Duration,
    samples_pushed: u64,
}

impl SensorPump {
    pub fn new(
        source: Box<dyn InertialSource>,
        buffer: SharedSensorBuffer,
        clock: CaptureClock,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            buffer,
            clock,
            stop_flag: Arc::new(AtomicBool::new(false)),
            poll_interval,
            samples_pushed: 0,
        }
    }

    /// Push every event the source has ready right now.
    pub fn drain(&mut self) -> ParallaxResult<usize> {
        let mut pushed = 0;
        while let Some(event) = self.source.poll()? {
            self.push_event(&event);
            pushed += 1;
        }
        Ok(pushed)
    }

    /// Run the pump loop until the stop flag is set or the source finishes.
    pub async fn run(&mut self) -> ParallaxResult<u64> {
        tracing::info!(
            source = %self.source.name(),
            epoch = %self.clock.epoch_wall(),
            "Sensor pump started"
        );

        while !self.stop_flag.load(Ordering::Relaxed) {
            match self.source.poll() {
                Ok(Some(event)) => self.push_event(&event),
                Ok(None) if self.source.is_finished() => break,
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Sensor source error");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        tracing::info!(samples = self.samples_pushed, "Sensor pump stopped");
        Ok(self.samples_pushed)
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Number of samples pushed so far.
    pub fn samples_pushed(&self) -> u64 {
        self.samples_pushed
    }

    fn push_event(&mut self, event: &RawMotionEvent) {
        let timestamp = event.timestamp.unwrap_or_else(|| self.clock.elapsed_ms());
        self.buffer.push(SensorSample::from_raw(timestamp, event));
        self.samples_pushed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ReplaySource;
    use parallax_record_model::sensor::RawAxes;

    fn accel_event(t: i64, x: f64) -> RawMotionEvent {
        RawMotionEvent {
            timestamp: Some(t),
            acceleration: Some(RawAxes {
                x: Some(x),
                y: None,
                z: None,
            }),
            rotation_rate: None,
        }
    }

    #[test]
    fn test_drain_pushes_all_ready_events() {
        let buffer = SharedSensorBuffer::new(500);
        let source = ReplaySource::new(vec![accel_event(0, 0.0), accel_event(100, 10.0)]);
        let mut pump = SensorPump::new(
            Box::new(source),
            buffer.clone(),
            CaptureClock::start(),
            Duration::from_millis(1),
        );

        assert_eq!(pump.drain().unwrap(), 2);
        assert_eq!(buffer.len(), 2);
        let x = buffer.interpolate(50).accel.unwrap().x;
        assert!((x - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_run_stops_when_source_finishes() {
        let buffer = SharedSensorBuffer::new(500);
        let events = (0..20).map(|i| accel_event(i * 10, i as f64)).collect();
        let mut pump = SensorPump::new(
            Box::new(ReplaySource::new(events)),
            buffer.clone(),
            CaptureClock::start(),
            Duration::from_millis(1),
        );

        let pushed = pump.run().await.unwrap();
        assert_eq!(pushed, 20);
        assert_eq!(buffer.len(), 20);
    }

    #[tokio::test]
    async fn test_spawned_pump_follows_playhead_until_stopped() {
        let buffer = SharedSensorBuffer::new(500);
        let playhead = Arc::new(std::sync::atomic::AtomicI64::new(i64::MIN));
        let events = (0..10).map(|i| accel_event(i * 10, i as f64)).collect();
        let mut pump = SensorPump::new(
            Box::new(ReplaySource::new(events).paced(playhead.clone())),
            buffer.clone(),
            CaptureClock::start(),
            Duration::from_millis(1),
        );
        let stop = pump.stop_flag();
        let task = tokio::spawn(async move { pump.run().await });

        playhead.store(40, Ordering::Release);
        for _ in 0..200 {
            if buffer.len() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(buffer.len(), 5);

        stop.store(true, Ordering::SeqCst);
        let pushed = task.await.unwrap().unwrap();
        assert_eq!(pushed, 5);
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_unstamped_events_use_capture_clock() {
        let buffer = SharedSensorBuffer::new(500);
        let mut event = accel_event(0, 1.0);
        event.timestamp = None;
        let mut pump = SensorPump::new(
            Box::new(ReplaySource::new(vec![event])),
            buffer.clone(),
            CaptureClock::start(),
            Duration::from_millis(1),
        );

        pump.drain().unwrap();
        assert_eq!(buffer.len(), 1);
    }
}
