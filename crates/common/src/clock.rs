//! Clock utilities for stamping capture streams.
//!
//! Video frames and inertial events arrive on independent callback paths.
//! Both are stamped in integer milliseconds against a shared [`CaptureClock`]
//! so the sensor buffer can interpolate onto frame timestamps.

use std::time::{Duration, Instant};

/// A monotonic clock anchored to the moment capture started.
#[derive(Debug, Clone)]
pub struct CaptureClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl CaptureClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the epoch.
    pub fn elapsed_ms(&self) -> i64 {
        duration_to_ms(self.epoch.elapsed())
    }

    /// Timestamp of an instant observed on this clock. Instants before the
    /// epoch map to zero.
    pub fn stamp(&self, at: Instant) -> i64 {
        duration_to_ms(at.saturating_duration_since(self.epoch))
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Convert a duration to whole milliseconds, saturating at `i64::MAX`.
pub fn duration_to_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = CaptureClock::start();
        let elapsed = clock.elapsed_ms();
        assert!((0..1000).contains(&elapsed));
    }

    #[test]
    fn test_stamp_before_epoch_is_zero() {
        let before = Instant::now();
        let clock = CaptureClock::start();
        assert_eq!(clock.stamp(before), 0);
        assert!(clock.stamp(Instant::now() + Duration::from_millis(50)) >= 50);
    }

    #[test]
    fn test_duration_to_ms() {
        assert_eq!(duration_to_ms(Duration::from_micros(1_500)), 1);
        assert_eq!(duration_to_ms(Duration::from_secs(2)), 2_000);
    }
}
