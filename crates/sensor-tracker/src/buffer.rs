//! Bounded inertial sample buffer with timestamp interpolation.

use std::collections::VecDeque;

use parallax_record_model::sensor::{SensorReading, SensorSample, TimestampMs};

/// Default number of samples retained.
pub const DEFAULT_CAPACITY: usize = 500;

/// Time-ordered store of the most recent inertial samples.
///
/// Insertion order is time order: samples are appended as they arrive and
/// never reordered. Once the buffer grows past its capacity the oldest excess
/// samples are dropped in one step.
#[derive(Debug, Clone)]
pub struct SensorBuffer {
    samples: VecDeque<SensorSample>,
    capacity: usize,
}

impl SensorBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, trimming to capacity.
    pub fn push(&mut self, sample: SensorSample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            let excess = self.samples.len() - self.capacity;
            self.samples.drain(..excess);
        }
    }

    /// Resolve sensor values at `timestamp`.
    ///
    /// Finds the newest sample at or before `timestamp` and the sample right
    /// after it, then interpolates each quantity linearly. The interpolation
    /// factor is not clamped. A query newer than every sample returns the
    /// newest sample unchanged; a query older than every sample, or a buffer
    /// with fewer than two samples, yields nothing. A quantity missing from
    /// either bracketing sample is reported as missing.
    pub fn interpolate(&self, timestamp: TimestampMs) -> SensorReading {
        if self.samples.len() < 2 {
            return SensorReading::default();
        }

        let Some(before_idx) = self.samples.iter().rposition(|s| s.timestamp <= timestamp) else {
            return SensorReading::default();
        };
        let before = &self.samples[before_idx];

        let Some(after) = self.samples.get(before_idx + 1) else {
            return SensorReading {
                accel: before.accel,
                gyro: before.gyro,
            };
        };

        let span = (after.timestamp - before.timestamp) as f64;
        let t = if span > 0.0 {
            (timestamp - before.timestamp) as f64 / span
        } else {
            0.0
        };

        SensorReading {
            accel: match (before.accel, after.accel) {
                (Some(a), Some(b)) => Some(a.lerp(&b, t)),
                _ => None,
            },
            gyro: match (before.gyro, after.gyro) {
                (Some(a), Some(b)) => Some(a.lerp(&b, t)),
                _ => None,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Timestamp range covered by the buffer.
    pub fn span(&self) -> Option<(TimestampMs, TimestampMs)> {
        Some((self.samples.front()?.timestamp, self.samples.back()?.timestamp))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorSample> {
        self.samples.iter()
    }
}

impl Default for SensorBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
