//! Guarded sensor buffer shared between the sensor and frame paths.

use std::sync::{Arc, Mutex, MutexGuard};

use parallax_record_model::sensor::{SensorReading, SensorSample, TimestampMs};

use crate::buffer::SensorBuffer;

/// Cloneable handle to a [`SensorBuffer`] behind a mutex.
///
/// The sensor path pushes while the frame path interpolates. Both operations
/// are bounded by the buffer capacity and never suspend, so a plain mutex is
/// enough. A poisoned lock is recovered: the buffer holds no invariant a
/// panicking writer could break halfway.
#[derive(Debug, Clone, Default)]
pub struct SharedSensorBuffer {
    inner: Arc<Mutex<SensorBuffer>>,
}

impl SharedSensorBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SensorBuffer::new(capacity))),
        }
    }

    pub fn push(&self, sample: SensorSample) {
        self.lock().push(sample);
    }

    pub fn interpolate(&self, timestamp: TimestampMs) -> SensorReading {
        self.lock().interpolate(timestamp)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, SensorBuffer> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
