//! Inertial sensor sample types.
//!
//! Samples arrive on their own callback path at a platform-determined rate,
//! independent of video frames. Timestamps are integer milliseconds on the
//! capture clock.

use serde::{Deserialize, Serialize};

/// Millisecond timestamp on the capture clock.
pub type TimestampMs = i64;

/// Linear acceleration in device axes (m/s²).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accel {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rotation rate in device Euler axes (deg/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gyro {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// One inertial event. Either quantity may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: TimestampMs,
    pub accel: Option<Accel>,
    pub gyro: Option<Gyro>,
}

/// Sensor values resolved at a query timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    pub accel: Option<Accel>,
    pub gyro: Option<Gyro>,
}

/// Motion event as delivered by the platform, where every field is nullable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMotionEvent {
    /// Event time, when the platform supplies one.
    #[serde(default, alias = "t")]
    pub timestamp: Option<TimestampMs>,
    #[serde(default)]
    pub acceleration: Option<RawAxes>,
    #[serde(default)]
    pub rotation_rate: Option<RawRotation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAxes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRotation {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl SensorSample {
    pub fn new(timestamp: TimestampMs, accel: Option<Accel>, gyro: Option<Gyro>) -> Self {
        Self {
            timestamp,
            accel,
            gyro,
        }
    }

    /// Build a sample from a raw platform event. A missing group stays absent;
    /// a missing field inside a present group defaults to 0.
    pub fn from_raw(timestamp: TimestampMs, raw: &RawMotionEvent) -> Self {
        let accel = raw.acceleration.as_ref().map(|a| Accel {
            x: a.x.unwrap_or(0.0),
            y: a.y.unwrap_or(0.0),
            z: a.z.unwrap_or(0.0),
        });
        let gyro = raw.rotation_rate.as_ref().map(|r| Gyro {
            alpha: r.alpha.unwrap_or(0.0),
            beta: r.beta.unwrap_or(0.0),
            gamma: r.gamma.unwrap_or(0.0),
        });
        Self::new(timestamp, accel, gyro)
    }
}

impl Accel {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise linear interpolation towards `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
            z: lerp(self.z, other.z, t),
        }
    }
}

impl Gyro {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Component-wise linear interpolation towards `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            alpha: lerp(self.alpha, other.alpha, t),
            beta: lerp(self.beta, other.beta, t),
            gamma: lerp(self.gamma, other.gamma, t),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Parse raw motion events from JSONL content (one JSON object per line).
pub fn parse_motion_events(jsonl: &str) -> Result<Vec<RawMotionEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}
