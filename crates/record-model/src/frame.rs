//! Per-frame record types.
//!
//! A [`FrameRecord`] is the atomic unit appended while a session records.
//! Field names serialize in camelCase to match the collector's JSON schema;
//! missing modalities serialize as `null` rather than being omitted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sensor::{SensorReading, TimestampMs};

/// Which physical camera is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Selfie camera; the baseline for recorded sensor axes.
    #[default]
    Front,
    /// World-facing camera.
    Rear,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Rear,
            Self::Rear => Self::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Rear => "rear",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Self::Front),
            "rear" | "back" | "environment" => Ok(Self::Rear),
            other => Err(format!("unknown facing mode: {other}")),
        }
    }
}

/// A face landmark in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Face bounding box in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl FaceBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Tight box around a landmark list. `None` for an empty list.
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        let first = landmarks.first()?;
        let init = Self::new(first.x, first.y, first.x, first.y);
        Some(landmarks.iter().skip(1).fold(init, |b, l| Self {
            min_x: b.min_x.min(l.x),
            min_y: b.min_y.min(l.y),
            max_x: b.max_x.max(l.x),
            max_y: b.max_y.max(l.y),
        }))
    }
}

/// Aggregate background motion for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionStats {
    /// Points tracked successfully this frame.
    pub count: usize,
    pub avg_dx: f64,
    pub avg_dy: f64,
    pub avg_magnitude: f64,
    /// Population variance of per-point displacement magnitudes.
    pub variance: f64,
}

impl MotionStats {
    /// Aggregate per-point displacement vectors. Zero stats for an empty slice.
    pub fn from_displacements(displacements: &[(f64, f64)]) -> Self {
        if displacements.is_empty() {
            return Self::default();
        }

        let n = displacements.len() as f64;
        let magnitudes: Vec<f64> = displacements
            .iter()
            .map(|(dx, dy)| dx.hypot(*dy))
            .collect();
        let avg_dx = displacements.iter().map(|(dx, _)| dx).sum::<f64>() / n;
        let avg_dy = displacements.iter().map(|(_, dy)| dy).sum::<f64>() / n;
        let avg_magnitude = magnitudes.iter().sum::<f64>() / n;
        let variance = magnitudes
            .iter()
            .map(|m| (m - avg_magnitude).powi(2))
            .sum::<f64>()
            / n;

        Self {
            count: displacements.len(),
            avg_dx,
            avg_dy,
            avg_magnitude,
            variance,
        }
    }
}

/// Frame-to-frame displacement of the reference landmark (px).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceDelta {
    pub dx: f64,
    pub dy: f64,
}

impl FaceDelta {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Face motion relative to background motion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionAnalysis {
    pub face_dx: f64,
    pub face_dy: f64,
    pub bg_dx: f64,
    pub bg_dy: f64,
    /// Length of the face-minus-background displacement vector.
    pub relative_magnitude: f64,
}

/// A recorded 3-axis quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Sensor values as written into a frame record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordedSensors {
    pub accel: Option<Vec3>,
    pub gyro: Option<Vec3>,
}

impl RecordedSensors {
    /// Map an interpolated reading into recorded axes for the given camera.
    ///
    /// On the rear camera the horizontal acceleration is negated so that
    /// left/right matches the front-camera baseline. Gyro axes are relabeled
    /// as `x = beta, y = gamma, z = alpha` for either camera.
    pub fn from_reading(reading: &SensorReading, facing: FacingMode) -> Self {
        let accel = reading.accel.map(|a| Vec3 {
            x: match facing {
                FacingMode::Front => a.x,
                FacingMode::Rear => -a.x,
            },
            y: a.y,
            z: a.z,
        });
        let gyro = reading.gyro.map(|g| Vec3 {
            x: g.beta,
            y: g.gamma,
            z: g.alpha,
        });
        Self { accel, gyro }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    pub facing_mode: FacingMode,
}

/// One frame of captured evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub timestamp: TimestampMs,
    /// Selected landmarks flattened as `[x0, y0, z0, x1, ...]`.
    pub landmarks: Option<Vec<f64>>,
    pub sensors: RecordedSensors,
    pub optical_flow_stats: MotionStats,
    pub motion_analysis: MotionAnalysis,
    /// Encoded still image (data URL).
    pub image: Option<String>,
    pub meta: FrameMeta,
}

/// Flatten the landmarks at `indices` into `[x, y, z, ...]`. Indices beyond
/// the list are skipped.
pub fn flatten_landmarks(landmarks: &[Landmark], indices: &[usize]) -> Vec<f64> {
    indices
        .iter()
        .filter_map(|&i| landmarks.get(i))
        .flat_map(|l| [l.x, l.y, l.z])
        .collect()
}
