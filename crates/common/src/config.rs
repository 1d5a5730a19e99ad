//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Background and face tracking parameters.
    pub tracking: TrackingDefaults,

    /// Inertial sensor ingestion.
    pub sensors: SensorDefaults,

    /// Per-frame capture settings.
    pub capture: CaptureDefaults,

    /// Upload transport.
    pub upload: UploadConfig,

    /// Record-set collection server.
    pub collector: CollectorConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Tuning for background feature tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingDefaults {
    /// Re-detect corners when fewer than this many points survive.
    pub reacquire_below: usize,

    /// Maximum number of corners detected per re-acquisition.
    pub max_corners: usize,

    /// Minimum corner response as a fraction of the strongest response.
    pub quality_level: f32,

    /// Minimum separation between detected corners (px).
    pub min_distance: f32,

    /// Margin added on each side of the face box before masking (px).
    pub face_margin: u32,

    /// Half-size of the optical-flow window (px). A radius of 7 is a 15x15 window.
    pub window_radius: usize,

    /// Pyramid levels above the base image.
    pub pyramid_levels: usize,

    /// Maximum Lucas-Kanade iterations per level.
    pub max_iterations: usize,

    /// Convergence threshold on the per-iteration update (px).
    pub epsilon: f32,

    /// Minimum eigenvalue of the normalized structure tensor before a point is lost.
    pub min_eigen: f32,
}

/// Inertial sensor ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorDefaults {
    /// Number of samples retained for interpolation.
    pub buffer_capacity: usize,

    /// Idle delay between polls of an inertial source (ms).
    pub poll_interval_ms: u64,
}

/// Per-frame capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Landmark index used as the face motion reference.
    pub reference_landmark: usize,

    /// Landmark indices recorded in each frame record.
    pub recorded_landmarks: Vec<usize>,

    /// Maximum snapshot width (px).
    pub snapshot_max_width: u32,

    /// JPEG quality for snapshots (1-100).
    pub snapshot_quality: u8,

    /// Whether snapshots are captured at all.
    pub snapshots: bool,

    /// Camera selected at startup ("front" or "rear").
    pub facing_mode: String,
}

/// Upload transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Full URL of the collector's upload route.
    pub endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Collection server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Socket address to bind.
    pub bind: String,

    /// Directory where received record sets are written.
    pub save_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "parallax=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            reacquire_below: 30,
            max_corners: 100,
            quality_level: 0.01,
            min_distance: 15.0,
            face_margin: 20,
            window_radius: 7,
            pyramid_levels: 2,
            max_iterations: 20,
            epsilon: 0.03,
            min_eigen: 1e-3,
        }
    }
}

impl Default for SensorDefaults {
    fn default() -> Self {
        Self {
            buffer_capacity: 500,
            poll_interval_ms: 1,
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            reference_landmark: 168,
            // Nose tip, chin, eye corners, mouth corners on the 468-point mesh.
            recorded_landmarks: vec![1, 152, 33, 263, 61, 291, 168, 10],
            snapshot_max_width: 480,
            snapshot_quality: 50,
            snapshots: true,
            facing_mode: "front".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/upload".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            save_dir: PathBuf::from("collected_data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("parallax").join("config.json")
}
