//! Video and landmark collaborators.
//!
//! Live camera and face-mesh backends plug in through [`VideoSource`] and
//! [`LandmarkSource`]. The file-backed implementations here replay a
//! directory of images and a JSONL landmark track.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::Deserialize;

use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::frame::{FacingMode, Landmark};
use parallax_record_model::sensor::TimestampMs;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One decoded camera frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Milliseconds on the capture clock.
    pub timestamp: TimestampMs,
    pub image: DynamicImage,
}

impl VideoFrame {
    pub fn new(timestamp: TimestampMs, image: DynamicImage) -> Self {
        Self { timestamp, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Trait for frame producers.
pub trait VideoSource: Send {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Check if the device or input can deliver frames.
    fn is_available(&self) -> bool;

    fn facing_mode(&self) -> FacingMode;

    fn set_facing_mode(&mut self, mode: FacingMode);

    /// Next frame, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> ParallaxResult<Option<VideoFrame>>;
}

/// Trait for face landmark producers.
pub trait LandmarkSource: Send {
    /// Landmarks for the frame at `timestamp`, or `None` when no face was found.
    fn landmarks_for(&mut self, timestamp: TimestampMs) -> Option<Vec<Landmark>>;
}

enum SequenceItem {
    File(PathBuf),
    Decoded(DynamicImage),
}

/// Replays still images as a fixed-rate video stream.
pub struct ImageSequenceSource {
    items: VecDeque<SequenceItem>,
    interval_ms: i64,
    next_timestamp: TimestampMs,
    facing_mode: FacingMode,
    name: String,
}

impl ImageSequenceSource {
    /// Every PNG/JPEG file in `dir`, in file-name order.
    pub fn from_dir(dir: &Path, interval_ms: i64) -> ParallaxResult<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ParallaxError::permission_denied(format!("{}: {e}", dir.display()))
            }
            _ => ParallaxError::device_unavailable(format!("cannot read {}: {e}", dir.display())),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();

        tracing::info!(dir = %dir.display(), frames = files.len(), "Image sequence loaded");
        Ok(Self {
            items: files.into_iter().map(SequenceItem::File).collect(),
            interval_ms,
            next_timestamp: 0,
            facing_mode: FacingMode::default(),
            name: format!("images:{}", dir.display()),
        })
    }

    /// Frames already in memory.
    pub fn from_images(images: Vec<DynamicImage>, interval_ms: i64) -> Self {
        Self {
            items: images.into_iter().map(SequenceItem::Decoded).collect(),
            interval_ms,
            next_timestamp: 0,
            facing_mode: FacingMode::default(),
            name: "images:memory".to_string(),
        }
    }

    /// Timestamp given to the first frame.
    pub fn starting_at(mut self, timestamp: TimestampMs) -> Self {
        self.next_timestamp = timestamp;
        self
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl VideoSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        !self.items.is_empty()
    }

    fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    fn set_facing_mode(&mut self, mode: FacingMode) {
        self.facing_mode = mode;
    }

    fn next_frame(&mut self) -> ParallaxResult<Option<VideoFrame>> {
        let Some(item) = self.items.pop_front() else {
            return Ok(None);
        };
        let image = match item {
            SequenceItem::Decoded(image) => image,
            SequenceItem::File(path) => image::open(&path).map_err(|e| {
                ParallaxError::capture(format!("cannot decode {}: {e}", path.display()))
            })?,
        };

        let timestamp = self.next_timestamp;
        self.next_timestamp += self.interval_ms;
        Ok(Some(VideoFrame::new(timestamp, image)))
    }
}

#[derive(Debug, Deserialize)]
struct LandmarkLine {
    t: TimestampMs,
    landmarks: Option<Vec<[f64; 3]>>,
}

/// Landmark track recorded as JSONL, one frame per line:
///
/// ```text
/// {"t": 0, "landmarks": [[0.51, 0.42, -0.03], ...]}
/// {"t": 33, "landmarks": null}
/// ```
///
/// A lookup returns the newest entry at or before the requested timestamp.
#[derive(Debug, Clone, Default)]
pub struct JsonlLandmarkSource {
    entries: Vec<(TimestampMs, Option<Vec<Landmark>>)>,
}

impl JsonlLandmarkSource {
    pub fn from_entries(mut entries: Vec<(TimestampMs, Option<Vec<Landmark>>)>) -> Self {
        entries.sort_by_key(|(t, _)| *t);
        Self { entries }
    }

    /// Parse JSONL content. Blank lines and `#` comments are skipped.
    pub fn parse(jsonl: &str) -> Result<Self, serde_json::Error> {
        let mut entries = Vec::new();
        for line in jsonl.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed: LandmarkLine = serde_json::from_str(line)?;
            let landmarks = parsed
                .landmarks
                .map(|points| points.into_iter().map(Landmark::from).collect());
            entries.push((parsed.t, landmarks));
        }
        Ok(Self::from_entries(entries))
    }

    pub fn from_jsonl_file(path: &Path) -> ParallaxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let source = Self::parse(&content).map_err(|e| {
            ParallaxError::capture(format!("invalid landmark track {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), entries = source.len(), "Landmark track loaded");
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LandmarkSource for JsonlLandmarkSource {
    fn landmarks_for(&mut self, timestamp: TimestampMs) -> Option<Vec<Landmark>> {
        let idx = self.entries.partition_point(|(t, _)| *t <= timestamp);
        idx.checked_sub(1)
            .and_then(|i| self.entries[i].1.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_memory_sequence_stamps_frames() {
        let frames = (0..3)
            .map(|_| DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([10]))))
            .collect();
        let mut source = ImageSequenceSource::from_images(frames, 33).starting_at(100);
        assert!(source.is_available());

        let stamps: Vec<i64> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|f| f.timestamp)
            .collect();
        assert_eq!(stamps, vec![100, 133, 166]);
        assert!(!source.is_available());
    }

    #[test]
    fn test_directory_sequence_reads_images_in_order() {
        let dir = std::env::temp_dir().join("parallax_test_image_sequence");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        GrayImage::from_pixel(4, 4, Luma([200])).save(dir.join("b.png")).unwrap();
        GrayImage::from_pixel(6, 4, Luma([50])).save(dir.join("a.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "skip").unwrap();

        let mut source = ImageSequenceSource::from_dir(&dir, 40).unwrap();
        assert_eq!(source.remaining(), 2);
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.width(), 6);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!((second.timestamp, second.width()), (40, 4));
        assert!(source.next_frame().unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_is_device_unavailable() {
        let result = ImageSequenceSource::from_dir(Path::new("/nonexistent/parallax/frames"), 33);
        assert!(matches!(result, Err(ParallaxError::DeviceUnavailable { .. })));
    }

    #[test]
    fn test_landmark_lookup_uses_newest_preceding_entry() {
        let jsonl = "# face track\n\
                     {\"t\": 0, \"landmarks\": [[0.5, 0.5, 0.0]]}\n\
                     {\"t\": 66, \"landmarks\": null}\n\
                     \n\
                     {\"t\": 33, \"landmarks\": [[0.6, 0.5, 0.0]]}\n";
        let mut source = JsonlLandmarkSource::parse(jsonl).unwrap();
        assert_eq!(source.len(), 3);

        assert!(source.landmarks_for(-1).is_none());
        assert_eq!(source.landmarks_for(10).unwrap()[0].x, 0.5);
        assert_eq!(source.landmarks_for(33).unwrap()[0].x, 0.6);
        assert!(source.landmarks_for(100).is_none());
    }
}
