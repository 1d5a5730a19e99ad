//! Still-image snapshots embedded in frame records.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use parallax_common::config::CaptureDefaults;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Trait for frame snapshot encoders.
pub trait SnapshotEncoder: Send {
    /// Encode `image` as a data URL. `None` when encoding fails.
    fn encode(&self, image: &DynamicImage) -> Option<String>;
}

/// Downscales to a maximum width and encodes as a base64 JPEG data URL.
#[derive(Debug, Clone, Copy)]
pub struct JpegSnapshotEncoder {
    max_width: u32,
    quality: u8,
}

impl JpegSnapshotEncoder {
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(capture: &CaptureDefaults) -> Self {
        Self::new(capture.snapshot_max_width, capture.snapshot_quality)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> image::ImageResult<Vec<u8>> {
        let scaled;
        let source = if image.width() > self.max_width {
            let height = (u64::from(image.height()) * u64::from(self.max_width)
                / u64::from(image.width()))
            .max(1) as u32;
            scaled = image.resize_exact(self.max_width, height, FilterType::Triangle);
            &scaled
        } else {
            image
        };

        let rgb = source.to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&rgb)?;
        Ok(bytes)
    }
}

impl Default for JpegSnapshotEncoder {
    fn default() -> Self {
        Self::new(480, 50)
    }
}

impl SnapshotEncoder for JpegSnapshotEncoder {
    fn encode(&self, image: &DynamicImage) -> Option<String> {
        match self.encode_jpeg(image) {
            Ok(bytes) => Some(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(bytes))),
            Err(e) => {
                tracing::debug!(error = %e, "Snapshot encoding failed");
                None
            }
        }
    }
}

/// Decode a snapshot data URL back into an image.
pub fn decode_snapshot(data_url: &str) -> Option<DynamicImage> {
    let payload = data_url.strip_prefix(DATA_URL_PREFIX)?;
    let bytes = STANDARD.decode(payload).ok()?;
    image::load_from_memory(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_wide_frame_is_downscaled() {
        let encoder = JpegSnapshotEncoder::default();
        let url = encoder.encode(&gradient(1280, 720)).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let decoded = decode_snapshot(&url).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (480, 270));
    }

    #[test]
    fn test_narrow_frame_keeps_size() {
        let encoder = JpegSnapshotEncoder::new(480, 50);
        let decoded = decode_snapshot(&encoder.encode(&gradient(320, 240)).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_rejects_foreign_data_url() {
        assert!(decode_snapshot("data:image/png;base64,AAAA").is_none());
    }
}
