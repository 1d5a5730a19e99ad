//! Float image planes and gradient pyramids for optical flow.

use image::imageops::{resize, FilterType};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Sobel responses are eight times the central-difference derivative.
const SOBEL_NORM: f32 = 1.0 / 8.0;

/// Single-channel `f32` image with clamped bilinear sampling.
#[derive(Debug, Clone)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: image.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    fn from_gradient(grad: &ImageBuffer<Luma<i16>, Vec<i16>>) -> Self {
        Self {
            width: grad.width() as usize,
            height: grad.height() as usize,
            data: grad.as_raw().iter().map(|&v| v as f32 * SOBEL_NORM).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Bilinear sample; coordinates outside the plane are clamped to the edge.
    #[inline]
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.at(x0, y0) * (1.0 - fx) + self.at(x1, y0) * fx;
        let bottom = self.at(x0, y1) * (1.0 - fx) + self.at(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

/// One pyramid level: intensities plus spatial derivatives.
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    /// Factor mapping base-image pixels to this level (1, 1/2, 1/4, ...).
    pub scale: f32,
    pub image: Plane,
    pub grad_x: Plane,
    pub grad_y: Plane,
}

/// Coarse-to-fine image pyramid, base level first.
#[derive(Debug, Clone)]
pub struct Pyramid {
    levels: Vec<PyramidLevel>,
}

impl Pyramid {
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }
}

/// Build a pyramid with up to `extra_levels` halvings above the base image.
///
/// Halving stops early once a level would be smaller than `min_side` pixels.
pub fn build_pyramid(base: &GrayImage, extra_levels: usize, min_side: u32) -> Pyramid {
    let mut levels = Vec::with_capacity(extra_levels + 1);
    let mut current = base.clone();
    let mut scale = 1.0f32;

    loop {
        levels.push(PyramidLevel {
            scale,
            image: Plane::from_gray(&current),
            grad_x: Plane::from_gradient(&horizontal_sobel(&current)),
            grad_y: Plane::from_gradient(&vertical_sobel(&current)),
        });

        let next_w = current.width() / 2;
        let next_h = current.height() / 2;
        if levels.len() > extra_levels || next_w < min_side || next_h < min_side {
            break;
        }
        current = resize(&current, next_w, next_h, FilterType::Triangle);
        scale *= 0.5;
    }

    tracing::trace!(
        levels = levels.len(),
        width = base.width(),
        height = base.height(),
        "Built flow pyramid"
    );
    Pyramid { levels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bilinear_sample_interpolates_and_clamps() {
        let image = GrayImage::from_raw(2, 2, vec![0, 100, 100, 200]).unwrap();
        let plane = Plane::from_gray(&image);
        assert!((plane.sample(0.5, 0.0) - 50.0).abs() < 1e-4);
        assert!((plane.sample(0.5, 0.5) - 100.0).abs() < 1e-4);
        assert!((plane.sample(-3.0, -3.0) - 0.0).abs() < 1e-4);
        assert!((plane.sample(9.0, 9.0) - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_gradient_of_horizontal_ramp() {
        let image = GrayImage::from_fn(16, 16, |x, _| Luma([(x * 4) as u8]));
        let pyramid = build_pyramid(&image, 0, 4);
        let level = &pyramid.levels()[0];
        assert!((level.grad_x.at(8, 8) - 4.0).abs() < 1e-4);
        assert!(level.grad_y.at(8, 8).abs() < 1e-4);
    }

    #[test]
    fn test_pyramid_halves_until_min_side() {
        let image = GrayImage::new(64, 48);
        let pyramid = build_pyramid(&image, 5, 16);
        let scales: Vec<f32> = pyramid.levels().iter().map(|l| l.scale).collect();
        assert_eq!(scales, vec![1.0, 0.5]);
        assert_eq!(pyramid.levels()[1].image.width(), 32);
    }
}
