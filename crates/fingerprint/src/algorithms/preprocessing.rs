use image::{GrayImage, Luma};
use tracing::debug;
use crate::{
    error::{FingerprintError, Result},
    traits::{Binarizer, ImagePreprocessor},
    types::BinaryMask,
};

/// Gaussian blur with a square kernel whose sigma is derived from its size.
///
/// Sizes up to 7 use the fixed binomial tables (5 is `[1, 4, 6, 4, 1] / 16`);
/// larger sizes use `sigma = 0.3 * ((size - 1) / 2 - 1) + 0.8`. Borders are
/// handled by reflect-101 mirroring.
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub kernel_size: u32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { kernel_size: 5 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let kernel = gaussian_kernel(self.kernel_size)?;
        Ok(separable_blur(image, &kernel))
    }
}

/// 1-D Gaussian kernel of odd `size`, normalized to unit sum
pub fn gaussian_kernel(size: u32) -> Result<Vec<f32>> {
    if size == 0 || size % 2 == 0 {
        return Err(FingerprintError::InvalidConfig(format!(
            "blur kernel size must be odd and positive, got {size}"
        )));
    }

    let kernel = match size {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let center = (size / 2) as f32;
            let scale = -0.5 / (sigma * sigma);
            let weights: Vec<f32> = (0..size)
                .map(|i| {
                    let d = i as f32 - center;
                    (scale * d * d).exp()
                })
                .collect();
            let sum: f32 = weights.iter().sum();
            weights.into_iter().map(|w| w / sum).collect()
        }
    };

    Ok(kernel)
}

fn reflect101(i: i64, len: u32) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * len as i64 - 2;
    let r = i.rem_euclid(period);
    if r < len as i64 {
        r as usize
    } else {
        (period - r) as usize
    }
}

fn separable_blur(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let radius = (kernel.len() / 2) as i64;
    let src = image.as_raw();
    let w = width as usize;

    let mut horizontal = vec![0f32; src.len()];
    for y in 0..height as usize {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = reflect101(x as i64 + k as i64 - radius, width);
                acc += row[sx] as f32 * kv;
            }
            horizontal[y * w + x] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = 0f32;
        for (k, &kv) in kernel.iter().enumerate() {
            let sy = reflect101(y as i64 + k as i64 - radius, height);
            acc += horizontal[sy * w + x as usize] * kv;
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

/// Global Otsu binarization: foreground iff intensity > Otsu level
#[derive(Debug, Clone, Default)]
pub struct OtsuBinarizer;

impl OtsuBinarizer {
    /// The threshold that maximizes inter-class variance over the histogram.
    /// A uniform image thresholds at its only intensity.
    pub fn level(image: &GrayImage) -> u8 {
        let raw = image.as_raw();
        let (min, max) = raw
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if raw.is_empty() || min == max {
            return max;
        }
        imageproc::contrast::otsu_level(image)
    }
}

impl Binarizer for OtsuBinarizer {
    fn binarize(&self, image: &GrayImage) -> Result<BinaryMask> {
        let level = Self::level(image);
        debug!(level, "otsu threshold");
        Ok(BinaryMask::from_gray(&imageproc::contrast::threshold(image, level)))
    }
}

/// Fixed global threshold: foreground iff intensity > threshold
#[derive(Debug, Clone)]
pub struct FixedThresholdBinarizer {
    pub threshold: u8,
}

impl Default for FixedThresholdBinarizer {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl Binarizer for FixedThresholdBinarizer {
    fn binarize(&self, image: &GrayImage) -> Result<BinaryMask> {
        Ok(BinaryMask::from_gray(&imageproc::contrast::threshold(image, self.threshold)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_tables_sum_to_one() {
        for size in [1, 3, 5, 7, 9, 11] {
            let kernel = gaussian_kernel(size).unwrap();
            assert_eq!(kernel.len(), size as usize);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "size {size} sums to {sum}");
        }
    }

    #[test]
    fn test_even_kernel_rejected() {
        assert!(gaussian_kernel(4).is_err());
        assert!(gaussian_kernel(0).is_err());
    }

    #[test]
    fn test_reflect101() {
        let expected = [(-2, 2), (-1, 1), (0, 0), (4, 4), (5, 3), (6, 2)];
        for (i, want) in expected {
            assert_eq!(reflect101(i, 5), want);
        }
        assert_eq!(reflect101(-3, 1), 0);
    }

    #[test]
    fn test_blur_keeps_flat_image_flat() {
        let image = GrayImage::from_pixel(9, 7, Luma([80u8]));
        let blurred = GaussianBlurPreprocessor::default().preprocess(&image).unwrap();
        assert_eq!(blurred.dimensions(), (9, 7));
        assert!(blurred.pixels().all(|p| p[0] == 80));
    }

    #[test]
    fn test_blur_single_spike() {
        let mut image = GrayImage::new(9, 9);
        image.put_pixel(4, 4, Luma([255u8]));
        let blurred = GaussianBlurPreprocessor::default().preprocess(&image).unwrap();
        // 255 * 36 / 256 rounds to 36
        assert_eq!(blurred.get_pixel(4, 4)[0], 36);
        // 255 * 1 / 256 rounds to 1
        assert_eq!(blurred.get_pixel(2, 2)[0], 1);
        assert_eq!(blurred.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn test_otsu_splits_bimodal_image() {
        let image = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([30u8]) } else { Luma([200u8]) });
        let level = OtsuBinarizer::level(&image);
        assert!((30..200).contains(&level));

        let mask = OtsuBinarizer.binarize(&image).unwrap();
        assert_eq!(mask.foreground_count(), 50);
        assert!(mask.get(7, 3));
        assert!(!mask.get(2, 3));
    }

    #[test]
    fn test_otsu_uniform_image_has_no_foreground() {
        let image = GrayImage::from_pixel(6, 6, Luma([120u8]));
        assert_eq!(OtsuBinarizer::level(&image), 120);
        assert_eq!(OtsuBinarizer.binarize(&image).unwrap().foreground_count(), 0);
    }

    #[test]
    fn test_fixed_threshold_is_strict() {
        let image = GrayImage::from_fn(3, 1, |x, _| Luma([[127u8, 128, 129][x as usize]]));
        let mask = FixedThresholdBinarizer::default().binarize(&image).unwrap();
        assert_eq!(mask.pixels(), &[false, false, true]);
    }
}
