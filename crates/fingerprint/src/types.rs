use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::{FingerprintError, Result};

/// Offsets of the 8-neighbourhood, clockwise starting north.
pub(crate) const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// A row-major grid of booleans where `true` marks ridge foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl BinaryMask {
    /// Create an all-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width as usize * height as usize],
        }
    }

    /// Wrap a row-major pixel buffer, rejecting buffers of the wrong length
    pub fn from_vec(width: u32, height: u32, pixels: Vec<bool>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(FingerprintError::InvalidBufferLength {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Treat every non-zero pixel of a grayscale image as foreground
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.as_raw().iter().map(|&v| v > 0).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel value; anything outside the grid reads as background.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn clear(&mut self, x: u32, y: u32) {
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels[idx] = false;
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Number of foreground pixels
    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Fail with `DimensionMismatch` unless the mask is `width` x `height`
    pub fn ensure_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if self.dimensions() != (width, height) {
            return Err(FingerprintError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                actual_width: self.width,
                actual_height: self.height,
            });
        }
        Ok(())
    }

    /// Render as a 0/255 grayscale image
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x as i64, y as i64) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

/// Ridge centerlines left after thinning a [`BinaryMask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    mask: BinaryMask,
}

impl Skeleton {
    /// Treat `mask` as an already thinned skeleton
    pub fn from_mask(mask: BinaryMask) -> Self {
        Self { mask }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    pub fn get(&self, x: i64, y: i64) -> bool {
        self.mask.get(x, y)
    }

    /// Number of set pixels in the 8-neighbourhood of `(x, y)`, center excluded
    pub fn neighbor_count(&self, x: u32, y: u32) -> u8 {
        NEIGHBOR_OFFSETS
            .iter()
            .filter(|(dx, dy)| self.mask.get(x as i64 + dx, y as i64 + dy))
            .count() as u8
    }

    pub fn pixel_count(&self) -> usize {
        self.mask.foreground_count()
    }

    pub fn as_mask(&self) -> &BinaryMask {
        &self.mask
    }

    pub fn into_mask(self) -> BinaryMask {
        self.mask
    }

    pub fn to_gray_image(&self) -> GrayImage {
        self.mask.to_gray_image()
    }
}

/// Minutia classification. The numeric code is the neighbour count that
/// produced it and is the value persisted in stored templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MinutiaKind {
    RidgeEnding,
    Bifurcation,
}

impl MinutiaKind {
    /// Persisted numeric code
    pub fn code(self) -> f32 {
        match self {
            Self::RidgeEnding => 1.0,
            Self::Bifurcation => 3.0,
        }
    }

    /// Decode a persisted code; only exact `1.0` and `3.0` are valid
    pub fn from_code(code: f32) -> Result<Self> {
        if code == 1.0 {
            Ok(Self::RidgeEnding)
        } else if code == 3.0 {
            Ok(Self::Bifurcation)
        } else {
            Err(FingerprintError::MalformedTemplate(format!(
                "unknown minutia kind code {code}"
            )))
        }
    }

    /// Classify a skeleton pixel by its neighbour count
    pub fn from_neighbor_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(Self::RidgeEnding),
            3 => Some(Self::Bifurcation),
            _ => None,
        }
    }
}

/// A minutia in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MinutiaPoint {
    pub x: u32,
    pub y: u32,
    pub kind: MinutiaKind,
}

impl MinutiaPoint {
    pub fn new(x: u32, y: u32, kind: MinutiaKind) -> Self {
        Self { x, y, kind }
    }
}
