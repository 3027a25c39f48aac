use image::GrayImage;
use crate::{
    error::Result,
    types::{BinaryMask, MinutiaPoint, Skeleton},
};

/// Trait for grayscale image filters applied before binarization
pub trait ImagePreprocessor: Send + Sync {
    /// Filter the input image (e.g., blur); output keeps the input dimensions
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for turning a filtered grayscale image into a ridge mask
pub trait Binarizer: Send + Sync {
    /// Mark ridge pixels as foreground
    fn binarize(&self, image: &GrayImage) -> Result<BinaryMask>;
}

/// Trait for morphological thinning algorithms
pub trait Skeletonizer: Send + Sync {
    /// Thin the mask down to single-pixel ridge centerlines
    fn skeletonize(&self, mask: &BinaryMask) -> Result<Skeleton>;
}

/// Trait for minutiae detection on a skeleton
pub trait MinutiaeDetector: Send + Sync {
    /// Detect minutiae in raster order
    fn detect(&self, skeleton: &Skeleton) -> Vec<MinutiaPoint>;
}
