pub mod builder;

use image::GrayImage;
use tracing::debug;
use crate::{
    config::EngineConfig,
    error::Result,
    template::Template,
    traits::{Binarizer, ImagePreprocessor, MinutiaeDetector, Skeletonizer},
    types::{BinaryMask, MinutiaPoint, Skeleton},
};

/// Everything one extraction pass produced
#[derive(Debug, Clone)]
pub struct Extraction {
    pub skeleton: Skeleton,
    /// Minutiae in raster order
    pub minutiae: Vec<MinutiaPoint>,
    pub template: Template,
    pub image_width: u32,
    pub image_height: u32,
}

/// Image to template extraction with swappable stages
pub struct Pipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    binarizer: Box<dyn Binarizer>,
    skeletonizer: Box<dyn Skeletonizer>,
    detector: Box<dyn MinutiaeDetector>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Validate `config` and build the pipeline it describes
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        builder::PipelineBuilder::build_from_config(config)
    }

    /// Create a new pipeline with the given components
    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        binarizer: Box<dyn Binarizer>,
        skeletonizer: Box<dyn Skeletonizer>,
        detector: Box<dyn MinutiaeDetector>,
    ) -> Self {
        Self {
            preprocessors,
            binarizer,
            skeletonizer,
            detector,
        }
    }

    /// Filter and binarize the image. The mask always has the image's dimensions.
    pub fn binarize(&self, image: &GrayImage) -> Result<BinaryMask> {
        let mut filtered = image.clone();
        for preprocessor in &self.preprocessors {
            filtered = preprocessor.preprocess(&filtered)?;
        }

        let mask = self.binarizer.binarize(&filtered)?;
        mask.ensure_dimensions(image.width(), image.height())?;
        Ok(mask)
    }

    pub fn skeletonize(&self, mask: &BinaryMask) -> Result<Skeleton> {
        let skeleton = self.skeletonizer.skeletonize(mask)?;
        skeleton.as_mask().ensure_dimensions(mask.width(), mask.height())?;
        Ok(skeleton)
    }

    pub fn detect(&self, skeleton: &Skeleton) -> Vec<MinutiaPoint> {
        self.detector.detect(skeleton)
    }

    /// Run the image through every stage
    pub fn process(&self, image: &GrayImage) -> Result<Extraction> {
        let mask = self.binarize(image)?;
        let skeleton = self.skeletonize(&mask)?;
        let minutiae = self.detect(&skeleton);
        let template = Template::from_minutiae(&minutiae);

        debug!(
            width = image.width(),
            height = image.height(),
            foreground = mask.foreground_count(),
            skeleton = skeleton.pixel_count(),
            minutiae = minutiae.len(),
            "extraction finished"
        );

        Ok(Extraction {
            skeleton,
            minutiae,
            template,
            image_width: image.width(),
            image_height: image.height(),
        })
    }

    /// Shortcut for `process(image)?.template`
    pub fn extract_template(&self, image: &GrayImage) -> Result<Template> {
        Ok(self.process(image)?.template)
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} preprocessors, 1 binarizer, 1 skeletonizer, 1 minutiae detector",
            self.preprocessors.len()
        )
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::build_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::OtsuBinarizer, error::FingerprintError};
    use image::Luma;

    /// Ignores the image and returns a mask one column too wide
    struct WideBinarizer;

    impl Binarizer for WideBinarizer {
        fn binarize(&self, image: &GrayImage) -> Result<BinaryMask> {
            Ok(BinaryMask::new(image.width() + 1, image.height()))
        }
    }

    /// Returns a 1x1 skeleton whatever the mask size
    struct CollapsingSkeletonizer;

    impl Skeletonizer for CollapsingSkeletonizer {
        fn skeletonize(&self, _mask: &BinaryMask) -> Result<Skeleton> {
            Ok(Skeleton::from_mask(BinaryMask::new(1, 1)))
        }
    }

    fn test_image() -> GrayImage {
        GrayImage::from_fn(12, 8, |x, _| Luma([if x < 6 { 20 } else { 220 }]))
    }

    #[test]
    fn test_wrongly_sized_mask_is_rejected() {
        let pipeline = Pipeline::builder().set_binarizer(WideBinarizer).build();
        let err = pipeline.process(&test_image()).unwrap_err();
        assert!(matches!(
            err,
            FingerprintError::DimensionMismatch {
                expected_width: 12,
                expected_height: 8,
                actual_width: 13,
                actual_height: 8,
            }
        ));
    }

    #[test]
    fn test_wrongly_sized_skeleton_is_rejected() {
        let pipeline = Pipeline::builder()
            .set_binarizer(OtsuBinarizer)
            .set_skeletonizer(CollapsingSkeletonizer)
            .build();
        let err = pipeline.process(&test_image()).unwrap_err();
        assert!(matches!(
            err,
            FingerprintError::DimensionMismatch { expected_width: 12, actual_width: 1, .. }
        ));
    }

    #[test]
    fn test_process_keeps_image_dimensions() {
        let extraction = Pipeline::default().process(&test_image()).unwrap();
        assert_eq!((extraction.image_width, extraction.image_height), (12, 8));
        assert_eq!(extraction.skeleton.dimensions(), (12, 8));
    }
}
