pub mod preprocessing;
pub mod thinning;
pub mod detection;

pub use preprocessing::*;
pub use thinning::*;
pub use detection::*;

use image::GrayImage;
use crate::{
    error::Result,
    template::Template,
    traits::{Binarizer, ImagePreprocessor, MinutiaeDetector, Skeletonizer},
};

/// Statically dispatched extractor for callers that know their stages at
/// compile time. [`crate::Pipeline`] is the boxed, configurable equivalent.
#[derive(Debug)]
pub struct StandardTemplateExtractor<P, B, S, D>
where
    P: ImagePreprocessor,
    B: Binarizer,
    S: Skeletonizer,
    D: MinutiaeDetector,
{
    pub preprocessor: P,
    pub binarizer: B,
    pub skeletonizer: S,
    pub detector: D,
}

impl<P, B, S, D> StandardTemplateExtractor<P, B, S, D>
where
    P: ImagePreprocessor,
    B: Binarizer,
    S: Skeletonizer,
    D: MinutiaeDetector,
{
    pub fn new(preprocessor: P, binarizer: B, skeletonizer: S, detector: D) -> Self {
        Self {
            preprocessor,
            binarizer,
            skeletonizer,
            detector,
        }
    }

    /// Run every stage and normalize the detected minutiae
    pub fn extract_template(&self, image: &GrayImage) -> Result<Template> {
        let filtered = self.preprocessor.preprocess(image)?;
        let mask = self.binarizer.binarize(&filtered)?;
        mask.ensure_dimensions(image.width(), image.height())?;
        let skeleton = self.skeletonizer.skeletonize(&mask)?;
        let minutiae = self.detector.detect(&skeleton);
        Ok(Template::from_minutiae(&minutiae))
    }
}

/// Blur, Otsu, Zhang–Suen, crossing number
pub type DefaultTemplateExtractor = StandardTemplateExtractor<
    GaussianBlurPreprocessor,
    OtsuBinarizer,
    ZhangSuenThinning,
    CrossingNumberDetector,
>;

impl Default for DefaultTemplateExtractor {
    fn default() -> Self {
        Self::new(
            GaussianBlurPreprocessor::default(),
            OtsuBinarizer,
            ZhangSuenThinning,
            CrossingNumberDetector,
        )
    }
}
