use tracing::debug;

use crate::{
    algorithms::{CrossingNumberDetector, GaussianBlurPreprocessor, OtsuBinarizer, ZhangSuenThinning},
    config::EngineConfig,
    error::Result,
    pipeline::Pipeline,
    traits::{Binarizer, ImagePreprocessor, MinutiaeDetector, Skeletonizer},
};

/// Builder for creating extraction pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    binarizer: Option<Box<dyn Binarizer>>,
    skeletonizer: Option<Box<dyn Skeletonizer>>,
    detector: Option<Box<dyn MinutiaeDetector>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            binarizer: None,
            skeletonizer: None,
            detector: None,
        }
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Add a Gaussian blur with the given odd kernel size
    pub fn with_gaussian_blur(self, kernel_size: u32) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { kernel_size })
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.set_boxed_binarizer(Box::new(binarizer))
    }

    pub fn set_boxed_binarizer(mut self, binarizer: Box<dyn Binarizer>) -> Self {
        self.binarizer = Some(binarizer);
        self
    }

    /// Set the thinning algorithm (replaces any existing one)
    pub fn set_skeletonizer<S>(self, skeletonizer: S) -> Self
    where
        S: Skeletonizer + 'static,
    {
        self.set_boxed_skeletonizer(Box::new(skeletonizer))
    }

    pub fn set_boxed_skeletonizer(mut self, skeletonizer: Box<dyn Skeletonizer>) -> Self {
        self.skeletonizer = Some(skeletonizer);
        self
    }

    /// Set the minutiae detector (replaces any existing one)
    pub fn set_detector<D>(mut self, detector: D) -> Self
    where
        D: MinutiaeDetector + 'static,
    {
        self.detector = Some(Box::new(detector));
        self
    }

    /// Build the pipeline with default components if not specified.
    /// No preprocessors are added implicitly.
    pub fn build(self) -> Pipeline {
        let binarizer = self.binarizer
            .unwrap_or_else(|| Box::new(OtsuBinarizer));

        let skeletonizer = self.skeletonizer
            .unwrap_or_else(|| Box::new(ZhangSuenThinning));

        let detector = self.detector
            .unwrap_or_else(|| Box::new(CrossingNumberDetector));

        Pipeline::new(self.preprocessors, binarizer, skeletonizer, detector)
    }

    /// 5x5 Gaussian blur, Otsu, Zhang–Suen, crossing number
    pub fn build_default() -> Pipeline {
        Self::new().with_gaussian_blur(5).build()
    }

    /// Build the pipeline described by a validated config
    pub fn build_from_config(config: &EngineConfig) -> Result<Pipeline> {
        config.validate()?;
        debug!(
            thinning = %config.thinning,
            blur_kernel_size = config.preprocessing.blur_kernel_size,
            "building pipeline from config"
        );
        let pipeline = Self::new()
            .with_gaussian_blur(config.preprocessing.blur_kernel_size)
            .set_boxed_binarizer(config.preprocessing.threshold.binarizer())
            .set_boxed_skeletonizer(config.thinning.skeletonizer())
            .build();
        Ok(pipeline)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
