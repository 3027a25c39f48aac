//! # Fingerprint Minutiae Engine
//!
//! Turns a grayscale fingerprint image into a compact minutiae template and
//! scores how similar two templates are.
//!
//! ## Pipeline
//!
//! 1. **Preprocess**: 5x5 Gaussian blur, then a global Otsu threshold
//! 2. **Skeletonize**: parallel thinning down to 1-pixel ridge centerlines
//! 3. **Detect**: ridge endings and bifurcations by neighbour count
//! 4. **Template**: coordinates normalized by the template's own maxima
//! 5. **Compare**: greedy tolerance matching, score in [0, 100]
//!
//! Every stage is a pure function of its input; running the same image twice
//! yields identical minutiae in identical order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fingerprint::{Pipeline, Matcher, io::load_ridge_image};
//!
//! let pipeline = Pipeline::default();
//! let probe = pipeline.extract_template(&load_ridge_image("probe.bmp")?)?;
//! let enrolled = pipeline.extract_template(&load_ridge_image("enrolled.bmp")?)?;
//!
//! let score = Matcher::default().compare(&probe, &enrolled);
//! println!("similarity: {score}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use fingerprint::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_gaussian_blur(7)
//!     .set_binarizer(FixedThresholdBinarizer { threshold: 110 })
//!     .set_skeletonizer(GuoHallThinning)
//!     .build();
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod template;
pub mod matching;
pub mod pipeline;
pub mod config;
pub mod store;
pub mod verification;
pub mod io;
pub mod render;

// Re-exports for convenience
pub use error::{FingerprintError, Result};
pub use types::{BinaryMask, MinutiaKind, MinutiaPoint, Skeleton};
pub use traits::*;
pub use template::{Template, TemplatePoint};
pub use matching::{AcceptancePolicy, MatchConfig, MatchScore, MatchStrategy, Matcher};
pub use pipeline::{Extraction, Pipeline, builder::PipelineBuilder};
pub use config::EngineConfig;
pub use store::{DirectoryTemplateStore, InMemoryTemplateStore, StoredTemplate, TemplateStore};
pub use verification::{TemplateScore, VerificationOutcome, VerificationStatus, Verifier};

use algorithms::{CrossingNumberDetector, GaussianBlurPreprocessor, OtsuBinarizer, ZhangSuenThinning};
use image::GrayImage;

/// Default preprocessing: 5x5 Gaussian blur then Otsu binarization
pub fn preprocess(image: &GrayImage) -> Result<BinaryMask> {
    let blurred = GaussianBlurPreprocessor::default().preprocess(image)?;
    let mask = OtsuBinarizer.binarize(&blurred)?;
    mask.ensure_dimensions(image.width(), image.height())?;
    Ok(mask)
}

/// Default thinning (Zhang–Suen)
pub fn skeletonize(mask: &BinaryMask) -> Result<Skeleton> {
    ZhangSuenThinning.skeletonize(mask)
}

/// Default minutiae detection, raster order
pub fn detect(skeleton: &Skeleton) -> Vec<MinutiaPoint> {
    CrossingNumberDetector.detect(skeleton)
}

/// Normalize minutiae into a template; empty input gives an empty template
pub fn build_template(minutiae: &[MinutiaPoint]) -> Template {
    Template::from_minutiae(minutiae)
}

/// Greedy comparison with the engine default tolerance unless `tolerance`
/// overrides it
pub fn compare(probe: &Template, reference: &Template, tolerance: Option<f32>) -> MatchScore {
    Matcher::default().compare_with_tolerance(probe, reference, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn create_ridge_image() -> GrayImage {
        // Two dark-background horizontal ridges, the lower one forking
        let mut img = GrayImage::new(60, 40);
        for x in 8..52 {
            for y in 10..14 {
                img.put_pixel(x, y, Luma([220u8]));
            }
        }
        for x in 8..30 {
            for y in 24..28 {
                img.put_pixel(x, y, Luma([220u8]));
            }
        }
        for i in 0..20u32 {
            for w in 0..4 {
                img.put_pixel(30 + i, 24 - i / 2 + w, Luma([220u8]));
                img.put_pixel(30 + i, 26 + i / 2 + w - 2, Luma([220u8]));
            }
        }
        img
    }

    #[test]
    fn test_free_functions_match_default_pipeline() {
        let image = create_ridge_image();
        let minutiae = detect(&skeletonize(&preprocess(&image).unwrap()).unwrap());
        let extraction = Pipeline::default().process(&image).unwrap();

        assert_eq!(minutiae, extraction.minutiae);
        assert_eq!(build_template(&minutiae), extraction.template);
        assert!(!minutiae.is_empty());
    }

    #[test]
    fn test_static_extractor_matches_pipeline() {
        let image = create_ridge_image();
        let template = algorithms::DefaultTemplateExtractor::default()
            .extract_template(&image)
            .unwrap();
        assert_eq!(template, Pipeline::default().extract_template(&image).unwrap());
    }

    #[test]
    fn test_compare_uses_default_tolerance() {
        let a = Template::from_points(vec![TemplatePoint::new(0.5, 0.5, MinutiaKind::RidgeEnding)]);
        let b = Template::from_points(vec![TemplatePoint::new(0.53, 0.5, MinutiaKind::RidgeEnding)]);
        assert_eq!(compare(&a, &b, None).value(), 100.0);
        assert_eq!(compare(&a, &b, Some(0.01)).value(), 0.0);
    }
}
