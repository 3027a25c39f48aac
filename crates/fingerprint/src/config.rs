use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    algorithms::{FixedThresholdBinarizer, GuoHallThinning, OtsuBinarizer, ZhangSuenThinning},
    error::{FingerprintError, Result},
    matching::{AcceptancePolicy, MatchConfig},
    traits::{Binarizer, Skeletonizer},
};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThinningAlgorithm {
    #[default]
    ZhangSuen,
    GuoHall,
}

impl ThinningAlgorithm {
    pub fn skeletonizer(self) -> Box<dyn Skeletonizer> {
        match self {
            Self::ZhangSuen => Box::new(ZhangSuenThinning),
            Self::GuoHall => Box::new(GuoHallThinning),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "level", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Global Otsu level computed per image
    #[default]
    Otsu,
    /// Fixed global level
    Fixed(u8),
}

impl ThresholdMethod {
    pub fn binarizer(self) -> Box<dyn Binarizer> {
        match self {
            Self::Otsu => Box::new(OtsuBinarizer),
            Self::Fixed(threshold) => Box::new(FixedThresholdBinarizer { threshold }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Odd Gaussian kernel size; 1 disables smoothing
    pub blur_kernel_size: u32,
    pub threshold: ThresholdMethod,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            threshold: ThresholdMethod::Otsu,
        }
    }
}

/// Engine-wide settings, loadable from TOML or JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    pub preprocessing: PreprocessingConfig,
    pub thinning: ThinningAlgorithm,
    pub matching: MatchConfig,
    pub acceptance: AcceptancePolicy,
}

impl EngineConfig {
    /// JSON schema of the config file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn validate(&self) -> Result<()> {
        let kernel = self.preprocessing.blur_kernel_size;
        if kernel == 0 || kernel % 2 == 0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "preprocessing.blur_kernel_size must be odd and positive, got {kernel}"
            )));
        }

        let tolerance = self.matching.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "matching.tolerance must be a finite non-negative number, got {tolerance}"
            )));
        }

        let threshold = self.acceptance.threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(FingerprintError::InvalidConfig(format!(
                "acceptance.threshold must lie in [0, 100], got {threshold}"
            )));
        }

        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format from the extension and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(FingerprintError::UnsupportedConfigFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration, picking the format from the extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(FingerprintError::UnsupportedConfigFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}
