use std::path::{Path, PathBuf};

use fingerprint::{
    EngineConfig, Extraction, FingerprintError, Pipeline, Template,
    io::load_ridge_image, store::TEMPLATE_EXTENSION,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error("No minutiae found in {0}")]
    NoSignal(PathBuf),
}

/// Where a template comes from on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
    /// A stored `.tpl` blob
    Blob(PathBuf),
    /// An image that still needs extraction
    Image(PathBuf),
}

impl TemplateSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION) => Self::Blob(path.to_path_buf()),
            _ => Self::Image(path.to_path_buf()),
        }
    }

    pub fn load(&self, pipeline: &Pipeline) -> Result<Template, CliError> {
        match self {
            Self::Blob(path) => Ok(Template::load(path)?),
            Self::Image(path) => Ok(extract(pipeline, path)?.template),
        }
    }
}

/// Load the config file if given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

pub fn build_pipeline(config: &EngineConfig) -> Result<Pipeline, CliError> {
    Ok(Pipeline::from_config(config)?)
}

pub fn extract(pipeline: &Pipeline, image_path: &Path) -> Result<Extraction, CliError> {
    let image = load_ridge_image(image_path)?;
    Ok(pipeline.process(&image)?)
}

/// Machine readable summary printed by `extract --json`
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub ridge_endings: usize,
    pub bifurcations: usize,
    pub template_points: usize,
}

impl ExtractionSummary {
    pub fn new(image: &Path, extraction: &Extraction) -> Self {
        let ridge_endings = extraction
            .minutiae
            .iter()
            .filter(|m| m.kind == fingerprint::MinutiaKind::RidgeEnding)
            .count();
        Self {
            image: image.display().to_string(),
            width: extraction.image_width,
            height: extraction.image_height,
            ridge_endings,
            bifurcations: extraction.minutiae.len() - ridge_endings,
            template_points: extraction.template.len(),
        }
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
