use thiserror::Error;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Buffer of length {len} does not describe a {width}x{height} grid")]
    InvalidBufferLength { width: u32, height: u32, len: usize },

    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("Invalid identifier {0:?}: must be non-empty and contain no path separators")]
    InvalidIdentifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported config format. Please use .toml or .json files")]
    UnsupportedConfigFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
