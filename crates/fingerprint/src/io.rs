//! Image decoding for the engine's input boundary. Decode failures surface
//! here, before any pipeline stage runs.

use std::path::Path;

use image::GrayImage;
use tracing::debug;

use crate::error::Result;

/// Load a ridge image from file as 8-bit grayscale
pub fn load_ridge_image<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let path = path.as_ref();
    let image = image::open(path)?.to_luma8();
    debug!(path = %path.display(), width = image.width(), height = image.height(), "ridge image loaded");
    Ok(image)
}

/// Decode an in-memory encoded image as 8-bit grayscale
pub fn load_ridge_image_from_bytes(bytes: &[u8]) -> Result<GrayImage> {
    Ok(image::load_from_memory(bytes)?.to_luma8())
}
