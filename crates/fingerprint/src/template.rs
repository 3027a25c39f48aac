//! Normalized minutiae templates and their persisted blob format.
//!
//! Coordinates are divided by the largest x and the largest y found in the
//! same template, each axis on its own. Two templates taken from images of
//! different sizes are therefore only comparable up to the matcher's
//! tolerance; the normalization is not translation or rotation invariant.
//!
//! The blob format is a flat run of little-endian `f32` triples
//! `(x, y, kind)` in minutiae order, with kind stored as `1.0` (ridge ending)
//! or `3.0` (bifurcation).

use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{FingerprintError, Result},
    types::{MinutiaKind, MinutiaPoint},
};

/// Bytes per persisted `(x, y, kind)` triple
pub const TRIPLE_BYTES: usize = 3 * std::mem::size_of::<f32>();

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplatePoint {
    pub x: f32,
    pub y: f32,
    pub kind: MinutiaKind,
}

impl TemplatePoint {
    pub fn new(x: f32, y: f32, kind: MinutiaKind) -> Self {
        Self { x, y, kind }
    }

    /// Euclidean distance in normalized coordinates
    pub fn distance_to(&self, other: &TemplatePoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An ordered, normalized minutiae set. An empty template means "no biometric
/// signal" and never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Template {
    points: Vec<TemplatePoint>,
}

impl Template {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap already normalized points as-is
    pub fn from_points(points: Vec<TemplatePoint>) -> Self {
        Self { points }
    }

    /// Normalize pixel-space minutiae by the per-template axis maxima.
    ///
    /// An axis whose maximum is zero stays at `0.0`.
    pub fn from_minutiae(minutiae: &[MinutiaPoint]) -> Self {
        if minutiae.is_empty() {
            warn!("no minutiae detected, template is empty");
            return Self::empty();
        }

        let max_x = minutiae.iter().map(|m| m.x).max().unwrap_or(0) as f32;
        let max_y = minutiae.iter().map(|m| m.y).max().unwrap_or(0) as f32;
        let scale = |v: u32, max: f32| if max > 0.0 { v as f32 / max } else { 0.0 };

        let points = minutiae
            .iter()
            .map(|m| TemplatePoint::new(scale(m.x, max_x), scale(m.y, max_y), m.kind))
            .collect();

        Self { points }
    }

    pub fn points(&self) -> &[TemplatePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemplatePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Serialize into the flat `f32` triple blob
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.points.len() * TRIPLE_BYTES);
        for point in &self.points {
            bytes.extend_from_slice(&point.x.to_le_bytes());
            bytes.extend_from_slice(&point.y.to_le_bytes());
            bytes.extend_from_slice(&point.kind.code().to_le_bytes());
        }
        bytes
    }

    /// Parse a flat `f32` triple blob. Lengths that are not a whole number of
    /// triples and unknown kind codes are rejected rather than truncated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % TRIPLE_BYTES != 0 {
            return Err(FingerprintError::MalformedTemplate(format!(
                "blob length {} is not a multiple of {TRIPLE_BYTES}",
                bytes.len()
            )));
        }

        let read = |chunk: &[u8]| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let points = bytes
            .chunks_exact(TRIPLE_BYTES)
            .map(|triple| {
                let kind = MinutiaKind::from_code(read(&triple[8..12]))?;
                Ok(TemplatePoint::new(read(&triple[0..4]), read(&triple[4..8]), kind))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { points })
    }

    /// Write the blob to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Read a blob from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a TemplatePoint;
    type IntoIter = std::slice::Iter<'a, TemplatePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MinutiaKind::{Bifurcation, RidgeEnding};

    #[test]
    fn test_empty_minutiae_give_empty_template() {
        let template = Template::from_minutiae(&[]);
        assert!(template.is_empty());
        assert!(template.to_bytes().is_empty());
    }

    #[test]
    fn test_normalizes_each_axis_by_its_own_max() {
        let minutiae = [
            MinutiaPoint::new(10, 40, RidgeEnding),
            MinutiaPoint::new(20, 10, Bifurcation),
            MinutiaPoint::new(5, 20, RidgeEnding),
        ];
        let template = Template::from_minutiae(&minutiae);
        assert_eq!(
            template.points(),
            &[
                TemplatePoint::new(0.5, 1.0, RidgeEnding),
                TemplatePoint::new(1.0, 0.25, Bifurcation),
                TemplatePoint::new(0.25, 0.5, RidgeEnding),
            ]
        );
    }

    #[test]
    fn test_single_minutia_normalizes_to_one() {
        let template = Template::from_minutiae(&[MinutiaPoint::new(7, 3, Bifurcation)]);
        assert_eq!(template.points(), &[TemplatePoint::new(1.0, 1.0, Bifurcation)]);
    }

    #[test]
    fn test_zero_axis_maximum_stays_zero() {
        let template = Template::from_minutiae(&[MinutiaPoint::new(0, 4, RidgeEnding)]);
        assert_eq!(template.points(), &[TemplatePoint::new(0.0, 1.0, RidgeEnding)]);
    }

    #[test]
    fn test_blob_layout() {
        let template = Template::from_points(vec![
            TemplatePoint::new(0.5, 0.25, RidgeEnding),
            TemplatePoint::new(1.0, 0.75, Bifurcation),
        ]);
        let bytes = template.to_bytes();
        assert_eq!(bytes.len(), 2 * TRIPLE_BYTES);
        assert_eq!(&bytes[0..4], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &3.0f32.to_le_bytes());
        assert_eq!(Template::from_bytes(&bytes).unwrap(), template);
    }

    #[test]
    fn test_truncated_blob_is_rejected() {
        let bytes = Template::from_points(vec![TemplatePoint::new(1.0, 1.0, RidgeEnding)]).to_bytes();
        let err = Template::from_bytes(&bytes[..10]).unwrap_err();
        assert!(matches!(err, FingerprintError::MalformedTemplate(_)));
    }

    #[test]
    fn test_unknown_kind_code_is_rejected() {
        let mut bytes = Vec::new();
        for v in [0.5f32, 0.5, 2.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert!(Template::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.tpl");
        let template = Template::from_points(vec![TemplatePoint::new(0.1, 0.9, Bifurcation)]);
        template.save(&path).unwrap();
        assert_eq!(Template::load(&path).unwrap(), template);
    }
}
