use tracing::debug;
use crate::{
    traits::MinutiaeDetector,
    types::{MinutiaKind, MinutiaPoint, Skeleton},
};

/// Crossing-number style detector: classifies interior skeleton pixels by the
/// number of set pixels in their 8-neighbourhood (1 = ridge ending,
/// 3 = bifurcation). Border pixels are never classified and adjacent
/// detections are not merged.
#[derive(Debug, Clone, Default)]
pub struct CrossingNumberDetector;

impl MinutiaeDetector for CrossingNumberDetector {
    fn detect(&self, skeleton: &Skeleton) -> Vec<MinutiaPoint> {
        let (width, height) = skeleton.dimensions();
        if width < 3 || height < 3 {
            return Vec::new();
        }

        let mut minutiae = Vec::new();
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                if !skeleton.get(x as i64, y as i64) {
                    continue;
                }
                if let Some(kind) = MinutiaKind::from_neighbor_count(skeleton.neighbor_count(x, y)) {
                    minutiae.push(MinutiaPoint::new(x, y, kind));
                }
            }
        }

        debug!(
            endings = minutiae.iter().filter(|m| m.kind == MinutiaKind::RidgeEnding).count(),
            bifurcations = minutiae.iter().filter(|m| m.kind == MinutiaKind::Bifurcation).count(),
            "minutiae detected"
        );
        minutiae
    }
}
