use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::types::{MinutiaKind, MinutiaPoint};

pub const RIDGE_ENDING_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const BIFURCATION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const MARKER_RADIUS: i32 = 3;

/// Overlay minutiae on the source image: blue dots for ridge endings, red
/// dots for bifurcations.
pub fn draw_minutiae(image: &GrayImage, minutiae: &[MinutiaPoint]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    for minutia in minutiae {
        let color = match minutia.kind {
            MinutiaKind::RidgeEnding => RIDGE_ENDING_COLOR,
            MinutiaKind::Bifurcation => BIFURCATION_COLOR,
        };
        draw_filled_circle_mut(&mut canvas, (minutia.x as i32, minutia.y as i32), MARKER_RADIUS, color);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_markers_use_kind_colors() {
        let image = GrayImage::from_pixel(20, 20, Luma([128u8]));
        let minutiae = [
            MinutiaPoint::new(5, 5, MinutiaKind::RidgeEnding),
            MinutiaPoint::new(14, 14, MinutiaKind::Bifurcation),
        ];
        let overlay = draw_minutiae(&image, &minutiae);

        assert_eq!(overlay.dimensions(), (20, 20));
        assert_eq!(*overlay.get_pixel(5, 5), RIDGE_ENDING_COLOR);
        assert_eq!(*overlay.get_pixel(5, 7), RIDGE_ENDING_COLOR);
        assert_eq!(*overlay.get_pixel(14, 14), BIFURCATION_COLOR);
        assert_eq!(*overlay.get_pixel(0, 19), Rgb([128, 128, 128]));
    }
}
