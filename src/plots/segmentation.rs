//! Semantic segmentation masks: class-id decoding and alpha blending.
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use log::debug;

use super::RenderError;

/// Cityscapes train-id colors, indexed by train id.
pub const CITYSCAPES_PALETTE: [[u8; 3]; 19] = [
    [128, 64, 128],  // road
    [244, 35, 232],  // sidewalk
    [70, 70, 70],    // building
    [102, 102, 156], // wall
    [190, 153, 153], // fence
    [153, 153, 153], // pole
    [250, 170, 30],  // traffic light
    [220, 220, 0],   // traffic sign
    [107, 142, 35],  // vegetation
    [152, 251, 152], // terrain
    [70, 130, 180],  // sky
    [220, 20, 60],   // person
    [255, 0, 0],     // rider
    [0, 0, 142],     // car
    [0, 0, 70],      // truck
    [0, 60, 100],    // bus
    [0, 80, 100],    // train
    [0, 0, 230],     // motorcycle
    [119, 11, 32],   // bicycle
];

fn palette_for(dataset: &str) -> Result<&'static [[u8; 3]], RenderError> {
    match dataset {
        "cityscapes" => Ok(&CITYSCAPES_PALETTE),
        other => Err(RenderError::UnsupportedDataset(other.to_string())),
    }
}

/// Color a class-id mask with the dataset palette. Ids outside the palette become black.
pub fn decode_segmap(mask: &GrayImage, dataset: &str) -> Result<RgbImage, RenderError> {
    let palette = palette_for(dataset)?;

    let colored = RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let class_id = mask.get_pixel(x, y)[0] as usize;
        Rgb(palette.get(class_id).copied().unwrap_or([0, 0, 0]))
    });
    Ok(colored)
}

/// `base * (1 - alpha) + overlay * alpha`, with `overlay` resized to `base` first.
pub fn blend(base: &RgbImage, overlay: &RgbImage, alpha: f32) -> Result<RgbImage, RenderError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(RenderError::InvalidAlpha(alpha));
    }

    let resized;
    let overlay = if overlay.dimensions() == base.dimensions() {
        overlay
    } else {
        debug!(
            "Resizing segmentation {:?} to capture {:?}",
            overlay.dimensions(),
            base.dimensions()
        );
        resized = imageops::resize(overlay, base.width(), base.height(), FilterType::Nearest);
        &resized
    };

    let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha).round().clamp(0.0, 255.0) as u8;
    let blended = RgbImage::from_fn(base.width(), base.height(), |x, y| {
        let a = base.get_pixel(x, y);
        let b = overlay.get_pixel(x, y);
        Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
    });
    Ok(blended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_decode_cityscapes() {
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(0, 0, Luma([0]));
        mask.put_pixel(1, 0, Luma([13]));
        mask.put_pixel(2, 0, Luma([255]));

        let colored = decode_segmap(&mask, "cityscapes").unwrap();
        assert_eq!(*colored.get_pixel(0, 0), Rgb([128, 64, 128]));
        assert_eq!(*colored.get_pixel(1, 0), Rgb([0, 0, 142]));
        assert_eq!(*colored.get_pixel(2, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_decode_unsupported_dataset() {
        let err = decode_segmap(&GrayImage::new(1, 1), "pascal").unwrap_err();
        assert_eq!(err.to_string(), "Dataset 'pascal' is not supported.");
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let base = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let overlay = RgbImage::from_pixel(4, 4, Rgb([200, 0, 50]));

        assert_eq!(blend(&base, &overlay, 0.0).unwrap(), base);
        assert_eq!(blend(&base, &overlay, 1.0).unwrap(), overlay);
        assert_eq!(*blend(&base, &overlay, 0.5).unwrap().get_pixel(1, 1), Rgb([150, 50, 75]));
    }

    #[test]
    fn test_blend_resizes_overlay() {
        let base = RgbImage::from_pixel(8, 6, Rgb([0, 0, 0]));
        let overlay = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));

        let blended = blend(&base, &overlay, 0.5).unwrap();
        assert_eq!(blended.dimensions(), (8, 6));
        assert_eq!(*blended.get_pixel(7, 5), Rgb([100, 100, 100]));
    }

    #[test]
    fn test_blend_rejects_bad_alpha() {
        let image = RgbImage::new(1, 1);
        assert!(matches!(blend(&image, &image, 1.5), Err(RenderError::InvalidAlpha(_))));
        assert!(blend(&image, &image, f32::NAN).is_err());
    }
}
