use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::Sprite;
use crate::CloudError;

/// Weights divided by their sum. The inputs are left untouched.
pub fn normalized_weights(weights: &[f64]) -> Result<Vec<f64>, CloudError> {
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() {
        return Err(CloudError::WeightSumOverflow);
    }
    if sum <= 0.0 {
        return Err(CloudError::ZeroWeightSum);
    }
    Ok(weights.iter().map(|weight| weight / sum).collect())
}

/// Linear zoom shared by every emoji so that the weighted bitmap areas add up
/// to the canvas area, loosened by `relax_ratio`.
pub(crate) fn zoom_ratio(
    areas: &[f64],
    normalized: &[f64],
    canvas_area: f64,
    relax_ratio: f64,
) -> f64 {
    let norm_area_sum: f64 = areas.iter().zip(normalized).map(|(area, w)| area * w * w).sum();
    if norm_area_sum <= 0.0 {
        return 0.0;
    }
    (canvas_area / norm_area_sum).sqrt() / relax_ratio
}

/// Scaled size, floored, never smaller than one pixel per side.
pub fn resized_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scaled = |side: u32| ((f64::from(side) * scale).floor() as u32).max(1);
    (scaled(width), scaled(height))
}

/// A sprite bitmap scaled for one layout attempt.
#[derive(Clone, Debug)]
pub(crate) struct ResizedEmoji<'a> {
    pub unicode: &'a str,
    pub scale: f64,
    pub bitmap: RgbaImage,
}

/// Resizes every sprite for `relax_ratio`, heaviest first. Equal weights keep
/// their input order.
pub(crate) fn resize_sprites<'a>(
    sprites: &[Sprite<'a>],
    normalized: &[f64],
    canvas_area: f64,
    relax_ratio: f64,
) -> Vec<ResizedEmoji<'a>> {
    let areas: Vec<f64> = sprites
        .iter()
        .map(|s| f64::from(s.bitmap.width()) * f64::from(s.bitmap.height()))
        .collect();
    let zoom = zoom_ratio(&areas, normalized, canvas_area, relax_ratio);

    let mut order: Vec<usize> = (0..sprites.len()).collect();
    order.sort_by(|&a, &b| normalized[b].total_cmp(&normalized[a]));

    order
        .into_iter()
        .map(|index| {
            let sprite = &sprites[index];
            let scale = normalized[index] * zoom;
            let bitmap = resize_bitmap(sprite.bitmap, scale);
            ResizedEmoji { unicode: sprite.unicode, scale, bitmap }
        })
        .collect()
}

fn resize_bitmap(bitmap: &RgbaImage, scale: f64) -> RgbaImage {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return RgbaImage::new(0, 0);
    }
    let (width, height) = resized_dimensions(bitmap.width(), bitmap.height(), scale);
    imageops::resize(bitmap, width, height, FilterType::Lanczos3)
}
