use image::{imageops, Rgba, RgbaImage};

use crate::CloudError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Tightest box holding every pixel with alpha at or above `alpha_threshold`.
pub fn bounding_box(image: &RgbaImage, alpha_threshold: u8) -> Option<BoundingBox> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] >= alpha_threshold {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Strips leading and trailing rows and columns that hold no pixel with
/// alpha at or above `alpha_threshold`.
pub fn crop_to_bounding_box(
    image: &RgbaImage,
    alpha_threshold: u8,
) -> Result<RgbaImage, CloudError> {
    let bounds = bounding_box(image, alpha_threshold).ok_or(CloudError::DegenerateMask)?;
    Ok(imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height).to_image())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskPixel {
    pub x: u32,
    pub y: u32,
    pub color: Rgba<u8>,
}

/// Every pixel of a bitmap with non-zero alpha, in row-major order.
#[derive(Clone, Debug)]
pub struct OpacityMask {
    width: u32,
    height: u32,
    pixels: Vec<MaskPixel>,
}

impl OpacityMask {
    pub fn extract(image: &RgbaImage) -> Result<Self, CloudError> {
        let pixels: Vec<MaskPixel> = image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel[3] != 0)
            .map(|(x, y, &color)| MaskPixel { x, y, color })
            .collect();

        if pixels.is_empty() {
            return Err(CloudError::DegenerateMask);
        }

        Ok(Self { width: image.width(), height: image.height(), pixels })
    }

    /// Crops `image` with `alpha_threshold`, then extracts its opaque pixels.
    pub fn from_bitmap(image: &RgbaImage, alpha_threshold: u8) -> Result<Self, CloudError> {
        let cropped = crop_to_bounding_box(image, alpha_threshold)?;
        Self::extract(&cropped)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[MaskPixel] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mean of the opaque pixel coordinates, truncated.
    pub fn centroid(&self) -> (u32, u32) {
        let count = self.pixels.len() as u64;
        let (sum_x, sum_y) = self
            .pixels
            .iter()
            .fold((0u64, 0u64), |(sx, sy), p| (sx + u64::from(p.x), sy + u64::from(p.y)));
        ((sum_x / count) as u32, (sum_y / count) as u32)
    }
}
