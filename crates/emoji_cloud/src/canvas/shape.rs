use std::f64::consts::PI;

use image::{Rgba, RgbaImage};

use super::{contour::contour_points, occupancy::OccupancyGrid};
use crate::layout::opacity::{crop_to_bounding_box, OpacityMask};
use crate::CloudError;

/// Silhouette-derived canvas settings.
#[derive(Clone, Debug)]
pub struct MaskShape {
    pub silhouette: RgbaImage,
    /// Side of the square stamped at every contour pixel.
    pub contour_width: u32,
    pub contour_color: Rgba<u8>,
    /// Alpha jump that counts as a contour edge.
    pub contour_threshold: u8,
    /// Alpha threshold used to crop the silhouette to its bounding box.
    pub bounding_threshold: u8,
}

impl MaskShape {
    pub fn new(silhouette: RgbaImage) -> Self {
        Self {
            silhouette,
            contour_width: 0,
            contour_color: Rgba([0, 0, 0, 255]),
            contour_threshold: 10,
            bounding_threshold: 0,
        }
    }

    pub fn with_contour(mut self, width: u32, color: Rgba<u8>) -> Self {
        self.contour_width = width;
        self.contour_color = color;
        self
    }
}

#[derive(Clone, Debug)]
pub enum CanvasShape {
    Rectangle { width: u32, height: u32 },
    Ellipse { width: u32, height: u32 },
    Mask(MaskShape),
}

/// Drawing surface plus the occupancy bookkeeping placement relies on.
#[derive(Clone, Debug)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Area the emoji are scaled to fill.
    pub area: f64,
    pub image: RgbaImage,
    pub occupancy: OccupancyGrid,
}

impl Canvas {
    pub fn new(shape: &CanvasShape, background: Rgba<u8>) -> Result<Self, CloudError> {
        match shape {
            CanvasShape::Rectangle { width, height } => {
                let (width, height) = checked_dimensions(*width, *height)?;
                Ok(Self {
                    width,
                    height,
                    area: f64::from(width) * f64::from(height),
                    image: RgbaImage::from_pixel(width, height, background),
                    occupancy: OccupancyGrid::free(width, height),
                })
            },
            CanvasShape::Ellipse { width, height } => {
                let (width, height) = checked_dimensions(*width, *height)?;
                Ok(Self {
                    width,
                    height,
                    area: PI * (f64::from(width) / 2.0) * (f64::from(height) / 2.0),
                    image: RgbaImage::from_pixel(width, height, background),
                    occupancy: ellipse_occupancy(width, height),
                })
            },
            CanvasShape::Mask(mask) => mask_canvas(mask, background),
        }
    }

    /// Wraps externally built canvas state.
    pub fn from_parts(
        area: f64,
        image: RgbaImage,
        occupancy: OccupancyGrid,
    ) -> Result<Self, CloudError> {
        let (width, height) = checked_dimensions(image.width(), image.height())?;
        if occupancy.width() != width || occupancy.height() != height || !area.is_finite() {
            return Err(CloudError::InvalidCanvas { width, height });
        }
        Ok(Self { width, height, area, image, occupancy })
    }

    /// Logical center, truncated towards the origin.
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }
}

fn checked_dimensions(width: u32, height: u32) -> Result<(u32, u32), CloudError> {
    if width == 0 || height == 0 {
        return Err(CloudError::InvalidCanvas { width, height });
    }
    Ok((width, height))
}

fn ellipse_occupancy(width: u32, height: u32) -> OccupancyGrid {
    let mut occupancy = OccupancyGrid::blocked(width, height);
    let (cx, cy) = (f64::from(width / 2), f64::from(height / 2));
    let (rx, ry) = (f64::from(width) / 2.0, f64::from(height) / 2.0);

    for x in 0..width {
        for y in 0..height {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx / (rx * rx) + dy * dy / (ry * ry) <= 1.0 {
                occupancy.release(x, y);
            }
        }
    }

    occupancy
}

fn mask_canvas(mask: &MaskShape, background: Rgba<u8>) -> Result<Canvas, CloudError> {
    let padding = mask.contour_width.saturating_mul(2);
    let width = mask.silhouette.width().saturating_add(padding);
    let height = mask.silhouette.height().saturating_add(padding);
    let (width, height) = checked_dimensions(width, height)?;

    let cropped = crop_to_bounding_box(&mask.silhouette, mask.bounding_threshold)?;
    let opaque = OpacityMask::extract(&cropped)?;

    let mut image = RgbaImage::from_pixel(width, height, background);
    let mut occupancy = OccupancyGrid::blocked(width, height);
    for pixel in opaque.pixels() {
        occupancy.release(pixel.x, pixel.y);
    }

    for (x, y) in contour_points(&cropped, mask.contour_threshold) {
        for i in 0..mask.contour_width {
            for j in 0..mask.contour_width {
                let (px, py) = (x + i, y + j);
                if px < width && py < height {
                    image.put_pixel(px, py, mask.contour_color);
                    occupancy.occupy(px, py);
                }
            }
        }
    }

    let area = occupancy.free_count() as f64;
    Ok(Canvas { width, height, area, image, occupancy })
}
