pub mod opacity;
pub mod order;
pub mod placement;
pub mod relax;
pub mod resize;

use image::RgbaImage;

/// One emoji ready for layout: its identity, raw weight and source bitmap.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sprite<'a> {
    pub unicode: &'a str,
    pub weight: f64,
    pub bitmap: &'a RgbaImage,
}
