mod canvas;
mod emoji;
mod instrument;
mod layout;

use std::time::Instant;

use image::RgbaImage;
use log::warn;

pub use canvas::{
    contour::contour_points,
    occupancy::OccupancyGrid,
    shape::{Canvas, CanvasShape, MaskShape},
};
pub use emoji::{
    assets::{AssetStore, InMemoryStore, Preloaded, VendorDirectory},
    codepoint::{bare_hex_name, normalize_codepoints},
    item::EmojiItem,
    vendor::Vendor,
};
pub use instrument::Instrument;
pub use layout::{
    opacity::{bounding_box, crop_to_bounding_box, BoundingBox, MaskPixel, OpacityMask},
    order::{canvas_candidates, far_first, squared_distance},
    placement::{FreePositions, LayoutState, Placed, Stencil},
    relax::{relax_ratio, RelaxStrategy},
    resize::{normalized_weights, resized_dimensions},
};

use layout::Sprite;

#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("failed to load image: {0}")]
    Image(#[from] image::ImageError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("emoji {unicode} not found for vendor {vendor}")]
    AssetMissing { unicode: String, vendor: String },
    #[error("bitmap has no pixels above the alpha threshold")]
    DegenerateMask,
    #[error("no layout fits every emoji after {attempts} attempts")]
    LayoutInfeasible { attempts: usize },
    #[error("invalid weight {weight} for emoji {unicode}")]
    InvalidWeight { unicode: String, weight: f64 },
    #[error("emoji weights sum to zero")]
    ZeroWeightSum,
    #[error("emoji weights sum past the largest finite value")]
    WeightSumOverflow,
    #[error("invalid codepoint sequence {0:?}")]
    InvalidCodepoint(String),
    #[error("unsupported canvas dimensions {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

#[derive(Clone, Debug)]
pub struct CloudOptions {
    /// Minimum alpha a row or column needs to survive bounding box cropping.
    pub alpha_threshold: u8,
    /// Number of relaxation attempts before giving up.
    pub num_try: usize,
    /// Increment of the relax ratio between attempts.
    pub step_size: f64,
    pub strategy: RelaxStrategy,
    /// Optional timing hook, called with an operation name and its duration.
    pub instrument: Option<Instrument>,
}

impl Default for CloudOptions {
    fn default() -> Self {
        Self {
            alpha_threshold: 4,
            num_try: 20,
            step_size: 0.1,
            strategy: RelaxStrategy::Sequential,
            instrument: None,
        }
    }
}

impl CloudOptions {
    pub fn validate(&self) -> Result<(), CloudError> {
        if self.num_try == 0 {
            return Err(CloudError::InvalidOptions("num_try must be at least 1".into()));
        }
        if !self.step_size.is_finite() || self.step_size < 0.0 {
            return Err(CloudError::InvalidOptions(format!(
                "step_size must be a finite non-negative number, got {}",
                self.step_size
            )));
        }
        Ok(())
    }
}

/// Where one emoji ended up on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub unicode: String,
    /// Canvas position the emoji's centroid was anchored at.
    pub anchor: (u32, u32),
    /// Size of the cropped, resized bitmap.
    pub width: u32,
    pub height: u32,
    /// Number of opaque pixels stamped onto the canvas.
    pub pixels: usize,
}

#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub image: RgbaImage,
    pub relax_ratio: f64,
    /// Zero-based index of the accepted relaxation attempt.
    pub attempt: usize,
    /// Placements in placement order, heaviest first.
    pub placements: Vec<Placement>,
}

#[derive(Default)]
pub struct EmojiCloudRenderer;

impl EmojiCloudRenderer {
    /// Renders items whose bitmaps were supplied up front. Items without a
    /// bitmap are skipped.
    pub fn render(
        &self,
        canvas: &Canvas,
        items: &[EmojiItem],
        options: &CloudOptions,
    ) -> Result<RenderOutput, CloudError> {
        self.render_with_store(&Preloaded, canvas, items, options)
    }

    pub fn render_with_store(
        &self,
        store: &dyn AssetStore,
        canvas: &Canvas,
        items: &[EmojiItem],
        options: &CloudOptions,
    ) -> Result<RenderOutput, CloudError> {
        let started = Instant::now();
        options.validate()?;

        for item in items {
            item.validate_weight()?;
        }

        let mut sprites = Vec::with_capacity(items.len());
        for item in items {
            match item.load_bitmap(store) {
                Ok(bitmap) => sprites.push(Sprite {
                    unicode: item.unicode(),
                    weight: item.weight(),
                    bitmap,
                }),
                Err(CloudError::AssetMissing { unicode, vendor }) => {
                    warn!("skipping emoji {unicode}: no bitmap for vendor {vendor}");
                },
                Err(err) => return Err(err),
            }
        }

        let result = layout::relax::relax(canvas, &sprites, options);

        if let Some(instrument) = &options.instrument {
            instrument.record("render", started.elapsed());
        }
        result
    }
}
