use image::{Rgba, RgbaImage};
use log::trace;

use super::opacity::OpacityMask;
use super::order::far_first;
use crate::canvas::occupancy::OccupancyGrid;
use crate::canvas::shape::Canvas;

/// Canvas positions still available as anchors, in search order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FreePositions {
    positions: Vec<(u32, u32)>,
}

impl FreePositions {
    /// Keeps the first occurrence of every position.
    pub fn new(positions: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let positions = positions.into_iter().filter(|&p| seen.insert(p)).collect();
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.positions.iter().copied()
    }

    /// Drops every position `occupancy` now marks occupied, preserving the
    /// order of the rest.
    pub fn retain_free(&mut self, occupancy: &OccupancyGrid) {
        self.positions.retain(|&(x, y)| !occupancy.is_occupied(x, y));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StencilPixel {
    dx: i32,
    dy: i32,
    color: Rgba<u8>,
}

/// An opacity mask expressed as offsets from its centroid, farthest first so
/// that infeasible anchors are rejected early.
#[derive(Clone, Debug)]
pub struct Stencil {
    width: u32,
    height: u32,
    pixels: Vec<StencilPixel>,
}

impl Stencil {
    pub fn new(mask: &OpacityMask) -> Self {
        let (cx, cy) = mask.centroid();
        let pixels = far_first(mask)
            .into_iter()
            .map(|p| StencilPixel {
                dx: p.x as i32 - cx as i32,
                dy: p.y as i32 - cy as i32,
                color: p.color,
            })
            .collect();
        Self { width: mask.width(), height: mask.height(), pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Outcome of a successful placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placed {
    pub anchor: (u32, u32),
    /// Canvas pixels stamped by this placement.
    pub occupied: Vec<(u32, u32)>,
}

/// Mutable canvas state threaded through one layout attempt.
#[derive(Clone, Debug)]
pub struct LayoutState {
    image: RgbaImage,
    occupancy: OccupancyGrid,
    free: FreePositions,
}

impl LayoutState {
    pub fn new(canvas: &Canvas, free: FreePositions) -> Self {
        Self { image: canvas.image.clone(), occupancy: canvas.occupancy.clone(), free }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    pub fn free(&self) -> &FreePositions {
        &self.free
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Whether every stencil pixel lands on a free in-bounds canvas pixel when
    /// the centroid sits on `anchor`.
    pub fn fits(&self, stencil: &Stencil, anchor: (u32, u32)) -> bool {
        stencil.pixels.iter().all(|p| match self.target(anchor, p) {
            Some((x, y)) => !self.occupancy.is_occupied(x, y),
            None => false,
        })
    }

    /// Stamps `stencil` at the first feasible free position. Returns `None`
    /// and leaves the state untouched when no position works.
    pub fn place(&mut self, stencil: &Stencil) -> Option<Placed> {
        if stencil.is_empty() {
            return None;
        }

        let anchor = self.free.iter().find(|&anchor| self.fits(stencil, anchor))?;

        let mut occupied = Vec::with_capacity(stencil.len());
        for pixel in &stencil.pixels {
            if let Some((x, y)) = self.target(anchor, pixel) {
                self.image.put_pixel(x, y, pixel.color);
                self.occupancy.occupy(x, y);
                occupied.push((x, y));
            }
        }
        self.free.retain_free(&self.occupancy);

        trace!(
            "stamped {} pixels at {:?}, {} positions left",
            occupied.len(),
            anchor,
            self.free.len()
        );
        Some(Placed { anchor, occupied })
    }

    fn target(&self, anchor: (u32, u32), pixel: &StencilPixel) -> Option<(u32, u32)> {
        let x = i64::from(anchor.0) + i64::from(pixel.dx);
        let y = i64::from(anchor.1) + i64::from(pixel.dy);
        self.occupancy.contains(x, y).then_some((x as u32, y as u32))
    }
}
