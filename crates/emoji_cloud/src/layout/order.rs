use std::cmp::Reverse;

use super::opacity::{MaskPixel, OpacityMask};
use crate::canvas::occupancy::OccupancyGrid;

/// Squared Euclidean distance. Orders exactly like the true distance without
/// any floating point.
pub fn squared_distance(a: (u32, u32), b: (u32, u32)) -> u64 {
    let dx = i64::from(a.0) - i64::from(b.0);
    let dy = i64::from(a.1) - i64::from(b.1);
    (dx * dx + dy * dy) as u64
}

/// Free canvas pixels, nearest to `center` first. Equal distances keep the
/// grid's x-major order.
pub fn canvas_candidates(occupancy: &OccupancyGrid, center: (u32, u32)) -> Vec<(u32, u32)> {
    let mut candidates: Vec<(u32, u32)> = occupancy.free_positions().collect();
    candidates.sort_by_cached_key(|&position| squared_distance(position, center));
    candidates
}

/// Mask pixels, farthest from the centroid first. Equal distances keep the
/// mask's row-major order.
pub fn far_first(mask: &OpacityMask) -> Vec<MaskPixel> {
    let centroid = mask.centroid();
    let mut pixels = mask.pixels().to_vec();
    pixels.sort_by_cached_key(|p| Reverse(squared_distance((p.x, p.y), centroid)));
    pixels
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    #[test]
    fn same_column_distance_is_vertical_gap() {
        assert_eq!(squared_distance((3, 10), (3, 4)), 36);
        assert_eq!(squared_distance((0, 0), (3, 4)), 25);
    }

    #[test]
    fn candidates_start_at_center() {
        let grid = OccupancyGrid::free(5, 3);
        let candidates = canvas_candidates(&grid, (2, 1));
        assert_eq!(candidates.len(), 15);
        assert_eq!(candidates[0], (2, 1));
        // Distance-1 ring in x-major order.
        assert_eq!(&candidates[1..5], &[(1, 1), (2, 0), (2, 2), (3, 1)]);
        assert_eq!(candidates[14], (4, 2));
    }

    #[test]
    fn candidates_skip_occupied_pixels() {
        let mut grid = OccupancyGrid::free(3, 3);
        grid.occupy(1, 1);
        let candidates = canvas_candidates(&grid, (1, 1));
        assert!(!candidates.contains(&(1, 1)));
        assert_eq!(candidates.len(), 8);
    }

    #[test]
    fn far_first_orders_descending_and_stable() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        let mask = OpacityMask::extract(&image).unwrap();
        let order: Vec<_> = far_first(&mask).iter().map(|p| (p.x, p.y)).collect();

        assert_eq!(
            order,
            vec![(0, 0), (2, 0), (0, 2), (2, 2), (1, 0), (0, 1), (2, 1), (1, 2), (1, 1)]
        );
    }
}
