/// Per-pixel availability map of a canvas. `true` marks a pixel that can no
/// longer receive emoji content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    pub fn free(width: u32, height: u32) -> Self {
        Self::filled(width, height, false)
    }

    pub fn blocked(width: u32, height: u32) -> Self {
        Self::filled(width, height, true)
    }

    fn filled(width: u32, height: u32, occupied: bool) -> Self {
        let len = width as usize * height as usize;
        Self { width, height, cells: vec![occupied; len] }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Out-of-range coordinates count as occupied.
    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return true;
        }
        self.cells[self.index(x, y)]
    }

    pub fn occupy(&mut self, x: u32, y: u32) {
        self.set(x, y, true);
    }

    pub fn release(&mut self, x: u32, y: u32) {
        self.set(x, y, false);
    }

    fn set(&mut self, x: u32, y: u32, occupied: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.cells[idx] = occupied;
        }
    }

    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|&&occupied| !occupied).count()
    }

    /// Free pixels, x-major: every y of column 0 first, then column 1, ...
    pub fn free_positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.width)
            .flat_map(move |x| (0..self.height).map(move |y| (x, y)))
            .filter(move |&(x, y)| !self.cells[self.index(x, y)])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_occupied() {
        let grid = OccupancyGrid::free(3, 2);
        assert!(!grid.is_occupied(2, 1));
        assert!(grid.is_occupied(3, 0));
        assert!(grid.is_occupied(0, 2));
    }

    #[test]
    fn free_positions_walk_columns_first() {
        let mut grid = OccupancyGrid::free(2, 2);
        grid.occupy(0, 1);
        let free: Vec<_> = grid.free_positions().collect();
        assert_eq!(free, vec![(0, 0), (1, 0), (1, 1)]);
        assert_eq!(grid.free_count(), 3);
    }

    #[test]
    fn release_frees_pixel() {
        let mut grid = OccupancyGrid::blocked(2, 2);
        grid.release(1, 1);
        assert_eq!(grid.free_positions().collect::<Vec<_>>(), vec![(1, 1)]);
    }
}
