//! Grid topology: flat indexing, neighbour lookup and the pin set.
//!
//! Rows grow along `+y`, so "up" is the next row (`index + width`) and the top row is
//! `y == height - 1`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which rest length a spring uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RestClass {
    Horizontal,
    Vertical,
    Diagonal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, 1),
            Direction::UpRight => (1, 1),
            Direction::DownLeft => (-1, -1),
            Direction::DownRight => (1, -1),
        }
    }

    #[inline]
    pub const fn rest_class(self) -> RestClass {
        match self {
            Direction::Up | Direction::Down => RestClass::Vertical,
            Direction::Left | Direction::Right => RestClass::Horizontal,
            _ => RestClass::Diagonal,
        }
    }
}

/// Dimensions of a cloth, obtained from [`crate::ClothDesc::grid`].
///
/// Index arithmetic assumes a non-empty grid, which [`crate::ClothDesc::validate`]
/// guarantees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    pub(crate) const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of particles.
    #[inline]
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Inverse of [`Grid::index`].
    ///
    /// # Panics
    ///
    /// Panics if the grid has no columns.
    #[inline]
    pub const fn coords(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    /// Flat index of the neighbour of `(x, y)` in `direction`, or `None` when it falls
    /// off the grid.
    #[inline]
    pub fn neighbor(&self, x: u32, y: u32, direction: Direction) -> Option<usize> {
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < self.width && ny < self.height).then(|| self.index(nx, ny))
    }

    /// Every existing neighbour of `(x, y)` together with its direction.
    pub fn neighbors(&self, x: u32, y: u32) -> impl Iterator<Item = (Direction, usize)> {
        let grid = *self;
        Direction::ALL
            .into_iter()
            .filter_map(move |d| grid.neighbor(x, y, d).map(|idx| (d, idx)))
    }

    /// Columns of the top row that are held in place. May contain duplicates on narrow
    /// grids.
    pub const fn pinned_columns(&self) -> [u32; 5] {
        let w = self.width;
        [
            0,
            w / 4,
            w / 2,
            (w as u64 * 3 / 4) as u32,
            w.saturating_sub(1),
        ]
    }

    #[inline]
    pub fn is_pinned(&self, x: u32, y: u32) -> bool {
        y + 1 == self.height && self.pinned_columns().contains(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_coords() {
        let grid = Grid::new(7, 3);
        for y in 0..3 {
            for x in 0..7 {
                let idx = grid.index(x, y);
                assert_eq!(idx, (y * 7 + x) as usize);
                assert_eq!(grid.coords(idx), (x, y));
            }
        }
    }

    #[test]
    fn corner_has_three_neighbors() {
        let grid = Grid::new(5, 5);
        let dirs: Vec<_> = grid.neighbors(0, 0).map(|(d, _)| d).collect();
        assert_eq!(dirs, vec![Direction::Up, Direction::Right, Direction::UpRight]);
        assert_eq!(grid.neighbor(0, 0, Direction::Up), Some(5));
        assert_eq!(grid.neighbor(0, 0, Direction::Right), Some(1));
        assert_eq!(grid.neighbor(0, 0, Direction::UpRight), Some(6));
    }

    #[test]
    fn interior_has_all_neighbors() {
        let grid = Grid::new(5, 5);
        let neighbors: Vec<_> = grid.neighbors(2, 2).collect();
        assert_eq!(neighbors.len(), 8);

        let center = grid.index(2, 2);
        for (dir, idx) in neighbors {
            let (dx, dy) = dir.offset();
            let expected = center as i64 + dy as i64 * 5 + dx as i64;
            assert_eq!(idx as i64, expected, "{dir:?}");
        }
    }

    #[test]
    fn edges_clip_neighbors() {
        let grid = Grid::new(5, 4);
        // Top-right corner
        assert_eq!(grid.neighbors(4, 3).count(), 3);
        // Middle of the left edge
        assert_eq!(grid.neighbors(0, 2).count(), 5);
        assert_eq!(grid.neighbor(4, 1, Direction::Right), None);
        assert_eq!(grid.neighbor(2, 3, Direction::UpLeft), None);
        assert_eq!(grid.neighbor(2, 0, Direction::DownRight), None);
    }

    #[test]
    fn single_column_only_has_vertical_neighbors() {
        let grid = Grid::new(1, 3);
        let dirs: Vec<_> = grid.neighbors(0, 1).map(|(d, _)| d).collect();
        assert_eq!(dirs, vec![Direction::Up, Direction::Down]);
    }

    #[test]
    fn rest_classes() {
        assert_eq!(Direction::Up.rest_class(), RestClass::Vertical);
        assert_eq!(Direction::Left.rest_class(), RestClass::Horizontal);
        assert_eq!(Direction::DownRight.rest_class(), RestClass::Diagonal);
    }

    #[test]
    fn pin_set_on_wide_grid() {
        let grid = Grid::new(20, 10);
        let pinned: Vec<_> = (0..20).filter(|&x| grid.is_pinned(x, 9)).collect();
        assert_eq!(pinned, vec![0, 5, 10, 15, 19]);
        assert!((0..20).all(|x| !grid.is_pinned(x, 8)));
    }

    #[test]
    fn pin_set_covers_top_row_of_width_four() {
        let grid = Grid::new(4, 4);
        assert!((0..4).all(|x| grid.is_pinned(x, 3)));
        assert!((0..4).all(|x| !grid.is_pinned(x, 0)));
    }

    #[test]
    fn pin_set_collapses_on_narrow_grids() {
        assert!(Grid::new(1, 2).is_pinned(0, 1));

        let grid = Grid::new(3, 2);
        let pinned: Vec<_> = (0..3).filter(|&x| grid.is_pinned(x, 1)).collect();
        // 3/4 = 0, 3/2 = 1, 9/4 = 2
        assert_eq!(pinned, vec![0, 1, 2]);
    }
}
