/// Level Grid: the immutable R×C map of cells, addressed by zero-based
/// (row, col). Loaded once, never mutated during play.
///
/// Out-of-range access is an invariant violation and panics; every position
/// an entity can hold is produced by `neighbor`, which never leaves the grid.

use super::glyph::Glyph;
use super::tile::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Horizontal direction (lateral moves, pushes, patrol heading).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

impl From<Facing> for Direction {
    fn from(f: Facing) -> Direction {
        match f {
            Facing::Left => Direction::Left,
            Facing::Right => Direction::Right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LevelGrid {
    cells: Vec<Vec<Cell>>,
    rows: usize,
    cols: usize,
}

impl LevelGrid {
    /// Build from rows of cells. Rows must be non-empty and of equal length;
    /// the level loader validates this before calling.
    pub fn new(cells: Vec<Vec<Cell>>) -> Self {
        let rows = cells.len();
        assert!(rows > 0, "level grid has no rows");
        let cols = cells[0].len();
        assert!(cols > 0, "level grid has no columns");
        assert!(
            cells.iter().all(|r| r.len() == cols),
            "level grid rows differ in length"
        );
        LevelGrid { cells, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    pub fn cell(&self, pos: Pos) -> Cell {
        assert!(self.contains(pos), "grid access out of range: {:?}", pos);
        self.cells[pos.row][pos.col]
    }

    /// True for Solid cells only. Goal and decorative cells stay walkable.
    #[inline]
    pub fn is_blocking(&self, pos: Pos) -> bool {
        self.cell(pos).is_blocking()
    }

    #[inline]
    pub fn glyph_at(&self, pos: Pos) -> Option<Glyph> {
        self.cell(pos).glyph()
    }

    /// Bottom row is implicit ground.
    #[inline]
    pub fn is_bottom(&self, pos: Pos) -> bool {
        pos.row + 1 == self.rows
    }

    /// The cell one step from `pos`, or None at the grid edge.
    pub fn neighbor(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        let next = match dir {
            Direction::Left => Pos::new(pos.row, pos.col.checked_sub(1)?),
            Direction::Right => Pos::new(pos.row, pos.col + 1),
            Direction::Up => Pos::new(pos.row.checked_sub(1)?, pos.col),
            Direction::Down => Pos::new(pos.row + 1, pos.col),
        };
        self.contains(next).then_some(next)
    }

    /// Every cell position, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_2x3() -> LevelGrid {
        let wall = Cell::Solid(Glyph::Char('='));
        LevelGrid::new(vec![
            vec![Cell::Empty, Cell::Goal, Cell::Decorative(Glyph::Char('~'))],
            vec![wall, Cell::Empty, Cell::Empty],
        ])
    }

    #[test]
    fn neighbor_stays_in_range() {
        let g = grid_2x3();
        assert_eq!(g.neighbor(Pos::new(0, 0), Direction::Left), None);
        assert_eq!(g.neighbor(Pos::new(0, 0), Direction::Up), None);
        assert_eq!(g.neighbor(Pos::new(1, 2), Direction::Right), None);
        assert_eq!(g.neighbor(Pos::new(1, 2), Direction::Down), None);
        assert_eq!(g.neighbor(Pos::new(1, 1), Direction::Up), Some(Pos::new(0, 1)));
    }

    #[test]
    fn blocking_and_glyphs() {
        let g = grid_2x3();
        assert!(g.is_blocking(Pos::new(1, 0)));
        assert!(!g.is_blocking(Pos::new(0, 1)));
        assert!(!g.is_blocking(Pos::new(0, 2)));
        assert_eq!(g.glyph_at(Pos::new(0, 1)), Some(Glyph::Char('*')));
        assert_eq!(g.glyph_at(Pos::new(0, 0)), None);
        assert!(g.is_bottom(Pos::new(1, 1)));
    }

    #[test]
    #[should_panic]
    fn out_of_range_access_panics() {
        grid_2x3().cell(Pos::new(2, 0));
    }
}
