/// Static level cells and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

use super::glyph::Glyph;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Empty,
    Solid(Glyph),      // Blocks movement, acts as floor
    Decorative(Glyph), // Drawn, walkable
    Goal,              // Walkable despite carrying a glyph
}

impl Cell {
    pub const GOAL_GLYPH: Glyph = Glyph::Char('*');

    /// Does this cell prevent entry?
    pub fn is_blocking(self) -> bool {
        matches!(self, Cell::Solid(_))
    }

    /// Permanent glyph drawn for this cell, if any.
    pub fn glyph(self) -> Option<Glyph> {
        match self {
            Cell::Empty => None,
            Cell::Solid(g) | Cell::Decorative(g) => Some(g),
            Cell::Goal => Some(Self::GOAL_GLYPH),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}
