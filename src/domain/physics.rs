/// Collision queries shared by every entity kind.
///
/// ## Architecture
///
/// Two distinct concepts, queried separately:
///   1. TERRAIN:   what the cell IS (LevelGrid: Solid blocks, others walk)
///   2. OCCUPANCY: who is IN the cell (the world's entity list)
///
/// Entities never keep peer lists: every occupancy query scans the single
/// world-owned slice and skips the asking entity by index.
///
/// ## Floor Rules
///
/// An entity rests on a floor if ANY of:
///   - It is on the bottom row
///   - The cell directly below is Solid
///   - Another entity occupies the cell directly below
///
/// Downward blocking is decided here only; `is_blocked` is consulted for
/// left, right and up.

use super::entity::Entity;
use super::grid::{Direction, LevelGrid, Pos};

// ══════════════════════════════════════════════════════════════
// Terrain
// ══════════════════════════════════════════════════════════════

/// Is the terrain one step from `pos` closed? The grid edge counts as closed.
/// The Goal cell is walkable even though it carries a glyph.
#[inline]
pub fn is_blocked(grid: &LevelGrid, pos: Pos, dir: Direction) -> bool {
    match grid.neighbor(pos, dir) {
        Some(next) => grid.is_blocking(next),
        None => true,
    }
}

// ══════════════════════════════════════════════════════════════
// Occupancy
// ══════════════════════════════════════════════════════════════

/// Index of the entity at `pos`, ignoring entity `skip`.
pub fn occupant(entities: &[Entity], pos: Pos, skip: usize) -> Option<usize> {
    entities
        .iter()
        .enumerate()
        .find(|(j, e)| *j != skip && e.pos == pos)
        .map(|(j, _)| j)
}

/// The entity one step from entity `idx` in `dir`, if any.
pub fn find_neighbor(grid: &LevelGrid, entities: &[Entity], idx: usize, dir: Direction) -> Option<usize> {
    let next = grid.neighbor(entities[idx].pos, dir)?;
    occupant(entities, next, idx)
}

// ══════════════════════════════════════════════════════════════
// Combined
// ══════════════════════════════════════════════════════════════

pub fn is_on_floor(grid: &LevelGrid, entities: &[Entity], idx: usize) -> bool {
    let pos = entities[idx].pos;
    if grid.is_bottom(pos) {
        return true;
    }
    match grid.neighbor(pos, Direction::Down) {
        Some(below) => grid.is_blocking(below) || occupant(entities, below, idx).is_some(),
        None => true,
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::glyph::Glyph;
    use crate::domain::tile::Cell;
    use std::time::Duration;

    const HALF: Duration = Duration::from_millis(500);

    fn grid_from(rows: &[&str]) -> LevelGrid {
        LevelGrid::new(
            rows.iter()
                .map(|r| {
                    r.chars()
                        .map(|c| match c {
                            '#' => Cell::Solid(Glyph::Char('#')),
                            '*' => Cell::Goal,
                            'h' => Cell::Decorative(Glyph::Char('h')),
                            _ => Cell::Empty,
                        })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn bottom_row_is_floor() {
        let g = grid_from(&["...", "..."]);
        let es = vec![Entity::block(Pos::new(1, 1), HALF)];
        assert!(is_on_floor(&g, &es, 0));
    }

    #[test]
    fn solid_below_is_floor() {
        let g = grid_from(&["...", ".#.", "..."]);
        let es = vec![Entity::block(Pos::new(0, 1), HALF), Entity::block(Pos::new(0, 0), HALF)];
        assert!(is_on_floor(&g, &es, 0));
        assert!(!is_on_floor(&g, &es, 1));
    }

    #[test]
    fn decorative_and_goal_below_are_not_floor() {
        let g = grid_from(&["..", "h*", ".."]);
        let es = vec![Entity::block(Pos::new(0, 0), HALF), Entity::block(Pos::new(0, 1), HALF)];
        assert!(!is_on_floor(&g, &es, 0));
        assert!(!is_on_floor(&g, &es, 1));
    }

    #[test]
    fn entity_below_is_floor() {
        let g = grid_from(&["...", "...", "..."]);
        let es = vec![
            Entity::player(Pos::new(0, 1), 2, HALF),
            Entity::block(Pos::new(1, 1), HALF),
        ];
        assert!(is_on_floor(&g, &es, 0));
        assert!(!is_on_floor(&g, &es, 1));
    }

    #[test]
    fn goal_is_not_blocked() {
        let g = grid_from(&["#*.", "..."]);
        assert!(!is_blocked(&g, Pos::new(1, 1), Direction::Up));
        assert!(is_blocked(&g, Pos::new(1, 0), Direction::Up));
        assert!(is_blocked(&g, Pos::new(0, 2), Direction::Up));
        assert!(is_blocked(&g, Pos::new(1, 2), Direction::Right));
    }

    #[test]
    fn neighbor_lookup_skips_self() {
        let g = grid_from(&["...."]);
        let es = vec![
            Entity::player(Pos::new(0, 1), 2, HALF),
            Entity::block(Pos::new(0, 2), HALF),
            Entity::patroller(Pos::new(0, 0), 3, HALF),
        ];
        assert_eq!(find_neighbor(&g, &es, 0, Direction::Right), Some(1));
        assert_eq!(find_neighbor(&g, &es, 0, Direction::Left), Some(2));
        assert_eq!(find_neighbor(&g, &es, 0, Direction::Up), None);
        assert_eq!(find_neighbor(&g, &es, 2, Direction::Left), None);
        assert_eq!(occupant(&es, Pos::new(0, 1), 0), None);
    }
}
