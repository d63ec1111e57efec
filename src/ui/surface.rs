/// Render surface: an addressable character grid with programmable glyphs.
///
/// The simulation never reads back from a surface. It hands over `DrawOp`s
/// and the surface decides how a glyph looks (terminal stand-ins, tests keep
/// the raw glyph).

use crate::domain::glyph::{CustomGlyph, Glyph};
use crate::domain::grid::Pos;
use crate::sim::event::DrawOp;

pub trait Surface {
    fn clear(&mut self);

    fn draw(&mut self, pos: Pos, glyph: Glyph);

    fn erase(&mut self, pos: Pos) {
        self.draw(pos, Glyph::BLANK);
    }

    /// Called once per table entry at startup.
    fn register_custom_glyph(&mut self, glyph: &CustomGlyph);

    fn apply(&mut self, ops: &[DrawOp]) {
        for op in ops {
            match *op {
                DrawOp::Clear => self.clear(),
                DrawOp::Draw { pos, glyph } => self.draw(pos, glyph),
                DrawOp::Erase { pos } => self.erase(pos),
            }
        }
    }
}

/// In-memory surface. Cells hold exactly what was last drawn.
#[cfg(test)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    cells: Vec<Vec<Glyph>>,
    registered: Vec<u8>,
}

#[cfg(test)]
impl Canvas {
    pub fn new(rows: usize, cols: usize) -> Self {
        Canvas {
            cells: vec![vec![Glyph::BLANK; cols]; rows],
            registered: vec![],
        }
    }

    pub fn glyph_at(&self, pos: Pos) -> Glyph {
        self.cells[pos.row][pos.col]
    }

    pub fn is_registered(&self, id: u8) -> bool {
        self.registered.contains(&id)
    }

    /// Row as text, custom glyphs shown by their stand-in.
    pub fn row_text(&self, row: usize) -> String {
        self.cells[row]
            .iter()
            .map(|g| match *g {
                Glyph::Char(c) => c,
                Glyph::Custom(id) => crate::domain::glyph::custom_glyph(id).map_or('?', |cg| cg.stand_in),
            })
            .collect()
    }
}

#[cfg(test)]
impl Surface for Canvas {
    fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(Glyph::BLANK);
        }
    }

    fn draw(&mut self, pos: Pos, glyph: Glyph) {
        self.cells[pos.row][pos.col] = glyph;
    }

    fn register_custom_glyph(&mut self, glyph: &CustomGlyph) {
        if !self.registered.contains(&glyph.id) {
            self.registered.push(glyph.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::glyph::CUSTOM_GLYPHS;

    #[test]
    fn apply_runs_ops_in_order() {
        let mut c = Canvas::new(2, 3);
        c.apply(&[
            DrawOp::Draw { pos: Pos::new(0, 0), glyph: Glyph::Char('a') },
            DrawOp::Draw { pos: Pos::new(1, 2), glyph: Glyph::Char('b') },
            DrawOp::Erase { pos: Pos::new(0, 0) },
        ]);
        assert_eq!(c.row_text(0), "   ");
        assert_eq!(c.row_text(1), "  b");
        c.apply(&[DrawOp::Clear]);
        assert_eq!(c, Canvas::new(2, 3));
    }

    #[test]
    fn custom_glyphs_render_as_stand_ins() {
        let mut c = Canvas::new(1, 2);
        for g in &CUSTOM_GLYPHS {
            c.register_custom_glyph(g);
        }
        assert!(c.is_registered(5));
        c.draw(Pos::new(0, 1), Glyph::Custom(0));
        assert_eq!(c.row_text(0), " @");
    }
}
