/// What a simulation step hands back to the presentation layer:
/// draw instructions for the render surface, and events for sound/logging.

use crate::domain::glyph::Glyph;
use crate::domain::grid::Pos;

/// Buttons pressed since the previous step (edge-triggered).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub reset: bool,
}

impl FrameInput {
    /// A button counts if either source pressed it.
    pub fn merge(self, other: FrameInput) -> FrameInput {
        FrameInput {
            left: self.left || other.left,
            right: self.right || other.right,
            jump: self.jump || other.jump,
            reset: self.reset || other.reset,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    Draw { pos: Pos, glyph: Glyph },
    Erase { pos: Pos },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    Pushed { from: Pos, to: Pos },
    PlayerKilled { at: Pos },
    GoalReached,
    LevelComplete,
    LevelReset,
}

#[derive(Clone, Debug, Default)]
pub struct Outcome {
    pub draws: Vec<DrawOp>,
    pub events: Vec<GameEvent>,
}

impl Outcome {
    pub fn draw(&mut self, pos: Pos, glyph: Glyph) {
        self.draws.push(DrawOp::Draw { pos, glyph });
    }

    pub fn erase(&mut self, pos: Pos) {
        self.draws.push(DrawOp::Erase { pos });
    }

    pub fn clear(&mut self) {
        self.draws.push(DrawOp::Clear);
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
