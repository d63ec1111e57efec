/// World: the level grid plus every entity, advanced by `step::step`.
///
/// ## Ownership
///
/// The world owns one `entities` Vec. The player is always index 0 and
/// never moves in the Vec; blocks and patrollers follow in map order.
/// Every occupancy question goes through `physics` against this slice.
///
/// ## Drawing
///
/// Nothing here writes to a screen. Mutations push `DrawOp`s into an
/// `Outcome`, which the caller hands to a `Surface`. When an entity leaves a
/// cell, whatever remains visible there (another entity, the level glyph, or
/// nothing) is drawn in its place.

use std::time::Duration;

use crate::config::{RulesConfig, TimingConfig};
use crate::domain::entity::Entity;
use crate::domain::glyph::{self, Glyph, SpriteState};
use crate::domain::grid::{Direction, LevelGrid, Pos};
use crate::domain::physics;
use super::event::Outcome;
use super::level::{Level, LevelError, SpawnKind};

pub const PLAYER: usize = 0;

pub const COMPLETE_MESSAGE: &str = "Level Complete";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    /// Dead glyph on screen; reset happens at `resume_at`.
    Dying { resume_at: Duration },
    /// Player stands on the goal; the banner follows at `resume_at`.
    GoalReached { resume_at: Duration },
    /// Banner on screen; reset happens at `resume_at`.
    LevelComplete { resume_at: Duration },
}

impl Phase {
    pub fn is_playing(self) -> bool {
        self == Phase::Playing
    }
}

pub struct World {
    // ── Level ──
    pub name: String,
    pub grid: LevelGrid,
    pub goal: Pos,

    // ── Entities ──
    pub entities: Vec<Entity>,

    // ── Clock / phase ──
    pub phase: Phase,
    pub now: Duration,
    pub timing: TimingConfig,
    pub rules: RulesConfig,

    // ── Tally ──
    pub deaths: u32,
    pub clears: u32,
}

// ── Construction ──

impl World {
    pub fn new(level: Level, timing: TimingConfig, rules: RulesConfig) -> Result<Self, LevelError> {
        let interval = timing.tick_interval;
        let mut entities = Vec::with_capacity(level.spawns.len() + 1);
        entities.push(Entity::player(level.player, rules.air_move_budget, interval));
        for (kind, pos) in level.spawns {
            entities.push(match kind {
                SpawnKind::Block => Entity::block(pos, interval),
                SpawnKind::Patroller => Entity::patroller(pos, rules.patrol_radius, interval),
            });
        }

        let world = World {
            name: level.name,
            grid: level.grid,
            goal: level.goal,
            entities,
            phase: Phase::Playing,
            now: Duration::ZERO,
            timing,
            rules,
            deaths: 0,
            clears: 0,
        };
        world.validate()?;
        Ok(world)
    }

    /// Every glyph that can reach the screen must be drawable, and the player
    /// must be able to show its death.
    fn validate(&self) -> Result<(), LevelError> {
        let level_glyphs = self.grid.positions().filter_map(|p| self.grid.glyph_at(p));
        let sprite_glyphs = self.entities.iter().flat_map(|e| e.sprites.glyphs());
        if let Some(bad) = level_glyphs.chain(sprite_glyphs).find(|g| !glyph::is_known(*g)) {
            return Err(LevelError::UnknownGlyph(bad));
        }
        if !self.player().sprites.has(SpriteState::Dead) {
            return Err(LevelError::MissingSprite { entity: "player", state: "dead" });
        }
        Ok(())
    }
}

// ── Queries ──

impl World {
    pub fn player(&self) -> &Entity {
        &self.entities[PLAYER]
    }

    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.entities[PLAYER]
    }

    #[inline]
    pub fn on_floor(&self, idx: usize) -> bool {
        physics::is_on_floor(&self.grid, &self.entities, idx)
    }

    #[inline]
    pub fn neighbor(&self, idx: usize, dir: Direction) -> Option<usize> {
        physics::find_neighbor(&self.grid, &self.entities, idx, dir)
    }

    #[inline]
    pub fn blocked(&self, idx: usize, dir: Direction) -> bool {
        physics::is_blocked(&self.grid, self.entities[idx].pos, dir)
    }

    /// Sprite an entity should show where it stands now.
    pub fn resting_sprite(&self, idx: usize) -> SpriteState {
        if self.on_floor(idx) {
            SpriteState::Default
        } else {
            SpriteState::Falling
        }
    }

    /// A patroller sharing the player's cell, if any.
    pub fn patroller_on_player(&self) -> Option<usize> {
        let at = self.player().pos;
        self.entities
            .iter()
            .enumerate()
            .find(|(_, e)| e.kind.is_patroller() && e.pos == at)
            .map(|(j, _)| j)
    }

    fn shown_glyph(&self, idx: usize) -> Glyph {
        let e = &self.entities[idx];
        e.sprites.glyph(e.sprite)
    }

    /// What stays visible at `pos` once entity `leaving` is gone.
    fn backdrop(&self, pos: Pos, leaving: usize) -> Option<Glyph> {
        match physics::occupant(&self.entities, pos, leaving) {
            Some(j) => Some(self.shown_glyph(j)),
            None => self.grid.glyph_at(pos),
        }
    }
}

// ── Mutation with draw output ──

impl World {
    /// Switch sprite state and redraw in place.
    pub fn show(&mut self, idx: usize, state: SpriteState, out: &mut Outcome) {
        let e = &mut self.entities[idx];
        e.sprite = state;
        out.draw(e.pos, e.sprites.glyph(state));
    }

    /// Erase at the old cell, move, draw at the new cell with `state`.
    pub fn relocate(&mut self, idx: usize, to: Pos, state: SpriteState, out: &mut Outcome) {
        self.vacate(idx, out);
        self.entities[idx].pos = to;
        self.show(idx, state, out);
    }

    /// Like `relocate`, with the sprite picked from the support at `to`.
    pub fn settle(&mut self, idx: usize, to: Pos, out: &mut Outcome) {
        self.vacate(idx, out);
        self.entities[idx].pos = to;
        let state = self.resting_sprite(idx);
        self.show(idx, state, out);
    }

    fn vacate(&self, idx: usize, out: &mut Outcome) {
        let from = self.entities[idx].pos;
        match self.backdrop(from, idx) {
            Some(g) => out.draw(from, g),
            None => out.erase(from),
        }
    }

    /// Full redraw: level glyphs, then entities with the player on top.
    pub fn render_all(&self, out: &mut Outcome) {
        out.clear();
        for pos in self.grid.positions() {
            if let Some(g) = self.grid.glyph_at(pos) {
                out.draw(pos, g);
            }
        }
        for (idx, e) in self.entities.iter().enumerate().skip(1) {
            out.draw(e.pos, self.shown_glyph(idx));
        }
        out.draw(self.player().pos, self.shown_glyph(PLAYER));
    }

    /// Text across row 0, cut at the grid width.
    pub fn render_message(&self, text: &str, out: &mut Outcome) {
        for (col, ch) in text.chars().take(self.grid.cols()).enumerate() {
            out.draw(Pos::new(0, col), Glyph::Char(ch));
        }
    }

    pub fn respawn_all(&mut self) {
        for e in &mut self.entities {
            e.respawn();
        }
    }

    pub fn respawn_player(&mut self) {
        self.player_mut().respawn();
    }
}

#[cfg(test)]
impl World {
    /// World over a level text with default timing and rules.
    pub fn from_map(map: &str) -> World {
        let level = super::level::parse(map).expect("fixture level parses");
        World::new(level, TimingConfig::default(), RulesConfig::default())
            .expect("fixture level validates")
    }
}
