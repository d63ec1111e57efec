/// Entities: Player, Pushable Block, Patroller.
///
/// One struct carries the shared state (position, sprites, airborne flag,
/// tick clock); kind-specific data lives in the `Kind` tag so every rule that
/// differs by kind is an exhaustive `match`.

use std::time::Duration;

use super::glyph::{SpriteSet, SpriteState};
use super::grid::{Facing, Pos};

/// Air mobility of the player: lateral moves allowed while airborne.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Airtime {
    pub budget: u32,
    pub used: u32,
}

impl Airtime {
    pub fn new(budget: u32) -> Self {
        Airtime { budget, used: 0 }
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.budget
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// Patrol heading and inclusive column range, fixed at construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Patrol {
    pub heading: Facing,
    pub left_bound: usize,
    pub right_bound: usize,
}

impl Patrol {
    pub fn new(spawn_col: usize, radius: usize) -> Self {
        Patrol {
            heading: Facing::Right,
            left_bound: spawn_col.saturating_sub(radius),
            right_bound: spawn_col + radius,
        }
    }

    pub fn at_bound(&self, col: usize, facing: Facing) -> bool {
        match facing {
            Facing::Left => col <= self.left_bound,
            Facing::Right => col >= self.right_bound,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Player(Airtime),
    Block,
    Patroller(Patrol),
}

impl Kind {
    pub fn is_block(&self) -> bool {
        matches!(self, Kind::Block)
    }

    pub fn is_patroller(&self) -> bool {
        matches!(self, Kind::Patroller(_))
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Kind::Player(_))
    }
}

/// Fixed-interval logical timer compared against the world clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TickClock {
    interval: Duration,
    next_due: Duration,
}

impl TickClock {
    /// A fresh clock is due immediately.
    pub fn new(interval: Duration) -> Self {
        TickClock { interval, next_due: Duration::ZERO }
    }

    /// True at most once per interval. Consumes the tick when it fires.
    pub fn elapsed(&mut self, now: Duration) -> bool {
        if now >= self.next_due {
            self.next_due = now + self.interval;
            true
        } else {
            false
        }
    }

    /// Defer the next tick by a full interval from `now`.
    pub fn restart(&mut self, now: Duration) {
        self.next_due = now + self.interval;
    }

    /// Make the clock due again (level reset).
    pub fn rewind(&mut self) {
        self.next_due = Duration::ZERO;
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub kind: Kind,
    pub pos: Pos,
    pub spawn: Pos,
    pub sprites: SpriteSet,
    pub sprite: SpriteState,
    pub airborne: bool,
    pub clock: TickClock,
}

impl Entity {
    fn new(kind: Kind, pos: Pos, sprites: SpriteSet, interval: Duration) -> Self {
        Entity {
            kind,
            pos,
            spawn: pos,
            sprites,
            sprite: SpriteState::Default,
            airborne: false,
            clock: TickClock::new(interval),
        }
    }

    pub fn player(pos: Pos, air_budget: u32, interval: Duration) -> Self {
        Entity::new(Kind::Player(Airtime::new(air_budget)), pos, SpriteSet::player(), interval)
    }

    pub fn block(pos: Pos, interval: Duration) -> Self {
        Entity::new(Kind::Block, pos, SpriteSet::block(), interval)
    }

    pub fn patroller(pos: Pos, radius: usize, interval: Duration) -> Self {
        Entity::new(
            Kind::Patroller(Patrol::new(pos.col, radius)),
            pos,
            SpriteSet::patroller(),
            interval,
        )
    }

    pub fn airtime(&self) -> Option<&Airtime> {
        match &self.kind {
            Kind::Player(a) => Some(a),
            _ => None,
        }
    }

    pub fn airtime_mut(&mut self) -> Option<&mut Airtime> {
        match &mut self.kind {
            Kind::Player(a) => Some(a),
            _ => None,
        }
    }

    /// Airborne with no lateral moves left: moves and jumps are refused.
    pub fn air_locked(&self) -> bool {
        self.airborne && self.airtime().map_or(false, Airtime::exhausted)
    }

    /// Back to spawn with default sprite, grounded, full budget, clock due.
    pub fn respawn(&mut self) {
        self.pos = self.spawn;
        self.sprite = SpriteState::Default;
        self.airborne = false;
        self.clock.rewind();
        match &mut self.kind {
            Kind::Player(air) => air.reset(),
            Kind::Patroller(patrol) => patrol.heading = Facing::Right,
            Kind::Block => {}
        }
    }
}
