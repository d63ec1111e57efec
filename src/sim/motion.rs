/// Entity movement: lateral moves and pushes, the jump impulse, gravity, and
/// the patroller's walk.
///
/// Every operation either commits a whole move (draws included) or changes
/// nothing and returns `false`. Rejections are ordinary outcomes, not errors.
///
/// Occupancy rule: no move commits into an occupied cell, with one exception.
/// A patroller may walk into the player's cell; `step` turns that into a
/// death on the next step.

use crate::domain::entity::{Entity, Kind};
use crate::domain::glyph::SpriteState;
use crate::domain::grid::{Direction, Facing};
use super::event::{GameEvent, Outcome};
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Lateral movement
// ══════════════════════════════════════════════════════════════

/// One cell left or right, with the interaction rule of the mover's kind.
pub fn move_horizontal(w: &mut World, idx: usize, facing: Facing, out: &mut Outcome) -> bool {
    match w.entities[idx].kind {
        Kind::Player(_) => move_player(w, idx, facing, out),
        Kind::Block => move_block(w, idx, facing, out),
        Kind::Patroller(_) => move_patroller(w, idx, facing, out),
    }
}

fn move_player(w: &mut World, idx: usize, facing: Facing, out: &mut Outcome) -> bool {
    if w.entities[idx].air_locked() {
        return false;
    }
    let dir = Direction::from(facing);
    if let Some(other) = w.neighbor(idx, dir) {
        // Blocks get pushed; anything else is a wall.
        return w.entities[other].kind.is_block() && move_block(w, other, facing, out);
    }
    if !step_aside(w, idx, dir, out) {
        return false;
    }

    if !w.on_floor(idx) {
        let now = w.now;
        let e = &mut w.entities[idx];
        let was_airborne = e.airborne;
        if let Some(air) = e.airtime_mut() {
            // Walking off a ledge spends the whole budget; air moves after a
            // jump spend one each.
            if was_airborne {
                air.used += 1;
            } else {
                air.used = air.budget;
            }
        }
        e.airborne = true;
        e.clock.restart(now);
    }
    true
}

fn move_block(w: &mut World, idx: usize, facing: Facing, out: &mut Outcome) -> bool {
    let dir = Direction::from(facing);
    let ahead = w.neighbor(idx, dir).map(|j| (j, w.entities[j].kind));
    match ahead {
        // Chained push: only the far end of the row moves.
        Some((next, Kind::Block)) => move_block(w, next, facing, out),
        Some(_) => false,
        None => {
            let from = w.entities[idx].pos;
            if !step_aside(w, idx, dir, out) {
                return false;
            }
            out.emit(GameEvent::Pushed { from, to: w.entities[idx].pos });
            true
        }
    }
}

fn move_patroller(w: &mut World, idx: usize, facing: Facing, out: &mut Outcome) -> bool {
    let dir = Direction::from(facing);
    match w.neighbor(idx, dir) {
        Some(j) if !w.entities[j].kind.is_player() => false,
        _ => step_aside(w, idx, dir, out),
    }
}

/// The shared terrain half of a lateral move.
fn step_aside(w: &mut World, idx: usize, dir: Direction, out: &mut Outcome) -> bool {
    if w.blocked(idx, dir) {
        return false;
    }
    match w.grid.neighbor(w.entities[idx].pos, dir) {
        Some(to) => {
            w.settle(idx, to, out);
            true
        }
        None => false,
    }
}

// ══════════════════════════════════════════════════════════════
// Jump
// ══════════════════════════════════════════════════════════════

/// Instant one-row rise. The next gravity tick is a full interval away.
pub fn attempt_jump(w: &mut World, idx: usize, out: &mut Outcome) -> bool {
    let e = &w.entities[idx];
    if !e.kind.is_player() || e.airborne || e.air_locked() || !w.on_floor(idx) {
        return false;
    }
    if w.blocked(idx, Direction::Up) || w.neighbor(idx, Direction::Up).is_some() {
        return false;
    }
    let Some(above) = w.grid.neighbor(e.pos, Direction::Up) else {
        return false;
    };

    let now = w.now;
    let e = &mut w.entities[idx];
    e.airborne = true;
    e.clock.restart(now);
    w.relocate(idx, above, SpriteState::Falling, out);
    out.emit(GameEvent::Jumped);
    true
}

// ══════════════════════════════════════════════════════════════
// Gravity
// ══════════════════════════════════════════════════════════════

/// Drop one row when unsupported; otherwise show the resting sprite.
/// Returns whether the entity fell.
pub fn apply_gravity(w: &mut World, idx: usize, out: &mut Outcome) -> bool {
    let below = w.grid.neighbor(w.entities[idx].pos, Direction::Down);
    match below {
        Some(to) if !w.on_floor(idx) => {
            w.settle(idx, to, out);
            true
        }
        _ => {
            w.show(idx, SpriteState::Default, out);
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Patrol
// ══════════════════════════════════════════════════════════════

/// One patrol step: turn around when the way ahead is closed, otherwise
/// walk, then turn around on reaching the end of the range.
pub fn advance(w: &mut World, idx: usize, out: &mut Outcome) {
    let Kind::Patroller(patrol) = w.entities[idx].kind else {
        return;
    };
    let heading = patrol.heading;
    let dir = Direction::from(heading);
    let col = w.entities[idx].pos.col;

    let obstructed = patrol.at_bound(col, heading)
        || w.blocked(idx, dir)
        || w.neighbor(idx, dir).map_or(false, |j| !w.entities[j].kind.is_player());

    if obstructed {
        set_heading(&mut w.entities[idx], heading.flipped());
        return;
    }
    if move_patroller(w, idx, heading, out) && patrol.at_bound(w.entities[idx].pos.col, heading) {
        set_heading(&mut w.entities[idx], heading.flipped());
    }
}

fn set_heading(e: &mut Entity, heading: Facing) {
    if let Kind::Patroller(patrol) = &mut e.kind {
        patrol.heading = heading;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Pos;
    use crate::sim::world::PLAYER;

    fn heading(w: &World, idx: usize) -> Option<Facing> {
        match w.entities[idx].kind {
            Kind::Patroller(p) => Some(p.heading),
            _ => None,
        }
    }

    #[test]
    fn player_walks_on_flat_ground() {
        let mut w = World::from_map("*....\n.P...\n");
        let mut out = Outcome::default();
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 2));
        assert_eq!(w.player().sprite, SpriteState::Default);
        assert!(!w.player().airborne);
    }

    #[test]
    fn grid_edge_and_walls_stop_the_player() {
        let mut w = World::from_map("*..\nP#.\n");
        let mut out = Outcome::default();
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Left, &mut out));
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 0));
        assert!(out.draws.is_empty());
    }

    #[test]
    fn walking_off_a_ledge_spends_the_air_budget() {
        let mut w = World::from_map("*....\n.P...\n.#...\n.....\n");
        let mut out = Outcome::default();
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        let p = w.player();
        assert!(p.airborne);
        assert_eq!(p.sprite, SpriteState::Falling);
        assert_eq!(p.airtime().map(|a| a.used), Some(2));
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Left, &mut out));
        assert!(!attempt_jump(&mut w, PLAYER, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 2));
    }

    #[test]
    fn jump_then_two_air_moves() {
        let mut w = World::from_map("*.....\n......\n......\nP.....\n");
        let mut out = Outcome::default();
        assert!(attempt_jump(&mut w, PLAYER, &mut out));
        assert_eq!(w.player().pos, Pos::new(2, 0));
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(2, 2));
        assert_eq!(w.player().airtime().map(|a| a.used), Some(2));
        assert!(out.events.contains(&GameEvent::Jumped));
    }

    #[test]
    fn jump_refused_under_a_platform_or_at_the_top() {
        let mut w = World::from_map("*.#\n..P\n");
        let mut out = Outcome::default();
        assert!(!attempt_jump(&mut w, PLAYER, &mut out));

        let mut top = World::from_map("P.*\n");
        assert!(!attempt_jump(&mut top, PLAYER, &mut out));
        assert!(out.draws.is_empty());
    }

    #[test]
    fn no_jump_without_support() {
        let mut w = World::from_map("*..\nP..\n...\n");
        let mut out = Outcome::default();
        assert!(!w.player().airborne);
        assert!(!attempt_jump(&mut w, PLAYER, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 0));
    }

    #[test]
    fn player_pushes_block() {
        let mut w = World::from_map("*....\nPO...\n");
        let mut out = Outcome::default();
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 2));
        assert_eq!(
            out.events,
            vec![GameEvent::Pushed { from: Pos::new(1, 1), to: Pos::new(1, 2) }]
        );
    }

    #[test]
    fn chained_push_moves_the_far_block() {
        let mut w = World::from_map("*.....\nPOO...\n");
        let mut out = Outcome::default();
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
        assert_eq!(w.entities[2].pos, Pos::new(1, 3));
    }

    #[test]
    fn block_against_patroller_does_not_move() {
        let mut w = World::from_map("*....\nPOE#.\n");
        let mut out = Outcome::default();
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
        assert_eq!(w.entities[2].pos, Pos::new(1, 2));
        assert!(out.events.is_empty());
    }

    #[test]
    fn player_cannot_walk_into_patroller() {
        let mut w = World::from_map("*...\nPE..\n");
        let mut out = Outcome::default();
        assert!(!move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.player().pos, Pos::new(1, 0));
    }

    #[test]
    fn pushed_block_over_a_gap_shows_falling() {
        let mut w = World::from_map("*....\nPO...\n##...\n.....\n");
        let mut out = Outcome::default();
        assert!(move_horizontal(&mut w, PLAYER, Facing::Right, &mut out));
        assert_eq!(w.entities[1].sprite, SpriteState::Falling);
        assert!(apply_gravity(&mut w, 1, &mut out));
        assert!(apply_gravity(&mut w, 1, &mut out));
        assert_eq!(w.entities[1].pos, Pos::new(3, 2));
        assert!(!apply_gravity(&mut w, 1, &mut out));
        assert_eq!(w.entities[1].sprite, SpriteState::Default);
    }

    #[test]
    fn gravity_stops_on_an_entity() {
        let mut w = World::from_map("*.O\n...\n..P\n");
        let mut out = Outcome::default();
        assert!(apply_gravity(&mut w, 1, &mut out));
        assert_eq!(w.entities[1].pos, Pos::new(1, 2));
        assert!(!apply_gravity(&mut w, 1, &mut out));
    }

    #[test]
    fn patroller_turns_at_walls_and_blocks() {
        let mut w = World::from_map("*....\n.E#..\n");
        let mut out = Outcome::default();
        advance(&mut w, 1, &mut out);
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
        assert_eq!(heading(&w, 1), Some(Facing::Left));
        advance(&mut w, 1, &mut out);
        assert_eq!(w.entities[1].pos, Pos::new(1, 0));

        let mut w = World::from_map("*....\nP.EO.\n");
        advance(&mut w, 1, &mut out);
        assert_eq!(w.entities[1].pos, Pos::new(1, 2));
        assert_eq!(heading(&w, 1), Some(Facing::Left));
    }

    #[test]
    fn patroller_walks_into_player() {
        let mut w = World::from_map("*...\n.EP.\n");
        let mut out = Outcome::default();
        advance(&mut w, 1, &mut out);
        assert_eq!(w.entities[1].pos, w.player().pos);
        assert_eq!(w.patroller_on_player(), Some(1));
    }

    #[test]
    fn patroller_turns_at_range_end() {
        let mut w = World::from_map("*.........\nP...E.....\n");
        w.entities[1] = Entity::patroller(Pos::new(1, 4), 2, w.timing.tick_interval);
        let mut out = Outcome::default();
        let mut seen = vec![];
        for _ in 0..12 {
            advance(&mut w, 1, &mut out);
            seen.push(w.entities[1].pos.col);
        }
        assert!(seen.iter().all(|c| (2..=6).contains(c)));
        assert!(seen.contains(&2) && seen.contains(&6));
    }
}
