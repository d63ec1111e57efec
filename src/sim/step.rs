/// The step function: advances the world by one loop iteration.
///
/// Processing order:
///   1. Pause phases (death / goal / banner); nothing else runs while paused
///   2. Manual reset
///   3. Collision (player sharing a cell with a patroller)
///   4. Input: left, right, jump
///   5. Goal check
///   6. Player gravity (own clock)
///   7. Landing: airborne and air budget cleared once on a floor, or
///      set when the player lost its support
///   8. Patrollers (own clocks)
///   9. Block gravity (own clocks)
///
/// The order is part of the game's behavior and must not change.

use std::time::Duration;

use crate::domain::grid::Facing;
use super::event::{FrameInput, GameEvent, Outcome};
use super::motion;
use super::world::{Phase, World, COMPLETE_MESSAGE, PLAYER};
use crate::domain::glyph::SpriteState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut World, input: FrameInput, now: Duration) -> Outcome {
    let mut out = Outcome::default();
    world.now = now;

    if !world.phase.is_playing() {
        resolve_pause(world, &mut out);
        return out;
    }

    if input.reset {
        resolve_reset(world, &mut out);
    }
    if resolve_collision(world, &mut out) {
        return out;
    }
    resolve_input(world, input, &mut out);
    if resolve_goal(world, &mut out) {
        return out;
    }
    resolve_player_gravity(world, &mut out);
    resolve_landing(world, &mut out);
    resolve_patrollers(world, &mut out);
    resolve_blocks(world, &mut out);

    out
}

// ══════════════════════════════════════════════════════════════
// Pauses
// ══════════════════════════════════════════════════════════════

fn resolve_pause(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    match world.phase {
        Phase::Playing => {}
        Phase::Dying { resume_at } if now >= resume_at => {
            let all = world.rules.death_resets_all;
            restart_level(world, all, out);
            if !all {
                evict_patrollers(world, out);
            }
        }
        Phase::GoalReached { resume_at } if now >= resume_at => {
            out.clear();
            world.render_message(COMPLETE_MESSAGE, out);
            out.emit(GameEvent::LevelComplete);
            world.phase = Phase::LevelComplete { resume_at: now + world.timing.message_time };
        }
        Phase::LevelComplete { resume_at } if now >= resume_at => {
            restart_level(world, true, out);
        }
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Reset / collision / goal
// ══════════════════════════════════════════════════════════════

fn resolve_reset(world: &mut World, out: &mut Outcome) {
    let p = world.player();
    log::debug!(
        "manual reset: pos={:?} airborne={} airtime={:?}",
        p.pos,
        p.airborne,
        p.airtime()
    );
    restart_level(world, true, out);
    out.emit(GameEvent::LevelReset);
}

/// A patroller on the player's cell kills it. Returns whether it did.
fn resolve_collision(world: &mut World, out: &mut Outcome) -> bool {
    if world.patroller_on_player().is_none() {
        return false;
    }
    let at = world.player().pos;
    world.show(PLAYER, SpriteState::Dead, out);
    world.deaths += 1;
    world.phase = Phase::Dying { resume_at: world.now + world.timing.death_pause };
    out.emit(GameEvent::PlayerKilled { at });
    log::info!("player killed at {:?} (deaths: {})", at, world.deaths);
    true
}

fn resolve_goal(world: &mut World, out: &mut Outcome) -> bool {
    if world.player().pos != world.goal {
        return false;
    }
    world.clears += 1;
    world.phase = Phase::GoalReached { resume_at: world.now + world.timing.goal_pause };
    out.emit(GameEvent::GoalReached);
    log::info!("goal reached on \"{}\" (clears: {})", world.name, world.clears);
    true
}

/// Put entities back at spawn and redraw everything.
/// `all == false` moves only the player.
pub fn restart_level(world: &mut World, all: bool, out: &mut Outcome) {
    if all {
        world.respawn_all();
    } else {
        world.respawn_player();
    }
    world.phase = Phase::Playing;
    world.render_all(out);
}

/// Patrollers still standing on the respawned player take their turn now,
/// so one death is not followed by another on the same cell. One that
/// cannot walk off goes back to its own spawn.
fn evict_patrollers(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    while let Some(idx) = world.patroller_on_player() {
        // The first advance may only turn it around.
        for _ in 0..2 {
            if world.entities[idx].pos == world.player().pos {
                motion::advance(world, idx, out);
            }
        }
        if world.entities[idx].pos == world.player().pos {
            world.entities[idx].respawn();
            world.render_all(out);
        }
        world.entities[idx].clock.restart(now);
        log::debug!("patroller {} moved off the spawn to {:?}", idx, world.entities[idx].pos);
    }
}

// ══════════════════════════════════════════════════════════════
// Player input
// ══════════════════════════════════════════════════════════════

fn resolve_input(world: &mut World, input: FrameInput, out: &mut Outcome) {
    if input.left {
        motion::move_horizontal(world, PLAYER, Facing::Left, out);
    }
    if input.right {
        motion::move_horizontal(world, PLAYER, Facing::Right, out);
    }
    if input.jump {
        motion::attempt_jump(world, PLAYER, out);
    }
}

// ══════════════════════════════════════════════════════════════
// Timed updates
// ══════════════════════════════════════════════════════════════

fn resolve_player_gravity(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    if world.player_mut().clock.elapsed(now) {
        motion::apply_gravity(world, PLAYER, out);
    }
}

/// Grounded: airborne and the air budget clear. Unsupported without having
/// jumped (whatever held the player up moved away): same as walking off a
/// ledge.
fn resolve_landing(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    let grounded = world.on_floor(PLAYER);
    let p = world.player_mut();
    if grounded {
        p.airborne = false;
        if let Some(air) = p.airtime_mut() {
            air.reset();
        }
    } else if !p.airborne {
        p.airborne = true;
        p.clock.restart(now);
        if let Some(air) = p.airtime_mut() {
            air.used = air.budget;
        }
        world.show(PLAYER, SpriteState::Falling, out);
    }
}

fn resolve_patrollers(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    for idx in 0..world.entities.len() {
        if !world.entities[idx].kind.is_patroller() || !world.entities[idx].clock.elapsed(now) {
            continue;
        }
        if world.on_floor(idx) {
            motion::advance(world, idx, out);
        } else {
            motion::apply_gravity(world, idx, out);
        }
    }
}

fn resolve_blocks(world: &mut World, out: &mut Outcome) {
    let now = world.now;
    for idx in 0..world.entities.len() {
        if world.entities[idx].kind.is_block() && world.entities[idx].clock.elapsed(now) {
            motion::apply_gravity(world, idx, out);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RulesConfig, TimingConfig};
    use crate::domain::grid::Pos;
    use crate::sim::level::{self, REFERENCE_LEVEL};
    use crate::ui::surface::{Canvas, Surface};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    const IDLE: FrameInput = FrameInput { left: false, right: false, jump: false, reset: false };
    const LEFT: FrameInput = FrameInput { left: true, right: false, jump: false, reset: false };
    const RIGHT: FrameInput = FrameInput { left: false, right: true, jump: false, reset: false };
    const JUMP: FrameInput = FrameInput { left: false, right: false, jump: true, reset: false };
    const RESET: FrameInput = FrameInput { left: false, right: false, jump: false, reset: true };

    /// Canvas holding the initial render of `w`.
    fn painted(w: &World) -> Canvas {
        let mut canvas = Canvas::new(w.grid.rows(), w.grid.cols());
        let mut out = Outcome::default();
        w.render_all(&mut out);
        canvas.apply(&out.draws);
        canvas
    }

    #[test]
    fn jump_and_land_on_reference_level() {
        let mut w = World::from_map(REFERENCE_LEVEL);
        step(&mut w, JUMP, ms(0));
        assert_eq!(w.player().pos, Pos::new(2, 0));
        assert_eq!(w.player().sprite, SpriteState::Falling);
        assert!(w.player().airborne);

        step(&mut w, IDLE, ms(499));
        assert_eq!(w.player().pos, Pos::new(2, 0));

        step(&mut w, IDLE, ms(500));
        assert_eq!(w.player().pos, Pos::new(3, 0));
        assert_eq!(w.player().sprite, SpriteState::Default);
        assert!(!w.player().airborne);
    }

    #[test]
    fn player_on_bottom_row_never_airborne() {
        let mut w = World::from_map(REFERENCE_LEVEL);
        for t in 0..40 {
            step(&mut w, IDLE, ms(t * 125));
            assert!(!w.player().airborne);
            assert_eq!(w.player().pos, Pos::new(3, 0));
        }
    }

    #[test]
    fn left_then_right_returns_home() {
        let mut w = World::from_map("*.....\n......\n..P...\n");
        step(&mut w, RIGHT, ms(0));
        assert_eq!(w.player().pos, Pos::new(2, 3));
        step(&mut w, LEFT, ms(10));
        assert_eq!(w.player().pos, Pos::new(2, 2));
        assert_eq!(w.player().sprite, SpriteState::Default);
        assert!(!w.player().airborne);
    }

    #[test]
    fn push_into_patroller_is_rejected() {
        let mut w = World::from_map("*....\nPOE#.\n");
        let out = step(&mut w, RIGHT, ms(0));
        assert_eq!(w.player().pos, Pos::new(1, 0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
        assert_eq!(w.entities[2].pos, Pos::new(1, 2));
        assert!(!out.events.iter().any(|e| matches!(e, GameEvent::Pushed { .. })));
    }

    #[test]
    fn patroller_stays_in_range() {
        let level = level::parse("*.............\nP......E......\n").unwrap();
        let rules = RulesConfig { patrol_radius: 3, ..RulesConfig::default() };
        let mut w = World::new(level, TimingConfig::default(), rules).unwrap();
        let mut cols = vec![];
        for t in 0..60 {
            step(&mut w, IDLE, ms(t * 250));
            cols.push(w.entities[1].pos.col);
        }
        assert!(cols.iter().all(|c| (4..=10).contains(c)));
        assert!(cols.contains(&4) && cols.contains(&10));
    }

    #[test]
    fn reaching_goal_restores_initial_screen() {
        let mut w = World::from_map("*P.O.\n");
        let mut canvas = painted(&w);
        let initial = canvas.clone();

        for (t, input) in [(0, RIGHT), (10, RIGHT), (20, LEFT), (30, LEFT)] {
            canvas.apply(&step(&mut w, input, ms(t)).draws);
        }
        assert_eq!(w.entities[1].pos, Pos::new(0, 4));
        assert!(matches!(w.phase, Phase::GoalReached { .. }));

        // input is dropped while paused
        canvas.apply(&step(&mut w, RIGHT, ms(100)).draws);
        assert_eq!(w.player().pos, Pos::new(0, 0));

        let out = step(&mut w, IDLE, ms(530));
        canvas.apply(&out.draws);
        assert_eq!(out.events, vec![GameEvent::LevelComplete]);
        assert_eq!(canvas.row_text(0), "Level");

        canvas.apply(&step(&mut w, IDLE, ms(3529)).draws);
        assert_eq!(canvas.row_text(0), "Level");

        canvas.apply(&step(&mut w, IDLE, ms(3530)).draws);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.player().pos, Pos::new(0, 1));
        assert_eq!(w.clears, 1);
        assert_eq!(canvas, initial);
    }

    #[test]
    fn death_happens_once_and_resets_player() {
        let mut w = World::from_map("*.....\n..EP..\n");
        step(&mut w, IDLE, ms(0));
        assert_eq!(w.entities[1].pos, w.player().pos);

        let mut kills = 0;
        for t in (10..2010).step_by(100) {
            let out = step(&mut w, IDLE, ms(t));
            kills += out.events.iter().filter(|e| matches!(e, GameEvent::PlayerKilled { .. })).count();
        }
        assert_eq!(kills, 1);
        assert_eq!(w.deaths, 1);
        assert_eq!(w.player().sprite, SpriteState::Dead);

        let out = step(&mut w, IDLE, ms(2010));
        assert_eq!(out.draws.first(), Some(&crate::sim::event::DrawOp::Clear));
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.player().pos, Pos::new(1, 3));
        assert_eq!(w.player().sprite, SpriteState::Default);
        assert_eq!(w.player().airtime().map(|a| a.used), Some(0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 2));
    }

    fn sparing_world(map: &str) -> World {
        let level = level::parse(map).unwrap();
        let rules = RulesConfig { death_resets_all: false, ..RulesConfig::default() };
        World::new(level, TimingConfig::default(), rules).unwrap()
    }

    fn kill_count(out: &Outcome) -> usize {
        out.events.iter().filter(|e| matches!(e, GameEvent::PlayerKilled { .. })).count()
    }

    #[test]
    fn death_can_spare_other_entities() {
        let mut w = sparing_world("*.....\n..EP..\n");
        let mut total = 0;
        for t in (0..2500).step_by(50) {
            total += kill_count(&step(&mut w, IDLE, ms(t)));
        }
        assert_eq!(total, 1);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.player().pos, Pos::new(1, 3));
        // the patroller walked on rather than going home
        assert_eq!(w.entities[1].pos, Pos::new(1, 4));
    }

    #[test]
    fn walled_patroller_turns_off_the_spawn() {
        let mut w = sparing_world("*...\n#EP#\n");
        let mut total = 0;
        for t in (0..2500).step_by(50) {
            total += kill_count(&step(&mut w, IDLE, ms(t)));
        }
        assert_eq!(total, 1);
        assert_eq!(w.player().pos, Pos::new(1, 2));
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
    }

    #[test]
    fn support_walking_away_leaves_player_falling() {
        let mut w = World::from_map("*.....\n.P....\n.E....\n");
        step(&mut w, IDLE, ms(0));
        assert_eq!(w.entities[1].pos, Pos::new(2, 2));
        assert_eq!(w.player().pos, Pos::new(1, 1));

        step(&mut w, JUMP, ms(10));
        assert_eq!(w.player().pos, Pos::new(1, 1));
        assert!(w.player().airborne);
        assert!(w.player().air_locked());
        assert_eq!(w.player().sprite, SpriteState::Falling);

        step(&mut w, IDLE, ms(509));
        assert_eq!(w.player().pos, Pos::new(1, 1));
        step(&mut w, IDLE, ms(510));
        assert_eq!(w.player().pos, Pos::new(2, 1));
        assert!(!w.player().airborne);
        assert_eq!(w.player().sprite, SpriteState::Default);
    }

    #[test]
    fn manual_reset_puts_everything_back() {
        let mut w = World::from_map("*.....\nPO....\n");
        step(&mut w, RIGHT, ms(0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 2));
        let out = step(&mut w, RESET, ms(10));
        assert_eq!(w.entities[1].pos, Pos::new(1, 1));
        assert_eq!(w.player().pos, Pos::new(1, 0));
        assert!(out.events.contains(&GameEvent::LevelReset));
    }

    #[test]
    fn blocks_and_patrollers_fall_on_their_own_clocks() {
        let mut w = World::from_map("*..E\nO...\n....\n...P\n");
        step(&mut w, IDLE, ms(0));
        assert_eq!(w.entities[1].pos, Pos::new(1, 3));
        assert_eq!(w.entities[2].pos, Pos::new(2, 0));
        step(&mut w, IDLE, ms(250));
        assert_eq!(w.entities[1].pos, Pos::new(1, 3));
        step(&mut w, IDLE, ms(500));
        assert_eq!(w.entities[1].pos, Pos::new(2, 3));
        assert_eq!(w.entities[2].pos, Pos::new(3, 0));
    }

    #[test]
    fn positions_stay_on_the_grid() {
        let mut w = World::from_map(REFERENCE_LEVEL);
        let inputs = [RIGHT, RIGHT, JUMP, RIGHT, RIGHT, LEFT, JUMP, LEFT, IDLE, RIGHT];
        for t in 0..200u64 {
            let input = inputs[(t % inputs.len() as u64) as usize];
            step(&mut w, input, ms(t * 60));
            for e in &w.entities {
                assert!(w.grid.contains(e.pos));
            }
        }
    }
}
