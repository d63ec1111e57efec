/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::Instant;

use anyhow::{Context, Result};

use config::GameConfig;
use domain::glyph::CUSTOM_GLYPHS;
use sim::event::{GameEvent, Outcome};
use sim::level;
use sim::step;
use sim::world::World;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{Hud, TerminalSurface};
use ui::sound::SoundEngine;
use ui::surface::Surface;

fn main() -> Result<()> {
    let config = GameConfig::load();
    init_logging(&config)?;
    for warning in &config.warnings {
        log::warn!("{}", warning);
    }

    let level = level::load(config.level_file.as_deref()).context("could not load level")?;
    log::info!(
        "level \"{}\": {}x{}, {} entities",
        level.name,
        level.grid.rows(),
        level.grid.cols(),
        level.spawns.len() + 1
    );
    let mut world = World::new(level, config.timing.clone(), config.rules.clone())
        .context("level failed validation")?;

    let mut surface = TerminalSurface::new(world.grid.rows(), world.grid.cols());
    if let Err(e) = surface.init() {
        let _ = surface.cleanup();
        return Err(e).context("terminal init failed");
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut surface, sound.as_ref(), &config);
    let restored = surface.cleanup().context("terminal cleanup failed");
    result?;
    restored?;

    println!();
    println!("Thanks for playing Jump Man!");
    println!("Deaths: {}  Clears: {}", world.deaths, world.clears);
    Ok(())
}

/// `RUST_LOG` wins over `general.log_level`. With `general.log_file` set,
/// records go to that file instead of stderr, which the game screen owns.
fn init_logging(config: &GameConfig) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .with_context(|| format!("could not create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("logger already initialized")?;
    Ok(())
}

fn game_loop(
    world: &mut World,
    surface: &mut TerminalSurface,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    for glyph in &CUSTOM_GLYPHS {
        surface.register_custom_glyph(glyph);
    }
    let mut first = Outcome::default();
    world.render_all(&mut first);
    surface.apply(&first.draws);

    // Single monotonic source, read once per iteration.
    let start = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_requested() || gp.quit_requested() {
            log::info!("quit requested");
            break;
        }

        let input = kb.frame().merge(gp.frame());
        let outcome = step::step(world, input, start.elapsed());
        surface.apply(&outcome.draws);
        process_events(sound, &outcome.events);

        let hud = Hud {
            level: &world.name,
            deaths: world.deaths,
            clears: world.clears,
        };
        surface.present(&hud).context("render failed")?;

        std::thread::sleep(config.timing.poll_interval);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        log::debug!("event: {:?}", event);
        if let Some(sfx) = sound {
            sfx.play_event(event);
        }
    }
}
