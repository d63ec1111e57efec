/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `warnings` and reported once
/// logging is up.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub level_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_interval: Duration, // gravity / patrol cadence per entity
    pub poll_interval: Duration, // input sampling sleep
    pub death_pause: Duration,
    pub goal_pause: Duration,
    pub message_time: Duration, // "Level Complete" banner
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    pub air_move_budget: u32,
    pub patrol_radius: usize,
    /// Death puts blocks and patrollers back at spawn too, not only the player.
    pub death_resets_all: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub reset: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_interval: Duration::from_millis(default_tick_interval()),
            poll_interval: Duration::from_millis(default_poll_interval()),
            death_pause: Duration::from_millis(default_death_pause()),
            goal_pause: Duration::from_millis(default_goal_pause()),
            message_time: Duration::from_millis(default_message()),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            air_move_budget: default_air_budget(),
            patrol_radius: default_patrol_radius(),
            death_resets_all: true,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: u64,
    #[serde(default = "default_poll_interval")]
    poll_interval_ms: u64,
    #[serde(default = "default_death_pause")]
    death_pause_ms: u64,
    #[serde(default = "default_goal_pause")]
    goal_pause_ms: u64,
    #[serde(default = "default_message")]
    message_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_air_budget")]
    air_move_budget: u32,
    #[serde(default = "default_patrol_radius")]
    patrol_radius: usize,
    #[serde(default = "default_true")]
    death_resets_all: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_reset")]
    reset: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    level_file: String,
    #[serde(default)]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_interval() -> u64 { 500 }
fn default_poll_interval() -> u64 { 5 }
fn default_death_pause() -> u64 { 2000 }
fn default_goal_pause() -> u64 { 500 }
fn default_message() -> u64 { 3000 }
fn default_air_budget() -> u32 { 2 }
fn default_patrol_radius() -> usize { 10 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "warn".into() }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_reset() -> Vec<String> { vec!["Y".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_interval_ms: default_tick_interval(),
            poll_interval_ms: default_poll_interval(),
            death_pause_ms: default_death_pause(),
            goal_pause_ms: default_goal_pause(),
            message_ms: default_message(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            air_move_budget: default_air_budget(),
            patrol_radius: default_patrol_radius(),
            death_resets_all: true,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            reset: default_pad_reset(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            level_file: String::new(),
            log_file: String::new(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let mut warnings = vec![];
        let toml_cfg = load_toml(&candidate_dirs(), &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg);
        warnings.append(&mut cfg.warnings);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse config text directly.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from_toml)
    }

    fn from_toml(t: TomlConfig) -> Self {
        let mut warnings = vec![];

        let tick_ms = if t.timing.tick_interval_ms == 0 {
            warnings.push(format!(
                "timing.tick_interval_ms must be positive; using {}",
                default_tick_interval()
            ));
            default_tick_interval()
        } else {
            t.timing.tick_interval_ms
        };

        GameConfig {
            timing: TimingConfig {
                tick_interval: Duration::from_millis(tick_ms),
                poll_interval: Duration::from_millis(t.timing.poll_interval_ms),
                death_pause: Duration::from_millis(t.timing.death_pause_ms),
                goal_pause: Duration::from_millis(t.timing.goal_pause_ms),
                message_time: Duration::from_millis(t.timing.message_ms),
            },
            rules: RulesConfig {
                air_move_budget: t.rules.air_move_budget,
                patrol_radius: t.rules.patrol_radius,
                death_resets_all: t.rules.death_resets_all,
            },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                reset: t.gamepad.reset,
                quit: t.gamepad.quit,
            },
            level_file: non_empty_path(&t.general.level_file),
            log_file: non_empty_path(&t.general.log_file),
            log_level: t.general.log_level,
            warnings,
        }
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(PathBuf::from(s)) }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warnings.push(format!("{}: parse error: {e}; using default settings", path.display()));
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warnings.push(format!("could not read {}: {e}", path.display()));
            }
        }
    }
    TomlConfig::default()
}
