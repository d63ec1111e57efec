/// Level loader.
///
/// ## Sources (priority order):
///   1. `general.level_file` from config.toml
///   2. Built-in reference level
///
/// ## Level format (`.txt`):
///   Optional line 1: `# Level Name`
///   Lines: map rows, all the same length
///
/// ## Cell legend:
///   '#' = Platform (solid)        'h' = Heart (decorative)
///   '*' = Goal                    '.' or ' ' = Empty
///   'P' = Player spawn            'O' = Pushable block spawn
///   'E' = Patroller spawn
///
/// Spawn markers leave Empty terrain behind. Exactly one 'P' and one '*'.
/// Every problem is reported at load time, never mid-game.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::glyph::{Glyph, HEART, PLATFORM};
use crate::domain::grid::{LevelGrid, Pos};
use crate::domain::tile::Cell;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level has no map rows")]
    Empty,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },
    #[error("unknown cell marker {marker:?} at row {row}, col {col}")]
    UnknownMarker { marker: char, row: usize, col: usize },
    #[error("level has no player spawn 'P'")]
    MissingPlayer,
    #[error("second player spawn at {0:?}")]
    DuplicatePlayer(Pos),
    #[error("level has no goal '*'")]
    MissingGoal,
    #[error("second goal at {0:?}")]
    DuplicateGoal(Pos),
    #[error("glyph {0:?} is not in the custom glyph table")]
    UnknownGlyph(Glyph),
    #[error("{entity} sprite set has no {state} glyph")]
    MissingSprite { entity: &'static str, state: &'static str },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpawnKind {
    Block,
    Patroller,
}

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub grid: LevelGrid,
    pub goal: Pos,
    pub player: Pos,
    /// Non-player spawns in map order (row-major).
    pub spawns: Vec<(SpawnKind, Pos)>,
}

/// The original 4×20 LCD stage.
pub const REFERENCE_LEVEL: &str = "\
# Jump Man 2004
hhh...O............*
....####.###########
...#................
P.O..........O..E...
";

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level file, or the reference level when none is set.
pub fn load(path: Option<&Path>) -> Result<Level, LevelError> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|source| LevelError::Read {
                path: p.to_path_buf(),
                source,
            })?;
            log::info!("loading level from {}", p.display());
            parse(&text)
        }
        None => parse(REFERENCE_LEVEL),
    }
}

pub fn parse(content: &str) -> Result<Level, LevelError> {
    let mut lines = content.lines().peekable();

    let mut name = String::from("Untitled");
    if let Some(&first) = lines.peek() {
        if is_name_line(first) {
            name = first[1..].trim().to_string();
            lines.next();
        }
    }

    let rows: Vec<&str> = lines.filter(|l| !l.is_empty()).collect();
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let width = rows[0].chars().count();
    let mut cells = Vec::with_capacity(rows.len());
    let mut spawns = vec![];
    let mut player = None;
    let mut goal = None;

    for (r, line) in rows.iter().enumerate() {
        let found = line.chars().count();
        if found != width {
            return Err(LevelError::RaggedRow { row: r, expected: width, found });
        }
        let mut row = Vec::with_capacity(width);
        for (c, ch) in line.chars().enumerate() {
            let pos = Pos::new(r, c);
            let cell = match ch {
                '#' => Cell::Solid(Glyph::Custom(PLATFORM)),
                'h' => Cell::Decorative(Glyph::Custom(HEART)),
                '*' => {
                    if goal.replace(pos).is_some() {
                        return Err(LevelError::DuplicateGoal(pos));
                    }
                    Cell::Goal
                }
                '.' | ' ' => Cell::Empty,
                'P' => {
                    if player.replace(pos).is_some() {
                        return Err(LevelError::DuplicatePlayer(pos));
                    }
                    Cell::Empty
                }
                'O' => {
                    spawns.push((SpawnKind::Block, pos));
                    Cell::Empty
                }
                'E' => {
                    spawns.push((SpawnKind::Patroller, pos));
                    Cell::Empty
                }
                other => return Err(LevelError::UnknownMarker { marker: other, row: r, col: c }),
            };
            row.push(cell);
        }
        cells.push(row);
    }

    Ok(Level {
        name,
        grid: LevelGrid::new(cells),
        goal: goal.ok_or(LevelError::MissingGoal)?,
        player: player.ok_or(LevelError::MissingPlayer)?,
        spawns,
    })
}

/// `# Name` header: a '#' followed by whitespace. A map row of platforms
/// ("####...") is not a header.
fn is_name_line(line: &str) -> bool {
    line.starts_with("# ")
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
