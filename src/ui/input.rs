/// Keyboard input tracker.
///
/// Every game button is edge-triggered: a key counts once when it goes from
/// "not held" to "held". Auto-repeat events while the key stays down are
/// swallowed, so holding → walks one cell, not a stream of cells.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::event::FrameInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const JUMP_KEYS: [KeyCode; 4] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const RESET_KEYS: [KeyCode; 2] = [KeyCode::Char('r'), KeyCode::Char('R')];
const QUIT_KEYS: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per loop iteration, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Release not trusted without enhancement; timeout expires it.
            }
            _ => {
                let was_held = self.is_held(key.code, at);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Game buttons pressed since the last drain.
    pub fn frame(&self) -> FrameInput {
        FrameInput {
            left: self.any_pressed(&LEFT_KEYS),
            right: self.any_pressed(&RIGHT_KEYS),
            jump: self.any_pressed(&JUMP_KEYS),
            reset: self.any_pressed(&RESET_KEYS),
        }
    }

    /// Esc, Q or Ctrl+C this drain.
    pub fn quit_requested(&self) -> bool {
        self.any_pressed(&QUIT_KEYS) || self.ctrl_c_pressed()
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    fn is_held(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT)
    }
}
