/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick ←→  →  Left / Right
///   D-pad / Left Stick ↑   →  Jump
///   A / B                  →  Jump
///   Y                      →  Reset
///   Select                 →  Quit
///
/// Like the keyboard, everything is edge-triggered. Without the `gamepad`
/// feature this compiles to a tracker that never reports a press.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::sim::event::FrameInput;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical face/shoulder button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,  // South
    B,  // East
    X,  // West
    Y,  // North
    L1, // LeftTrigger
    R1, // RightTrigger
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-input state: held (level) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    /// Update the held level; a rising edge marks `just_pressed`.
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    jump: Vec<Btn>,
    reset: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::B],
            reset: vec![Btn::Y],
            quit: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 8],

    dpad_left: BtnState,
    dpad_right: BtnState,
    dpad_up: BtnState,

    stick_left: BtnState,
    stick_right: BtnState,
    stick_up: BtnState,
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {}", e);
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 8],
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            dpad_up: BtnState::default(),
            stick_left: BtnState::default(),
            stick_right: BtnState::default(),
            stick_up: BtnState::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are logged and skipped;
    /// an action left with no valid button keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(action: &str, names: &[String]) -> Vec<Btn> {
            names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        log::warn!("gamepad.{}: unknown button name {:?}", action, s);
                    }
                    btn
                })
                .collect()
        }
        let map = &mut self.action_map;
        let jump = parse_list("jump", &cfg.jump);
        if !jump.is_empty() {
            map.jump = jump;
        }
        let reset = parse_list("reset", &cfg.reset);
        if !reset.is_empty() {
            map.reset = reset;
        }
        let quit = parse_list("quit", &cfg.quit);
        if !quit.is_empty() {
            map.quit = quit;
        }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        self.stick_left.set(self.stick_x < -STICK_DEADZONE);
        self.stick_right.set(self.stick_x > STICK_DEADZONE);
        self.stick_up.set(self.stick_y > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadLeft => self.dpad_left.set(held),
            Button::DPadRight => self.dpad_right.set(held),
            Button::DPadUp => self.dpad_up.set(held),
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.buttons[btn_index(btn)].set(held);
                }
            }
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    /// Game buttons pressed since the last update.
    pub fn frame(&self) -> FrameInput {
        FrameInput {
            left: self.dpad_left.just_pressed || self.stick_left.just_pressed,
            right: self.dpad_right.just_pressed || self.stick_right.just_pressed,
            jump: self.dpad_up.just_pressed
                || self.stick_up.just_pressed
                || self.any_just_pressed(&self.action_map.jump),
            reset: self.any_just_pressed(&self.action_map.reset),
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        for s in [
            &mut self.dpad_left,
            &mut self.dpad_right,
            &mut self.dpad_up,
            &mut self.stick_left,
            &mut self.stick_right,
            &mut self.stick_up,
        ] {
            s.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons {
            *b = BtnState::default();
        }
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.dpad_up = BtnState::default();
        self.stick_left = BtnState::default();
        self.stick_right = BtnState::default();
        self.stick_up = BtnState::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
