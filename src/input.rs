//! Device state capture and per-frame input aggregation.
//!
//! Platform callbacks write key and touch changes into a shared
//! [`InputState`]. Once per frame the simulation takes an [`InputSnapshot`]
//! and folds it, together with the XR gamepads of the active session, into a
//! single [`InputVector`].

pub mod joystick;
#[cfg(target_arch = "wasm32")]
pub mod wasm;
pub mod xr;

use std::collections::HashSet;
use std::ops::{Add, AddAssign};

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ViewerConfig;
use joystick::TouchJoystick;
use xr::ImmersiveSession;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    /// Parses a DOM `KeyboardEvent.key` value, ignoring case.
    pub fn from_dom_key(key: &str) -> Option<Self> {
        if key == " " {
            return Some(Self::Named(NamedKey::Space));
        }
        let lower = key.to_ascii_lowercase();
        if let Some(named) = parse_named_key(&lower) {
            return Some(named);
        }
        let mut chars = lower.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch));
            }
            if let Some(digit) = ch.to_digit(10) {
                return Some(Self::Digit(digit as u8));
            }
        }
        if let Some(function) = lower.strip_prefix('f') {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=24).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "space" | "spacebar" => Space,
        "enter" => Enter,
        "tab" => Tab,
        "arrowleft" => Left,
        "arrowright" => Right,
        "arrowup" => Up,
        "arrowdown" => Down,
        "escape" | "esc" => Escape,
        "backspace" => Backspace,
        "shift" => Shift,
        "control" => Control,
        "alt" => Alt,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Non-character keys the viewer recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    Shift,
    Control,
    Alt,
}

const FORWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('w'), KeyCode::Named(NamedKey::Up)];
const BACKWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('s'), KeyCode::Named(NamedKey::Down)];
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Character('a'), KeyCode::Named(NamedKey::Left)];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Character('d'), KeyCode::Named(NamedKey::Right)];

/// Signed movement request for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputVector {
    pub move_forward: f32,
    pub turn: f32,
}

impl InputVector {
    pub const ZERO: Self = Self {
        move_forward: 0.0,
        turn: 0.0,
    };

    pub const fn new(move_forward: f32, turn: f32) -> Self {
        Self { move_forward, turn }
    }
}

impl Add for InputVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.move_forward + rhs.move_forward, self.turn + rhs.turn)
    }
}

impl AddAssign for InputVector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Thread-safe device state written by event callbacks.
#[derive(Debug)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    joystick: RwLock<TouchJoystick>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(ViewerConfig::default().joystick_radius)
    }
}

impl InputState {
    pub fn new(joystick_radius: f32) -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            joystick: RwLock::new(TouchJoystick::new(joystick_radius)),
        }
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    /// Starts tracking `touch_id` unless another touch is already tracked.
    pub fn touch_start(&self, touch_id: i32) -> bool {
        self.joystick.write().touch_start(touch_id)
    }

    /// Moves the tracked touch; `offset` is relative to the joystick zone centre.
    /// Returns the clamped knob offset when the touch was the tracked one.
    pub fn touch_move(&self, touch_id: i32, offset: Vec2) -> Option<Vec2> {
        self.joystick.write().touch_move(touch_id, offset)
    }

    pub fn touch_end(&self, touch_id: i32) -> bool {
        self.joystick.write().touch_end(touch_id)
    }

    /// Sets the joystick vector directly, bypassing touch tracking.
    pub fn set_joystick_vector(&self, vector: Vec2) {
        self.joystick.write().set_vector(vector);
    }

    /// Copies the current device state for one frame.
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            keys: self.keys.read().clone(),
            joystick: self.joystick.read().vector(),
        }
    }
}

/// Immutable device state read by a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys: HashSet<KeyCode>,
    pub joystick: Vec2,
}

impl InputSnapshot {
    pub fn with_keys(keys: impl IntoIterator<Item = KeyCode>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            joystick: Vec2::ZERO,
        }
    }

    fn any_down(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|key| self.keys.contains(key))
    }

    /// Discrete +1/-1 contribution of the direction keys.
    pub fn keyboard(&self) -> InputVector {
        let mut input = InputVector::ZERO;
        if self.any_down(&FORWARD_KEYS) {
            input.move_forward += 1.0;
        }
        if self.any_down(&BACKWARD_KEYS) {
            input.move_forward -= 1.0;
        }
        if self.any_down(&LEFT_KEYS) {
            input.turn += 1.0;
        }
        if self.any_down(&RIGHT_KEYS) {
            input.turn -= 1.0;
        }
        input
    }
}

/// Sums keyboard, touch joystick and XR gamepad contributions for one frame.
pub fn aggregate(
    snapshot: &InputSnapshot,
    session: Option<&ImmersiveSession>,
    config: &ViewerConfig,
) -> InputVector {
    let mut input = snapshot.keyboard();
    input += joystick::contribution(snapshot.joystick, config.joystick_deadzone);
    if let Some(session) = session {
        input += xr::gamepad_contribution(&session.input_sources, config.gamepad_deadzone);
    }
    input
}
