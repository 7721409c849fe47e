//! Discrete user input delivered to engines between ticks.
//!
//! Front ends translate whatever their toolkit produces into these events and
//! hand them to the [`Driver`](crate::driver::Driver), which applies them at the
//! next tick boundary. Engines interpret them as parameter writes or one-shot
//! collection mutations; no event ever calls into an integrator directly.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Which pointer button an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    /// Left button / primary touch.
    Primary,
    /// Right button.
    Secondary,
    /// Middle button / wheel click.
    Middle,
}

/// A keyboard key, reduced to what the applets bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Space,
    /// A printable character. Engines compare case-insensitively.
    Char(char),
}

impl Key {
    /// True when this key is the character `c`, ignoring ASCII case.
    pub fn is_char(self, c: char) -> bool {
        matches!(self, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

/// One input event, in world (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { button: PointerButton, pos: DVec2 },
    PointerMove { pos: DVec2 },
    PointerUp { button: PointerButton, pos: DVec2 },
    KeyPress { key: Key },
}
