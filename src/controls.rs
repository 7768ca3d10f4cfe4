//! Canonical control events and pressed-state bitmaps
//!
//! Keys and pointer buttons are reduced to a shared model: a control kind
//! plus an 8-bit code. Pressed state lives in fixed-size bitmaps so that
//! hotkey matching is a whole-map equality check.

use std::fmt;

/// Whether a control is a keyboard key or a pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Key,
    Button,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Key => write!(f, "key"),
            ControlKind::Button => write!(f, "button"),
        }
    }
}

/// A single press or release of one control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    /// Key or button
    pub kind: ControlKind,
    /// Canonical code, 0-255
    pub code: u8,
    /// True on press, false on release
    pub pressed: bool,
}

/// Pressed-state bitmap covering the full code space
///
/// One slot per possible key code and one per possible button code.
/// Equality compares every slot, so a set built from required controls
/// matches a live set exactly when all of them (and nothing tracked
/// besides them) are down.
#[derive(Clone, PartialEq, Eq)]
pub struct ControlSet {
    keys: [bool; 256],
    buttons: [bool; 256],
}

impl ControlSet {
    /// Create a set with every slot released
    pub fn new() -> Self {
        Self {
            keys: [false; 256],
            buttons: [false; 256],
        }
    }

    /// Mark a control as pressed
    pub fn insert(&mut self, kind: ControlKind, code: u8) {
        self.set(kind, code, true);
    }

    /// Write the pressed state for one control
    pub fn set(&mut self, kind: ControlKind, code: u8, pressed: bool) {
        self.slots_mut(kind)[code as usize] = pressed;
    }

    /// Check whether a control is marked pressed
    pub fn contains(&self, kind: ControlKind, code: u8) -> bool {
        self.slots(kind)[code as usize]
    }

    /// Pressed key codes in ascending order
    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        Self::pressed_codes(&self.keys)
    }

    /// Pressed button codes in ascending order
    pub fn pressed_buttons(&self) -> impl Iterator<Item = u8> + '_ {
        Self::pressed_codes(&self.buttons)
    }

    fn pressed_codes(slots: &[bool; 256]) -> impl Iterator<Item = u8> + '_ {
        slots
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(code, _)| code as u8)
    }

    fn slots(&self, kind: ControlKind) -> &[bool; 256] {
        match kind {
            ControlKind::Key => &self.keys,
            ControlKind::Button => &self.buttons,
        }
    }

    fn slots_mut(&mut self, kind: ControlKind) -> &mut [bool; 256] {
        match kind {
            ControlKind::Key => &mut self.keys,
            ControlKind::Button => &mut self.buttons,
        }
    }
}

impl Default for ControlSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ControlSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSet")
            .field("keys", &self.pressed_keys().collect::<Vec<_>>())
            .field("buttons", &self.pressed_buttons().collect::<Vec<_>>())
            .finish()
    }
}
