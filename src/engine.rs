//! Hotkey matching over the live event stream
//!
//! Each hotkey tracks its own pressed-state bitmap, written only for the
//! controls it requires. A hotkey activates on the event that makes its
//! live state equal its requirements and deactivates on the event that
//! breaks the equality. Controls outside the requirement set are never
//! written, so unrelated pressed keys cannot block an activation.

use libc::pid_t;

use crate::controls::{ControlEvent, ControlSet};
use crate::registry::ResolvedHotkey;

/// Edge emitted when a hotkey's match state flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate,
    Deactivate,
}

/// Runtime state for one hotkey
#[derive(Debug)]
pub struct HotkeyState {
    /// The resolved definition
    pub hotkey: ResolvedHotkey,
    /// Pressed state of the required controls, as of the last event
    live: ControlSet,
    /// Whether live equals required
    activated: bool,
    /// Pid of the most recently spawned child, until reaped
    pub child: Option<pid_t>,
}

impl HotkeyState {
    fn new(hotkey: ResolvedHotkey) -> Self {
        Self {
            hotkey,
            live: ControlSet::new(),
            activated: false,
            child: None,
        }
    }

    /// Whether the combination is currently held
    pub fn is_activated(&self) -> bool {
        self.activated
    }
}

/// Applies events to every hotkey's state and collects match edges
pub struct HotkeyEngine {
    states: Vec<HotkeyState>,
}

impl HotkeyEngine {
    /// Build engine state for a resolved hotkey set, all idle
    pub fn new(hotkeys: Vec<ResolvedHotkey>) -> Self {
        Self {
            states: hotkeys.into_iter().map(HotkeyState::new).collect(),
        }
    }

    /// Feed one event through every hotkey
    ///
    /// Returns the transitions the event caused, in hotkey order; most
    /// events cause none. A single event can transition any number of
    /// hotkeys when their requirement sets overlap.
    pub fn apply(&mut self, event: ControlEvent) -> Vec<(usize, Transition)> {
        let mut transitions = Vec::new();

        for (index, state) in self.states.iter_mut().enumerate() {
            if !state.hotkey.required.contains(event.kind, event.code) {
                continue;
            }

            state.live.set(event.kind, event.code, event.pressed);
            let matched = state.live == state.hotkey.required;

            if matched && !state.activated {
                transitions.push((index, Transition::Activate));
            } else if !matched && state.activated {
                transitions.push((index, Transition::Deactivate));
            }

            state.activated = matched;
        }

        transitions
    }

    pub fn states(&self) -> &[HotkeyState] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut [HotkeyState] {
        &mut self.states
    }

    pub fn state_mut(&mut self, index: usize) -> &mut HotkeyState {
        &mut self.states[index]
    }
}
