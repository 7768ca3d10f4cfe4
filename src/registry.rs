//! Startup resolution of hotkey definitions
//!
//! Symbolic key names and button tokens are resolved against the event
//! source exactly once, before any event is processed. Any failure is
//! fatal; the daemon never runs with a partially resolved hotkey.

use crate::config::HotkeyDefinition;
use crate::controls::{ControlKind, ControlSet};
use crate::source::{EventSource, ResolveError};

/// A hotkey with its requirement bitmap ready for matching
#[derive(Debug, Clone)]
pub struct ResolvedHotkey {
    /// Label for diagnostics
    pub label: String,
    /// Shell command run while the combination is held
    pub command: String,
    /// Controls that must all be held
    pub required: ControlSet,
}

/// A definition that could not be resolved to codes
#[derive(Debug, thiserror::Error)]
#[error("hotkey '{label}': {source}")]
pub struct RegistryError {
    label: String,
    #[source]
    source: ResolveError,
}

/// Resolve every definition, or fail before any event is processed
pub fn resolve_hotkeys<S: EventSource>(
    source: &S,
    definitions: &[HotkeyDefinition],
) -> Result<Vec<ResolvedHotkey>, RegistryError> {
    definitions
        .iter()
        .map(|definition| resolve_one(source, definition))
        .collect()
}

fn resolve_one<S: EventSource>(
    source: &S,
    definition: &HotkeyDefinition,
) -> Result<ResolvedHotkey, RegistryError> {
    let mut required = ControlSet::new();

    for key in &definition.keys {
        let code = source
            .resolve_key(key)
            .map_err(|e| resolution_failed(definition, e))?;
        required.insert(ControlKind::Key, code);
    }

    for button in &definition.buttons {
        let code = source
            .resolve_button(button)
            .map_err(|e| resolution_failed(definition, e))?;
        required.insert(ControlKind::Button, code);
    }

    Ok(ResolvedHotkey {
        label: definition.label().to_string(),
        command: definition.command.clone(),
        required,
    })
}

fn resolution_failed(definition: &HotkeyDefinition, source: ResolveError) -> RegistryError {
    RegistryError {
        label: definition.label().to_string(),
        source,
    }
}
