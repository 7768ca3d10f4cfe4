//! Hotkey mode: run commands while their combinations are held
//!
//! The processing loop owns all hotkey state and handles one event at a
//! time: collect exited children, update every affected hotkey, then
//! start or signal commands for the hotkeys whose match state flipped.
//! SIGTERM and SIGINT end the loop after a final sweep over whatever is
//! still running.

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::HotkeyDefinition;
use crate::engine::{HotkeyEngine, Transition};
use crate::normalize::Normalizer;
use crate::process;
use crate::registry;
use crate::source::EventSource;

/// Resolve the definitions, subscribe to the source, and process events
/// until a fatal error or a shutdown signal
pub async fn run<S: EventSource>(mut source: S, definitions: Vec<HotkeyDefinition>) -> Result<()> {
    let hotkeys = registry::resolve_hotkeys(&source, &definitions)?;
    for hotkey in &hotkeys {
        debug!(hotkey = %hotkey.label, required = ?hotkey.required, "registered hotkey");
    }
    info!(hotkeys = hotkeys.len(), "hotkeys resolved");

    let (tx, rx) = mpsc::channel(256);
    let collapse = source.emits_repeat_artifacts();
    source.subscribe(tx).context("failed to start event delivery")?;

    let mut events = Normalizer::new(rx, collapse);
    let mut engine = HotkeyEngine::new(hotkeys);

    let mut sigterm = signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            event = events.next_event() => {
                let event = event?;
                process::reap_exited(engine.states_mut());

                for (index, transition) in engine.apply(event) {
                    let state = engine.state_mut(index);
                    match transition {
                        Transition::Activate => {
                            process::spawn_for(state).with_context(|| {
                                format!("failed to run command for hotkey '{}'", state.hotkey.label)
                            })?;
                        }
                        Transition::Deactivate => process::terminate(state),
                    }
                }
            }
        }
    }

    // Commands are hold-to-run; do not leave them behind on exit
    process::terminate_outstanding(engine.states_mut());
    info!("hotkey mode stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RawNotification, ResolveError, SourceError};

    /// Fails resolution; event delivery must never start after that
    struct RejectingSource;

    impl EventSource for RejectingSource {
        fn emits_repeat_artifacts(&self) -> bool {
            false
        }

        fn resolve_key(&self, name: &str) -> Result<u8, ResolveError> {
            Err(ResolveError::UnknownKey(name.to_string()))
        }

        fn resolve_button(&self, token: &str) -> Result<u8, ResolveError> {
            Err(ResolveError::InvalidButton(token.to_string()))
        }

        fn key_name(&self, code: u8) -> String {
            code.to_string()
        }

        fn button_name(&self, code: u8) -> String {
            code.to_string()
        }

        fn subscribe(&mut self, _tx: mpsc::Sender<RawNotification>) -> Result<(), SourceError> {
            panic!("event delivery started for an unresolved hotkey set");
        }
    }

    #[tokio::test]
    async fn test_unresolved_hotkey_fails_before_delivery() {
        let definitions = vec![HotkeyDefinition {
            name: Some("ptt".to_string()),
            keys: vec!["nosuchkey".to_string()],
            buttons: vec![],
            command: "true".to_string(),
        }];

        let err = run(RejectingSource, definitions).await.unwrap_err();
        assert!(err.to_string().contains("ptt"));
    }
}
