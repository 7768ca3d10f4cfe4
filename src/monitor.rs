//! Monitor mode: print input events as reusable hotkey flags
//!
//! A discovery aid. Every key or button change prints the currently held
//! controls as a `--key`/`--button` flag line ready to paste into a run
//! invocation, followed by a comment naming what just changed.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::controls::{ControlEvent, ControlKind, ControlSet};
use crate::normalize::Normalizer;
use crate::source::EventSource;

/// Watch the source and print one line per state change, forever
pub async fn run<S: EventSource>(mut source: S) -> Result<()> {
    let (tx, rx) = mpsc::channel(256);
    let collapse = source.emits_repeat_artifacts();
    source.subscribe(tx).context("failed to start event delivery")?;
    let mut events = Normalizer::new(rx, collapse);

    info!("monitoring input, press controls to see their flags");

    let mut held = ControlSet::new();
    loop {
        let event = events.next_event().await?;
        held.set(event.kind, event.code, event.pressed);
        println!("{}", render_line(&source, &held, event));
    }
}

/// One output line: flags for everything held, a comment for the change
fn render_line<S: EventSource>(source: &S, held: &ControlSet, event: ControlEvent) -> String {
    let mut line = String::new();

    for code in held.pressed_keys() {
        line.push_str(&format!("--key {} ", source.key_name(code)));
    }
    for code in held.pressed_buttons() {
        line.push_str(&format!("--button {code} "));
    }

    let action = if event.pressed { "pressed" } else { "released" };
    let name = match event.kind {
        ControlKind::Key => source.key_name(event.code),
        ControlKind::Button => source.button_name(event.code),
    };
    line.push_str(&format!("# {} {} {}", action, event.kind, name));

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RawNotification, ResolveError, SourceError};

    struct FakeSource;

    impl EventSource for FakeSource {
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
            match code {
                30 => "KEY_A".to_string(),
                48 => "KEY_B".to_string(),
                _ => format!("KEY_{code}"),
            }
        }

        fn button_name(&self, code: u8) -> String {
            match code {
                16 => "BTN_LEFT".to_string(),
                _ => code.to_string(),
            }
        }

        fn subscribe(&mut self, _tx: mpsc::Sender<RawNotification>) -> Result<(), SourceError> {
            Ok(())
        }
    }

    fn apply(held: &mut ControlSet, kind: ControlKind, code: u8, pressed: bool) -> String {
        let event = ControlEvent {
            kind,
            code,
            pressed,
        };
        held.set(kind, code, pressed);
        render_line(&FakeSource, held, event)
    }

    #[test]
    fn test_lines_track_held_controls() {
        let mut held = ControlSet::new();

        let line = apply(&mut held, ControlKind::Key, 30, true);
        assert_eq!(line, "--key KEY_A # pressed key KEY_A");

        let line = apply(&mut held, ControlKind::Key, 48, true);
        assert_eq!(line, "--key KEY_A --key KEY_B # pressed key KEY_B");

        let line = apply(&mut held, ControlKind::Key, 30, false);
        assert_eq!(line, "--key KEY_B # released key KEY_A");
    }

    #[test]
    fn test_buttons_print_numbers_with_named_comment() {
        let mut held = ControlSet::new();

        let line = apply(&mut held, ControlKind::Button, 16, true);
        assert_eq!(line, "--button 16 # pressed button BTN_LEFT");

        let line = apply(&mut held, ControlKind::Key, 30, true);
        assert_eq!(line, "--key KEY_A --button 16 # pressed key KEY_A");
    }

    #[test]
    fn test_empty_set_leaves_only_the_comment() {
        let mut held = ControlSet::new();

        apply(&mut held, ControlKind::Button, 16, true);
        let line = apply(&mut held, ControlKind::Button, 16, false);
        assert_eq!(line, "# released button BTN_LEFT");
    }

    #[test]
    fn test_flags_stay_in_code_order() {
        let mut held = ControlSet::new();

        apply(&mut held, ControlKind::Key, 48, true);
        let line = apply(&mut held, ControlKind::Key, 30, true);
        assert_eq!(line, "--key KEY_A --key KEY_B # pressed key KEY_A");
    }
}
