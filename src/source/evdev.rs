//! Linux evdev event source
//!
//! Reads key and button events straight from /dev/input device nodes.
//! Each monitored device gets a dedicated reader thread doing blocking
//! reads and forwarding notifications into the daemon's channel.

use std::path::{Path, PathBuf};
use std::thread;

use evdev::{Device, InputEvent, InputEventKind, Key};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{EventSource, RawNotification, ResolveError, SourceError};
use crate::controls::ControlKind;

/// BTN_0, start of the pointer/tool button block
const BUTTON_BASE: u16 = 0x100;
/// KEY_OK, first code past the button block
const BUTTON_END: u16 = 0x160;
/// Codes past this point have no name table entry
const CODE_SCAN_END: u16 = 0x300;

/// Event source backed by one or more /dev/input devices
pub struct EvdevSource {
    devices: Vec<(PathBuf, Device)>,
    subscribed: bool,
}

impl EvdevSource {
    /// Open the input devices to monitor
    ///
    /// With no filter, every readable device that reports key or button
    /// capability is monitored. A filter selects devices by exact name or
    /// by event-node number (`7` or `event7`); a physical device often
    /// exposes several nodes under one name, and all of them are taken.
    pub fn open(filter: Option<&str>) -> Result<Self, SourceError> {
        let mut devices = Vec::new();

        for (path, device) in evdev::enumerate() {
            let has_controls = device
                .supported_keys()
                .map_or(false, |keys| keys.iter().next().is_some());

            let selected = match filter {
                Some(wanted) => device_matches(&path, &device, wanted),
                None => has_controls,
            };
            if !selected {
                continue;
            }

            debug!(
                device = device.name().unwrap_or("unnamed"),
                path = %path.display(),
                "selected input device"
            );
            devices.push((path, device));
        }

        if devices.is_empty() {
            return Err(match filter {
                Some(wanted) => SourceError::NoMatchingDevice(wanted.to_string()),
                None => SourceError::NoDevices,
            });
        }

        info!(devices = devices.len(), "event source opened");
        Ok(Self {
            devices,
            subscribed: false,
        })
    }
}

impl EventSource for EvdevSource {
    fn emits_repeat_artifacts(&self) -> bool {
        // Kernel auto-repeat arrives as discrete value-2 ticks, not as
        // synthetic release/press pairs.
        false
    }

    fn resolve_key(&self, name: &str) -> Result<u8, ResolveError> {
        let key = lookup_key(name)?;
        if key.code() > u8::MAX as u16 {
            return Err(ResolveError::KeyOutOfRange {
                name: name.to_string(),
                code: key.code(),
            });
        }

        let on_device = self.devices.iter().any(|(_, device)| {
            device
                .supported_keys()
                .map_or(false, |keys| keys.contains(key))
        });
        if !on_device {
            return Err(ResolveError::KeyNotOnDevice(name.to_string()));
        }

        Ok(key.code() as u8)
    }

    fn resolve_button(&self, token: &str) -> Result<u8, ResolveError> {
        if let Ok(number) = token.trim().parse::<u32>() {
            return u8::try_from(number)
                .map_err(|_| ResolveError::InvalidButton(token.to_string()));
        }

        // Not numeric, try the BTN_ name table
        match lookup_button(token) {
            Some(key) => Ok((key.code() - BUTTON_BASE) as u8),
            None => Err(ResolveError::InvalidButton(token.to_string())),
        }
    }

    fn key_name(&self, code: u8) -> String {
        format!("{:?}", Key::new(code as u16))
    }

    fn button_name(&self, code: u8) -> String {
        let raw = code as u16 + BUTTON_BASE;
        if raw < BUTTON_END {
            let name = format!("{:?}", Key::new(raw));
            if name.starts_with("BTN_") {
                return name;
            }
        }
        code.to_string()
    }

    fn subscribe(&mut self, tx: mpsc::Sender<RawNotification>) -> Result<(), SourceError> {
        if self.subscribed {
            return Err(SourceError::AlreadySubscribed);
        }
        self.subscribed = true;

        for (index, (path, device)) in self.devices.drain(..).enumerate() {
            let tx = tx.clone();
            thread::Builder::new()
                .name(format!("evdev-reader-{index}"))
                .spawn(move || read_device_events(path, device, tx))
                .map_err(|e| SourceError::ThreadSpawn(e.to_string()))?;
        }

        Ok(())
    }
}

/// Check a device against a `--device` filter
fn device_matches(path: &Path, device: &Device, filter: &str) -> bool {
    if device.name() == Some(filter) {
        return true;
    }
    node_matches(path, filter)
}

/// Match an event-node path against a `7` or `event7` style filter
fn node_matches(path: &Path, filter: &str) -> bool {
    let node = match path.file_name().and_then(|name| name.to_str()) {
        Some(node) => node,
        None => return false,
    };
    node == filter || node.strip_prefix("event") == Some(filter)
}

/// Find a key by its evdev name, with the KEY_ prefix optional
fn lookup_key(name: &str) -> Result<Key, ResolveError> {
    let wanted = name.trim();
    let prefixed = format!("KEY_{wanted}");

    for code in 0..CODE_SCAN_END {
        let key = Key::new(code);
        let table_name = format!("{key:?}");
        if table_name.eq_ignore_ascii_case(wanted) || table_name.eq_ignore_ascii_case(&prefixed) {
            return Ok(key);
        }
    }

    Err(ResolveError::UnknownKey(name.to_string()))
}

/// Find a button by its BTN_ name, with the prefix optional
fn lookup_button(token: &str) -> Option<Key> {
    let wanted = token.trim();
    let prefixed = format!("BTN_{wanted}");

    for code in BUTTON_BASE..BUTTON_END {
        let key = Key::new(code);
        let table_name = format!("{key:?}");
        if table_name.eq_ignore_ascii_case(wanted) || table_name.eq_ignore_ascii_case(&prefixed) {
            return Some(key);
        }
    }

    None
}

/// Blocking read loop for one device, run on its own thread
fn read_device_events(path: PathBuf, mut device: Device, tx: mpsc::Sender<RawNotification>) {
    let label = device.name().unwrap_or("unnamed").to_string();
    info!(device = %label, path = %path.display(), "reader thread started");

    loop {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) => {
                error!(device = %label, ?e, "failed to read input events");
                break;
            }
        };

        for event in events {
            if let Some(note) = classify_event(&event) {
                if tx.blocking_send(note).is_err() {
                    debug!(device = %label, "event channel closed, stopping reader");
                    return;
                }
            }
        }
    }

    info!(device = %label, "reader thread stopped");
}

/// Map one kernel event to a raw notification
///
/// Only EV_KEY events carry press state. Codes in the button block become
/// button notifications with the block offset removed; everything else
/// stays a key with its raw code. Value 2 is the kernel's auto-repeat
/// tick, which carries no state change.
fn classify_event(event: &InputEvent) -> Option<RawNotification> {
    let key = match event.kind() {
        InputEventKind::Key(key) => key,
        _ => return None,
    };

    let pressed = match event.value() {
        0 => false,
        1 => true,
        _ => return Some(RawNotification::Other),
    };

    let raw = key.code();
    let (kind, code) = if (BUTTON_BASE..BUTTON_END).contains(&raw) {
        (ControlKind::Button, raw - BUTTON_BASE)
    } else {
        (ControlKind::Key, raw)
    };

    Some(RawNotification::Control {
        kind,
        code,
        pressed,
        time: event.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    #[test]
    fn test_classify_key_press() {
        let event = InputEvent::new(EventType::KEY, Key::KEY_A.code(), 1);
        let note = classify_event(&event);

        match note {
            Some(RawNotification::Control {
                kind: ControlKind::Key,
                code,
                pressed: true,
                ..
            }) => assert_eq!(code, Key::KEY_A.code()),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_button_release() {
        let event = InputEvent::new(EventType::KEY, Key::BTN_LEFT.code(), 0);
        let note = classify_event(&event);

        match note {
            Some(RawNotification::Control {
                kind: ControlKind::Button,
                code,
                pressed: false,
                ..
            }) => assert_eq!(code, Key::BTN_LEFT.code() - BUTTON_BASE),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_repeat_tick_is_other() {
        let event = InputEvent::new(EventType::KEY, Key::KEY_A.code(), 2);
        assert_eq!(classify_event(&event), Some(RawNotification::Other));
    }

    #[test]
    fn test_classify_ignores_non_key_events() {
        let event = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert_eq!(classify_event(&event), None);
    }

    #[test]
    fn test_lookup_key_accepts_prefixed_and_bare_names() {
        assert_eq!(lookup_key("KEY_A").unwrap(), Key::KEY_A);
        assert_eq!(lookup_key("a").unwrap(), Key::KEY_A);
        assert_eq!(lookup_key("leftshift").unwrap(), Key::KEY_LEFTSHIFT);
    }

    #[test]
    fn test_lookup_key_rejects_unknown_names() {
        assert!(matches!(
            lookup_key("definitely-not-a-key"),
            Err(ResolveError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_lookup_button_names() {
        assert_eq!(lookup_button("BTN_LEFT"), Some(Key::BTN_LEFT));
        assert_eq!(lookup_button("left"), Some(Key::BTN_LEFT));
        assert_eq!(lookup_button("KEY_A"), None);
    }

    #[test]
    fn test_node_matches_number_and_node_name() {
        let path = PathBuf::from("/dev/input/event7");
        assert!(node_matches(&path, "event7"));
        assert!(node_matches(&path, "7"));
        assert!(!node_matches(&path, "event17"));
        assert!(!node_matches(&path, "1"));
    }
}
