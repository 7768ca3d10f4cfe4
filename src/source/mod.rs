//! Input event sources
//!
//! An event source owns the device-facing side of the daemon: it resolves
//! symbolic control names to codes, renders codes back to names, and
//! delivers raw notifications over a channel from its own reader threads.
//! The rest of the daemon only sees this interface, so acquisition
//! strategies with different quirks (evdev today, server-side grabs
//! elsewhere) stay interchangeable.

mod evdev;

pub use self::evdev::EvdevSource;

use std::time::SystemTime;

use tokio::sync::mpsc;

use crate::controls::ControlKind;

/// One notification as delivered by a source, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawNotification {
    /// A key or button changed state
    Control {
        kind: ControlKind,
        /// Code as reported by the source, may exceed the 0-255 model
        code: u16,
        pressed: bool,
        /// Source timestamp, used to pair auto-repeat artifacts
        time: SystemTime,
    },
    /// Anything else the source delivers (repeat ticks, device chatter)
    Other,
}

/// A stream of input events plus name/code resolution for one platform
pub trait EventSource {
    /// Whether releases may be synthetic auto-repeat artifacts that the
    /// normalizer should collapse against an immediately following press
    fn emits_repeat_artifacts(&self) -> bool;

    /// Resolve a symbolic key name to its canonical code
    fn resolve_key(&self, name: &str) -> Result<u8, ResolveError>;

    /// Resolve a button token (number or symbolic name) to its canonical code
    fn resolve_button(&self, token: &str) -> Result<u8, ResolveError>;

    /// Human-readable name for a key code
    fn key_name(&self, code: u8) -> String;

    /// Human-readable name for a button code
    fn button_name(&self, code: u8) -> String;

    /// Start delivering raw notifications into the channel
    ///
    /// Spawns the source's reader threads; can only be called once.
    fn subscribe(&mut self, tx: mpsc::Sender<RawNotification>) -> Result<(), SourceError>;
}

/// Errors resolving a configured control name to a code
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("key '{0}' is not a recognized key name")]
    UnknownKey(String),

    #[error("key '{0}' is not available on the monitored devices")]
    KeyNotOnDevice(String),

    #[error("key '{name}' has code {code}, outside the 0-255 range")]
    KeyOutOfRange { name: String, code: u16 },

    #[error("button '{0}' is not a number 0-255 or a recognized button name")]
    InvalidButton(String),
}

/// Errors opening a source or starting event delivery
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no readable input devices with keys or buttons found (check /dev/input permissions)")]
    NoDevices,

    #[error("no input device matches '{0}' (unreadable devices are not listed, check /dev/input permissions)")]
    NoMatchingDevice(String),

    #[error("event delivery is already running")]
    AlreadySubscribed,

    #[error("failed to spawn reader thread: {0}")]
    ThreadSpawn(String),
}
