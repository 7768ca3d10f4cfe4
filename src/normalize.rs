//! Raw notification intake and normalization
//!
//! Sits between the event source and the matching logic. Everything that
//! is not a genuine key or button state change is filtered out here:
//! non-input notifications are dropped, auto-repeat release/press pairs
//! are collapsed for sources that emit them, and codes that do not fit
//! the 0-255 device model abort the daemon.

use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::debug;

use crate::controls::{ControlEvent, ControlKind};
use crate::source::RawNotification;

/// Errors that end event intake
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("{kind} code {code} is outside the 0-255 device model")]
    CodeOutOfRange { kind: ControlKind, code: u16 },

    #[error("event delivery stopped, all device readers are gone")]
    DeliveryStopped,
}

/// Turns raw source notifications into canonical control events
pub struct Normalizer {
    rx: mpsc::Receiver<RawNotification>,
    collapse_repeats: bool,
    /// Notification peeked past a release while pairing repeats
    pending: Option<RawNotification>,
}

impl Normalizer {
    /// Create a normalizer over a subscribed notification channel
    ///
    /// `collapse_repeats` comes from the source's capability flag.
    pub fn new(rx: mpsc::Receiver<RawNotification>, collapse_repeats: bool) -> Self {
        Self {
            rx,
            collapse_repeats,
            pending: None,
        }
    }

    /// Wait for the next key or button state change
    pub async fn next_event(&mut self) -> Result<ControlEvent, NormalizeError> {
        loop {
            let note = match self.pending.take() {
                Some(note) => note,
                None => self
                    .rx
                    .recv()
                    .await
                    .ok_or(NormalizeError::DeliveryStopped)?,
            };

            let (kind, code, pressed, time) = match note {
                RawNotification::Control {
                    kind,
                    code,
                    pressed,
                    time,
                } => (kind, code, pressed, time),
                RawNotification::Other => {
                    debug!("discarding non-input notification");
                    continue;
                }
            };

            let code = match u8::try_from(code) {
                Ok(code) => code,
                Err(_) => return Err(NormalizeError::CodeOutOfRange { kind, code }),
            };

            if !pressed && self.collapse_repeats && self.absorb_repeat_pair(kind, code, time) {
                continue;
            }

            return Ok(ControlEvent {
                kind,
                code,
                pressed,
            });
        }
    }

    /// Check whether a release is the front half of an auto-repeat pair
    ///
    /// The artifact is a release immediately followed by a press of the
    /// same control carrying the same timestamp. Only an already-queued
    /// notification counts as immediate; this never blocks. A peeked
    /// notification that does not complete the pair is kept for the next
    /// iteration.
    fn absorb_repeat_pair(&mut self, kind: ControlKind, code: u8, time: SystemTime) -> bool {
        let next = match self.rx.try_recv() {
            Ok(next) => next,
            Err(_) => return false,
        };

        if let RawNotification::Control {
            kind: next_kind,
            code: next_code,
            pressed: true,
            time: next_time,
        } = next
        {
            if next_kind == kind && next_code == code as u16 && next_time == time {
                debug!(%kind, code, "collapsed auto-repeat release/press pair");
                return true;
            }
        }

        self.pending = Some(next);
        false
    }
}
