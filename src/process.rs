//! Child process lifecycle for activated hotkeys
//!
//! Commands run under `/bin/sh -c` for as long as their combination is
//! held. Termination is a single SIGTERM; exits are collected by a
//! non-blocking waitpid sweep between events, so finished children never
//! linger as zombies and a replaced child is still cleaned up.

use std::io;
use std::process::Command;

use libc::pid_t;
use tracing::{debug, info, warn};

use crate::engine::HotkeyState;

/// Launch a hotkey's command via the shell and track its pid
///
/// A pid may still be tracked from the previous activation when the
/// command outlives its hold. That is reported, and the new child
/// replaces it; the old one keeps running untracked until it exits.
pub fn spawn_for(state: &mut HotkeyState) -> io::Result<()> {
    if let Some(pid) = state.child {
        warn!(
            hotkey = %state.hotkey.label,
            command = %state.hotkey.command,
            pid,
            "command from the previous activation is still running"
        );
    }

    let child = Command::new("/bin/sh")
        .arg("-c")
        .arg(&state.hotkey.command)
        .spawn()?;

    // The handle is dropped; the waitpid sweep collects the exit.
    let pid = child.id() as pid_t;
    info!(hotkey = %state.hotkey.label, pid, "command started");
    state.child = Some(pid);

    Ok(())
}

/// Send SIGTERM to a hotkey's tracked child, if any
///
/// The pid stays tracked until the reap sweep observes the exit.
pub fn terminate(state: &mut HotkeyState) {
    if let Some(pid) = state.child {
        debug!(hotkey = %state.hotkey.label, pid, "sending SIGTERM");
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc != 0 {
            warn!(
                hotkey = %state.hotkey.label,
                pid,
                error = %io::Error::last_os_error(),
                "failed to signal command"
            );
        }
    }
}

/// Collect exited children without blocking
///
/// Sweeps every zombie the process has accumulated. A pid that matches a
/// tracked child clears its slot; anything else is acknowledged and
/// dropped.
pub fn reap_exited(states: &mut [HotkeyState]) {
    loop {
        let pid = unsafe { libc::waitpid(-1, std::ptr::null_mut(), libc::WNOHANG) };
        if pid <= 0 {
            break;
        }

        match states.iter_mut().find(|state| state.child == Some(pid)) {
            Some(state) => {
                debug!(hotkey = %state.hotkey.label, pid, "command exited");
                state.child = None;
            }
            None => debug!(pid, "reaped untracked child"),
        }
    }
}

/// Shutdown sweep: signal every still-tracked child
pub fn terminate_outstanding(states: &mut [HotkeyState]) {
    for state in states {
        terminate(state);
    }
}
