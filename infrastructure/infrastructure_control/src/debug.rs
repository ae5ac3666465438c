//! Control debug output
//!
//! Globally gated diagnostics for control-protocol and flush traffic.
//! Off by default; enabling it prints one line per handled command to
//! standard error.

use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Debug output switch for the control layer
pub struct ControlDebug;

impl ControlDebug {
    /// Turn debug output on
    pub fn enable() {
        DEBUG_ENABLED.store(true, Ordering::Release);
    }

    /// Turn debug output off
    pub fn disable() {
        DEBUG_ENABLED.store(false, Ordering::Release);
    }

    /// True if debug output is on
    pub fn is_enabled() -> bool {
        DEBUG_ENABLED.load(Ordering::Acquire)
    }

    /// Print one debug line when enabled
    pub fn log(message: &str) {
        if Self::is_enabled() {
            eprintln!("trace_control: {}", message);
        }
    }
}
