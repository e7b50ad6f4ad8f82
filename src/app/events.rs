//! Outbound application events.
//!
//! The [`AppTask`](super::task::AppTask) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, diagnostics buffer, ...).

use crate::indicator::IndicatorMode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// First `Started` event handled.
    Started {
        /// Power-up with no network credentials.
        unprovisioned: bool,
    },

    /// Reboot counter decremented; a reboot within `window_ms` counts.
    RebootCounted { remaining: u32, window_ms: u32 },

    /// Reboot window elapsed; counter restored to the full budget.
    RebootWindowClosed,

    /// Active blink mode or period changed.
    IndicatorChanged {
        mode: IndicatorMode,
        on_ms: u32,
        off_ms: u32,
    },

    /// Long-press window armed / resolved.
    ButtonArmed,
    ButtonCancelled,

    /// Factory reset is being initiated.
    FactoryResetRequested,

    /// Light output updated from cluster attributes.
    LightingApplied {
        on: bool,
        level: u8,
        hue: u8,
        saturation: u8,
    },

    /// Attribute read failed; lighting update skipped.
    LightingSkipped,

    /// Periodic liveness line.
    Heartbeat {
        uptime_ms: u64,
        mode: IndicatorMode,
    },
}
