//! Reset button long-press detector.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The GPIO fires on the falling
//! edge; the ISR re-samples the pin and, if it is still low, opens a
//! confirm window and sets [`Event::ButtonPress`] without waking anyone.  The window is resolved
//! on blink-timer ticks by the application task.
//!
//! | Condition at tick                     | Result                   |
//! |---------------------------------------|--------------------------|
//! | window open, held, deadline reached   | `FactoryReset` (once)    |
//! | window open, released                 | `ButtonCancel`           |
//! | window open, held, before deadline    | nothing                  |
//!
//! The deadline is `press + trigger_timeout - latency_margin`, so a reset
//! fires on the tick closest to the nominal hold time.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use embedded_hal::digital::InputPin;

use crate::app::ports::ButtonInput;
use crate::config::ButtonConfig;
use crate::events::{Event, EventChannel};

/// Confirm window shared between the button ISR and the application task.
///
/// The ISR only stores the deadline and posts; it never reads task state.
pub struct ButtonWindow {
    /// Monotonic ms deadline; 0 = no window open.
    deadline_ms: AtomicU64,
    /// `trigger_timeout - latency_margin`, set once at boot.
    hold_ms: AtomicU32,
}

impl Default for ButtonWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonWindow {
    pub const fn new() -> Self {
        Self {
            deadline_ms: AtomicU64::new(0),
            hold_ms: AtomicU32::new(2900),
        }
    }

    /// Apply thresholds.  Call before the ISR is enabled.
    pub fn configure(&self, cfg: &ButtonConfig) {
        let hold = cfg.trigger_timeout_ms.saturating_sub(cfg.latency_margin_ms);
        self.hold_ms.store(hold.max(1), Ordering::Relaxed);
    }

    /// Open the confirm window if the pin still reads pressed.  Atomics
    /// only, so safe in an ISR.  Returns whether `ButtonPress` is due.
    pub fn arm(&self, pressed: bool, now_ms: u64) -> bool {
        if !pressed {
            return false;
        }
        let hold = u64::from(self.hold_ms.load(Ordering::Relaxed));
        // Publish the deadline before the event so the task sees it.
        self.deadline_ms.store((now_ms + hold).max(1), Ordering::Release);
        true
    }

    /// Falling-edge handler for task-context callers.  The GPIO ISR uses
    /// [`arm`](Self::arm) with [`EventChannel::post_from_isr`] instead.
    pub fn on_edge(&self, pressed: bool, now_ms: u64, events: &EventChannel) {
        if self.arm(pressed, now_ms) {
            events.post(Event::ButtonPress);
        }
    }

    /// Resolve the window on a timer tick.  Task context only.
    pub fn on_tick(&self, pressed: bool, now_ms: u64) -> Option<Event> {
        let deadline = self.deadline_ms.load(Ordering::Acquire);
        if deadline == 0 {
            return None;
        }
        if pressed && now_ms < deadline {
            return None;
        }
        // A new press from the ISR between load and clear restarts the
        // window; leave it alone.
        if self
            .deadline_ms
            .compare_exchange(deadline, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(if pressed {
            Event::FactoryReset
        } else {
            Event::ButtonCancel
        })
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.load(Ordering::Acquire) != 0
    }

    pub fn deadline(&self) -> Option<u64> {
        match self.deadline_ms.load(Ordering::Acquire) {
            0 => None,
            d => Some(d),
        }
    }
}

/// Window used by the GPIO interrupt on the device.
pub static RESET_BUTTON: ButtonWindow = ButtonWindow::new();

// ── Pin adapter ───────────────────────────────────────────────

/// Active-low reset button over any `embedded-hal` input pin.
pub struct ResetButton<P> {
    pin: P,
}

impl<P: InputPin> ResetButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> ButtonInput for ResetButton<P> {
    fn is_pressed(&mut self) -> bool {
        // A read error reads as released, which cancels rather than resets.
        self.pin.is_low().unwrap_or(false)
    }
}
