//! Repeated-reboot factory reset.
//!
//! Power-cycling the node `K` times, each boot inside the window opened by
//! the previous one, requests a factory reset.  This is the only reset path
//! on boards without a button.
//!
//! ```text
//!  boot 1          boot 2          boot 3
//!  counter 3→2     counter 2→1     counter 1 → reset, counter := 3
//!  |── window ──|  |── window ──|
//! ```
//!
//! Letting a window elapse without a reboot restores the counter to `K`.
//!
//! The counter lives in the persisted store (namespace `"app"`, key
//! `"boot_times"`, little-endian `u32`).  The window deadline is
//! process-local and owned by the application task.  Store failures are
//! logged and treated as "full budget"; they never abort the boot.  A
//! stored zero is a spent budget and resets like one.

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::config::RebootGuardConfig;

pub const COUNTER_NAMESPACE: &str = "app";
pub const COUNTER_KEY: &str = "boot_times";

/// What the application task should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Window open; wake again after this many milliseconds.
    Wait(u32),
    /// Window closed just now; counter restored.  Wait forever.
    Expired,
    /// Nothing armed.  Wait forever.
    Idle,
    /// Reboot budget exhausted: post a factory reset.
    FactoryReset,
}

impl GuardOutcome {
    /// Event-wait timeout implied by this outcome (`None` = forever).
    pub fn timeout_ms(self) -> Option<u32> {
        match self {
            Self::Wait(ms) => Some(ms),
            Self::Expired | Self::Idle | Self::FactoryReset => None,
        }
    }
}

/// Decode the persisted counter into `0..=k`.  Missing or short values and
/// values above `k` read as the full budget.  Zero is kept: it means the
/// budget is already spent.
pub fn decode_counter(bytes: &[u8], k: u32) -> u32 {
    let Some(raw) = bytes.get(..4) else {
        return k;
    };
    let value = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    if value <= k { value } else { k }
}

pub struct RebootGuard {
    config: RebootGuardConfig,
    /// Monotonic ms deadline of the open window; 0 = not armed.
    armed_until: u64,
}

impl RebootGuard {
    pub fn new(config: RebootGuardConfig) -> Self {
        Self {
            config,
            armed_until: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_until != 0
    }

    /// Deadline of the open window, if any.
    pub fn armed_until(&self) -> Option<u64> {
        (self.armed_until != 0).then_some(self.armed_until)
    }

    /// Call once when the stack reports `Started`.
    ///
    /// Later calls while a window is open behave like [`poll`](Self::poll).
    pub fn on_startup<S: StoragePort + ?Sized>(&mut self, store: &mut S, now_ms: u64) -> GuardOutcome {
        if self.is_armed() {
            return self.poll(store, now_ms);
        }

        let window = u64::from(self.config.window_ms);
        let remaining = self.read_counter(store);

        if remaining > 1 {
            // Deadline is never 0 even at now = 0 since window > 0.
            self.armed_until = now_ms + window;
            let left = remaining - 1;
            self.write_counter(store, left);
            info!(
                "RebootGuard: {} boot(s) left, window {} ms",
                left, self.config.window_ms
            );
            GuardOutcome::Wait(self.config.window_ms)
        } else {
            self.armed_until = 0;
            self.write_counter(store, self.config.reset_count);
            warn!("RebootGuard: reboot budget exhausted, requesting factory reset");
            GuardOutcome::FactoryReset
        }
    }

    /// Re-evaluate the open window.
    pub fn poll<S: StoragePort + ?Sized>(&mut self, store: &mut S, now_ms: u64) -> GuardOutcome {
        if !self.is_armed() {
            return GuardOutcome::Idle;
        }
        if self.armed_until > now_ms {
            let left = (self.armed_until - now_ms).min(u64::from(u32::MAX)) as u32;
            return GuardOutcome::Wait(left);
        }

        self.write_counter(store, self.config.reset_count);
        self.armed_until = 0;
        info!("RebootGuard: window elapsed, counter restored");
        GuardOutcome::Expired
    }

    /// Current persisted counter (full budget when unreadable).
    pub fn read_counter<S: StoragePort + ?Sized>(&self, store: &S) -> u32 {
        let mut buf = [0u8; 4];
        match store.read(COUNTER_NAMESPACE, COUNTER_KEY, &mut buf) {
            Ok(len) => {
                let value = decode_counter(&buf[..len], self.config.reset_count);
                if len < 4 {
                    warn!("RebootGuard: short counter ({} bytes), using default", len);
                }
                value
            }
            Err(e) => {
                info!("RebootGuard: no counter ({}), using default", e);
                self.config.reset_count
            }
        }
    }

    fn write_counter<S: StoragePort + ?Sized>(&self, store: &mut S, value: u32) {
        if let Err(e) = store.write(COUNTER_NAMESPACE, COUNTER_KEY, &value.to_le_bytes()) {
            warn!("RebootGuard: counter write failed: {}", e);
        }
    }
}
