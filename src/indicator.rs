//! Status LED duty-cycle selection.
//!
//! The status LED tells the user where the node is in its lifecycle.  Each
//! mode maps to an `(on_ms, off_ms)` pair from [`IndicatorPolicy`].
//!
//! ## Priority (highest first)
//!
//! | Mode                  | Default   | Kind      |
//! |-----------------------|-----------|-----------|
//! | `FactoryResetConfirm` | 100 / 100 | transient |
//! | `ButtonResetArmed`    | 500 / 500 | transient |
//! | `Provisioned`         | 800 / 200 | baseline  |
//! | `BleConnected`        | 200 / 200 | baseline  |
//! | `BleAdvertising`      | 200 / 800 | baseline  |
//!
//! Entering a transient mode keeps the baseline pair as a backup.
//! `ButtonCancel` restores the backup exactly.  Baseline events that arrive
//! while a transient mode is showing only update the backup.
//!
//! A zero half means "do not blink": `(0, _)` holds the LED off and
//! `(x, 0)` holds it on.

use crate::config::IndicatorPolicy;
use crate::events::{Event, EventMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    /// Nothing reported yet.
    Off,
    BleAdvertising,
    BleConnected,
    Provisioned,
    ButtonResetArmed,
    FactoryResetConfirm,
}

impl IndicatorMode {
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::ButtonResetArmed | Self::FactoryResetConfirm)
    }
}

/// A mode with its blink halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyCycle {
    pub mode: IndicatorMode,
    pub on_ms: u32,
    pub off_ms: u32,
}

impl DutyCycle {
    pub const OFF: Self = Self {
        mode: IndicatorMode::Off,
        on_ms: 0,
        off_ms: 0,
    };

    /// How to drive the LED given its current level.
    pub fn drive(&self, led_on: bool) -> Drive {
        match (self.on_ms, self.off_ms) {
            (0, _) => Drive::Static(false),
            (_, 0) => Drive::Static(true),
            (on, off) => Drive::Blink(if led_on { on } else { off }),
        }
    }
}

/// LED drive derived from a [`DutyCycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    /// Re-arm the blink timer for this many milliseconds.
    Blink(u32),
    /// Stop the timer and hold this level.
    Static(bool),
}

pub struct Indicator {
    policy: IndicatorPolicy,
    active: DutyCycle,
    backup: DutyCycle,
}

impl Indicator {
    pub fn new(policy: IndicatorPolicy) -> Self {
        Self {
            policy,
            active: DutyCycle::OFF,
            backup: DutyCycle::OFF,
        }
    }

    pub fn active(&self) -> DutyCycle {
        self.active
    }

    pub fn backup(&self) -> DutyCycle {
        self.backup
    }

    pub fn mode(&self) -> IndicatorMode {
        self.active.mode
    }

    /// Fold one dispatched event mask into the selection.
    /// Returns `true` when the active pair changed.
    pub fn apply(&mut self, mask: EventMask) -> bool {
        let before = self.active;

        if mask.contains(Event::FactoryReset) {
            self.enter_transient(IndicatorMode::FactoryResetConfirm);
        } else if mask.contains(Event::ButtonPress) && !mask.contains(Event::ButtonCancel) {
            self.enter_transient(IndicatorMode::ButtonResetArmed);
        } else if mask.contains(Event::ButtonCancel) && self.active.mode.is_transient() {
            self.active = self.backup;
        }

        if let Some(mode) = Self::baseline(mask) {
            let pair = self.pair(mode);
            self.backup = pair;
            if !self.active.mode.is_transient() {
                self.active = pair;
            }
        }

        self.active != before
    }

    fn baseline(mask: EventMask) -> Option<IndicatorMode> {
        if mask.contains(Event::Provisioned) {
            Some(IndicatorMode::Provisioned)
        } else if mask.contains(Event::BleConnected) {
            Some(IndicatorMode::BleConnected)
        } else if mask.contains(Event::BleAdvertising) {
            Some(IndicatorMode::BleAdvertising)
        } else {
            None
        }
    }

    fn enter_transient(&mut self, mode: IndicatorMode) {
        // Re-entering from one transient mode into another keeps the
        // first baseline backup.
        if !self.active.mode.is_transient() {
            self.backup = self.active;
        }
        self.active = self.pair(mode);
    }

    fn pair(&self, mode: IndicatorMode) -> DutyCycle {
        let (on_ms, off_ms) = match mode {
            IndicatorMode::Off => (0, 0),
            IndicatorMode::BleAdvertising => self.policy.ble_advertising,
            IndicatorMode::BleConnected => self.policy.ble_connected,
            IndicatorMode::Provisioned => self.policy.provisioned,
            IndicatorMode::ButtonResetArmed => self.policy.button_armed,
            IndicatorMode::FactoryResetConfirm => self.policy.factory_reset,
        };
        DutyCycle {
            mode,
            on_ms,
            off_ms,
        }
    }
}
