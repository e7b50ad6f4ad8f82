//! Single-colour status LED.
//!
//! Wraps any `embedded-hal` output pin.  The level is tracked in software so
//! the blink logic never has to read the pin back.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::StatusIndicator;

pub struct StatusLed<P> {
    pin: P,
    on: bool,
    active_low: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// LED lit when the pin is high.
    pub fn new(pin: P) -> Self {
        Self::with_polarity(pin, false)
    }

    pub fn with_polarity(pin: P, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            on: true,
            active_low,
        };
        led.set_on(false);
        led
    }
}

impl<P: OutputPin> StatusIndicator for StatusLed<P> {
    fn set_on(&mut self, on: bool) {
        let state = PinState::from(on != self.active_low);
        match self.pin.set_state(state) {
            Ok(()) => self.on = on,
            Err(e) => warn!("LED | pin write failed: {:?}", e),
        }
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
