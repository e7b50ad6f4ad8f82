//! Hardware adapter: bridges the board peripherals to the port traits.
//!
//! Owns the light PWM output, status LED, reset button, blink timer and
//! clock, and exposes them as one [`Hardware`](crate::app::ports::Hardware)
//! bundle for the application task.  This is the only module that ties the
//! drivers together.  On non-espidf targets the drivers use their
//! simulation backends.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::adapters::time::Esp32TimeAdapter;
use crate::app::ports::{BlinkTimerPort, ButtonInput, LightPort, StatusIndicator, TimePort};
use crate::drivers::button::ResetButton;
use crate::drivers::hw_timer::BlinkTimer;
use crate::drivers::light::RgbLight;
use crate::drivers::status_led::StatusLed;

/// Concrete adapter that combines all board hardware behind port traits.
pub struct HardwareAdapter<L, B, D> {
    light: RgbLight,
    status: StatusLed<L>,
    button: ResetButton<B>,
    timer: BlinkTimer,
    clock: Esp32TimeAdapter,
    delay: D,
}

impl<L, B, D> HardwareAdapter<L, B, D>
where
    L: OutputPin,
    B: InputPin,
    D: DelayNs,
{
    pub fn new(
        light: RgbLight,
        status: StatusLed<L>,
        button: ResetButton<B>,
        timer: BlinkTimer,
        clock: Esp32TimeAdapter,
        delay: D,
    ) -> Self {
        Self {
            light,
            status,
            button,
            timer,
            clock,
            delay,
        }
    }

    pub fn light(&self) -> &RgbLight {
        &self.light
    }
}

// ── Light ─────────────────────────────────────────────────────

impl<L, B, D> LightPort for HardwareAdapter<L, B, D> {
    fn set_level(&mut self, level: u8) {
        self.light.set_level(level);
    }

    fn set_color(&mut self, level: u8, hue: u8, saturation: u8) {
        self.light.set_color(level, hue, saturation);
    }
}

// ── Status LED ────────────────────────────────────────────────

impl<L: OutputPin, B, D> StatusIndicator for HardwareAdapter<L, B, D> {
    fn set_on(&mut self, on: bool) {
        self.status.set_on(on);
    }

    fn is_on(&self) -> bool {
        self.status.is_on()
    }
}

// ── Blink timer ───────────────────────────────────────────────

impl<L, B, D> BlinkTimerPort for HardwareAdapter<L, B, D> {
    fn start(&mut self, period_ms: u32) {
        self.timer.start(period_ms);
    }

    fn cancel(&mut self) {
        self.timer.cancel();
    }

    fn is_active(&self) -> bool {
        self.timer.is_active()
    }
}

// ── Inputs ────────────────────────────────────────────────────

impl<L, B: InputPin, D> ButtonInput for HardwareAdapter<L, B, D> {
    fn is_pressed(&mut self) -> bool {
        self.button.is_pressed()
    }
}

impl<L, B, D> TimePort for HardwareAdapter<L, B, D> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

impl<L, B, D: DelayNs> DelayNs for HardwareAdapter<L, B, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
