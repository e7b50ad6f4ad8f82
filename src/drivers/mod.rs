//! Peripheral drivers: light, status LED, reset button, blink timer.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod light;
pub mod status_led;
pub mod task_pin;
