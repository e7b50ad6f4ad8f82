//! GPIO / peripheral pin assignments for the light node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Main light (RGB, three LEDC channels)
// ---------------------------------------------------------------------------

pub const LIGHT_R_GPIO: i32 = 11;
pub const LIGHT_G_GPIO: i32 = 12;
pub const LIGHT_B_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Status LED (single colour, plain GPIO)
// ---------------------------------------------------------------------------

pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Reset button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button; hold to factory reset.
pub const BUTTON_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the light channels.
pub const LIGHT_PWM_FREQ_HZ: u32 = 1_000;
