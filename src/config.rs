//! Node configuration parameters
//!
//! Board policy, indicator timing, reboot-guard and button thresholds.
//! Values can be overridden via NVS; the board variant is chosen once at
//! start-up and never re-evaluated.

use serde::{Deserialize, Serialize};

/// Hardware variants this firmware runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardVariant {
    /// Development kit: status LED + reset button + RGB light.
    DevKit,
    /// Bulb: RGB light only, factory reset by repeated power-cycling.
    Bulb,
    /// Hub: RGB light, status LED, reset button and reboot guard.
    ///
    /// The status LED blinks both halves of the indicator pair here.
    /// Earlier hub firmware left the LED alone and re-armed the timer with
    /// the on-time only, using the ticks just to resolve the button.
    Hub,
}

/// What the light shows on the first `Started` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupVisual {
    /// Write on/off = on and full level.
    LightOn,
    /// Turn on when already provisioned; otherwise flash
    /// [`BoardPolicy::unprovisioned_flash`] and turn off.
    ProvisioningAware,
}

/// Light colour as (level, hue, saturation), each 0–254.
pub type Hsv = (u8, u8, u8);

/// Feature switches and visuals for one board variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPolicy {
    /// Repeated-reboot factory reset enabled.
    pub reboot_guard: bool,
    /// Reset button present.
    pub button: bool,
    /// Status LED blinks the connectivity duty cycle.
    pub status_blink: bool,
    /// Light accepts hue/saturation (otherwise level only).
    pub color_light: bool,
    pub startup_visual: StartupVisual,
    /// On any non-reset system event, write on/off = on.
    pub on_for_system_events: bool,
    /// Shown on power-up when not provisioned.
    pub unprovisioned_flash: Option<Hsv>,
    /// Shown once when first provisioned after an unprovisioned power-up.
    pub commissioned_flash: Option<Hsv>,
    /// Shown before initiating a factory reset.
    pub reset_flash: Option<Hsv>,
}

impl BoardVariant {
    /// Policy preset for this variant.
    pub const fn policy(self) -> BoardPolicy {
        match self {
            Self::DevKit => BoardPolicy {
                reboot_guard: false,
                button: true,
                status_blink: true,
                color_light: false,
                startup_visual: StartupVisual::LightOn,
                on_for_system_events: true,
                unprovisioned_flash: None,
                commissioned_flash: None,
                reset_flash: None,
            },
            Self::Bulb => BoardPolicy {
                reboot_guard: true,
                button: false,
                status_blink: false,
                color_light: true,
                startup_visual: StartupVisual::ProvisioningAware,
                on_for_system_events: false,
                unprovisioned_flash: Some(COLOUR_UNPROVISIONED),
                commissioned_flash: Some(COLOUR_COMMISSIONED),
                reset_flash: Some(COLOUR_FACTORY_RESET),
            },
            Self::Hub => BoardPolicy {
                reboot_guard: true,
                button: true,
                status_blink: true,
                color_light: true,
                startup_visual: StartupVisual::ProvisioningAware,
                on_for_system_events: false,
                unprovisioned_flash: Some(COLOUR_UNPROVISIONED),
                commissioned_flash: Some(COLOUR_COMMISSIONED),
                reset_flash: Some(COLOUR_FACTORY_RESET),
            },
        }
    }
}

// ── Flash colours (level, hue, saturation) ────────────────────

/// White.
pub const COLOUR_UNPROVISIONED: Hsv = (254, 0, 0);
/// Green.
pub const COLOUR_COMMISSIONED: Hsv = (254, 84, 254);
/// Yellow.
pub const COLOUR_FACTORY_RESET: Hsv = (254, 42, 254);

/// Duration a flash colour is held before the follow-up action.
pub const FLASH_HOLD_MS: u32 = 500;

/// Blink period pairs `(on_ms, off_ms)` per indicator mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPolicy {
    pub provisioned: (u32, u32),
    pub ble_connected: (u32, u32),
    pub ble_advertising: (u32, u32),
    pub button_armed: (u32, u32),
    pub factory_reset: (u32, u32),
}

impl Default for IndicatorPolicy {
    fn default() -> Self {
        Self {
            provisioned: (800, 200),
            ble_connected: (200, 200),
            ble_advertising: (200, 800),
            button_armed: (500, 500),
            factory_reset: (100, 100),
        }
    }
}

/// Repeated-reboot factory reset thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebootGuardConfig {
    /// Consecutive boots within the window that trigger a reset (K).
    pub reset_count: u32,
    /// Window after boot during which the next boot counts (ms).
    pub window_ms: u32,
}

impl Default for RebootGuardConfig {
    fn default() -> Self {
        Self {
            reset_count: 3,
            window_ms: 3000,
        }
    }
}

/// Long-press factory reset thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Hold time that triggers a factory reset (ms).
    pub trigger_timeout_ms: u32,
    /// Subtracted from the deadline to absorb event-processing latency (ms).
    pub latency_margin_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            trigger_timeout_ms: 3000,
            latency_margin_ms: 100,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub variant: BoardVariant,
    pub indicator: IndicatorPolicy,
    pub reboot_guard: RebootGuardConfig,
    pub button: ButtonConfig,
    /// Endpoint hosting the light clusters.
    pub light_endpoint: u16,
    /// App task priority (FreeRTOS).
    pub app_task_priority: u8,
    /// App task stack (KiB).
    pub app_task_stack_kb: usize,
    /// Minimum spacing of heartbeat log lines (ms).
    pub heartbeat_interval_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            variant: BoardVariant::DevKit,
            indicator: IndicatorPolicy::default(),
            reboot_guard: RebootGuardConfig::default(),
            button: ButtonConfig::default(),
            light_endpoint: 1,
            app_task_priority: 2,
            app_task_stack_kb: 8,
            heartbeat_interval_ms: 10_000,
        }
    }
}

impl NodeConfig {
    /// Defaults for a given board.
    pub fn for_variant(variant: BoardVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Policy preset for the configured board.
    pub fn policy(&self) -> BoardPolicy {
        self.variant.policy()
    }
}
