//! One-shot hardware peripheral initialization.
//!
//! Configures the light's LEDC timer/channels and the reset-button
//! interrupt using raw ESP-IDF sys calls.  Called once from `main()`
//! before the application task starts.  The status LED and the button
//! level are driven through `esp-idf-hal` pin drivers instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::SetupError;

#[cfg(target_os = "espidf")]
use crate::pins;

pub const LEDC_CH_LIGHT_R: u32 = 0;
pub const LEDC_CH_LIGHT_G: u32 = 1;
pub const LEDC_CH_LIGHT_B: u32 = 2;

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_light_pwm() -> Result<(), SetupError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LIGHT_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: called once from main() before any LEDC user exists.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(SetupError::PwmConfigFailed(ret));
    }

    let channels = [
        (LEDC_CH_LIGHT_R, pins::LIGHT_R_GPIO),
        (LEDC_CH_LIGHT_G, pins::LIGHT_G_GPIO),
        (LEDC_CH_LIGHT_B, pins::LIGHT_B_GPIO),
    ];
    for (channel, gpio) in channels {
        let cfg = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        // SAFETY: see above.
        let ret = unsafe { ledc_channel_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(SetupError::PwmConfigFailed(ret));
        }
    }

    info!("hw_init: LEDC configured (light R/G/B = CH0-2)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_light_pwm() -> Result<(), SetupError> {
    log::info!("hw_init(sim): LEDC init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: channels were configured in init_light_pwm(); only the
    // application task writes duty registers.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── Button interrupt ──────────────────────────────────────────
//
// The ISR only touches atomics.  Waking the app task needs a critical
// section and the executor's waker, so an ISR post on the empty mask
// notifies a relay task, which calls `APP_EVENTS.wake()`.

#[cfg(target_os = "espidf")]
const ISR_RELAY_PRIORITY: u8 = 10;

#[cfg(target_os = "espidf")]
static ISR_RELAY: std::sync::OnceLock<
    std::sync::Arc<esp_idf_svc::hal::task::notification::Notifier>,
> = std::sync::OnceLock::new();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    use crate::drivers::button::RESET_BUTTON;
    use crate::events::{APP_EVENTS, Event};

    // SAFETY: both calls are register reads, safe in ISR context.
    let (now_us, level) = unsafe { (esp_timer_get_time(), gpio_get_level(pins::BUTTON_GPIO)) };
    let now_ms = (now_us / 1_000) as u64;
    if RESET_BUTTON.arm(level == 0, now_ms) && APP_EVENTS.post_from_isr(Event::ButtonPress) {
        if let Some(relay) = ISR_RELAY.get() {
            // SAFETY: the notifier targets the relay task, which never
            // exits; notify_and_yield uses the FromISR variants here.
            unsafe {
                relay.notify_and_yield(core::num::NonZeroU32::MIN);
            }
        }
    }
}

/// Start the task that turns ISR notifications into channel wake-ups.
#[cfg(target_os = "espidf")]
fn start_isr_relay() -> Result<(), SetupError> {
    use esp_idf_svc::hal::task::notification::Notification;

    use crate::drivers::task_pin::{Core, spawn_on_core};
    use crate::events::APP_EVENTS;

    if ISR_RELAY.get().is_some() {
        return Ok(());
    }
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    let _detached = spawn_on_core(Core::App, ISR_RELAY_PRIORITY, 3, "isr_relay\0", move || {
        // The notification is bound to the task that creates it.
        let notification = Notification::new();
        if tx.send(notification.notifier()).is_err() {
            return;
        }
        loop {
            notification.wait_any();
            APP_EVENTS.wake();
        }
    })?;
    let notifier = rx.recv().map_err(|_| SetupError::TaskCreateFailed)?;
    // Only reached once: the early return above covers a second call.
    let _ = ISR_RELAY.set(notifier);
    Ok(())
}

/// Configure the button GPIO for falling-edge interrupts and register the
/// handler.  Call after the button pin driver exists and after
/// [`RESET_BUTTON`](crate::drivers::button::RESET_BUTTON) is configured.
#[cfg(target_os = "espidf")]
pub fn init_button_isr() -> Result<(), SetupError> {
    start_isr_relay()?;

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler only touches atomics
    // and the relay notifier.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(SetupError::GpioConfigFailed(ret));
        }

        let ret = gpio_set_intr_type(pins::BUTTON_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        if ret != ESP_OK as i32 {
            return Err(SetupError::GpioConfigFailed(ret));
        }
        let ret = gpio_isr_handler_add(pins::BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(SetupError::GpioConfigFailed(ret));
        }
        let ret = gpio_intr_enable(pins::BUTTON_GPIO);
        if ret != ESP_OK as i32 {
            return Err(SetupError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: button ISR installed on GPIO{}", pins::BUTTON_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_isr() -> Result<(), SetupError> {
    log::info!("hw_init(sim): button ISR skipped");
    Ok(())
}
