//! Light node firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HardwareAdapter          LogEventSink   NvsAdapter           │
//! │  (light, status LED,      (EventSink)    (Config + Storage)   │
//! │   button, blink timer)                                        │
//! │  SharedStack / LocalStack (StackPort)                         │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  AppTask: reboot guard · indicator · button · lighting  │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  APP_EVENTS ◀── button ISR · blink timer · stack callbacks    │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, PinDriver, Pull};
use log::{error, info, warn};

use lightnode::adapters::hardware::HardwareAdapter;
use lightnode::adapters::log_sink::LogEventSink;
use lightnode::adapters::nvs::NvsAdapter;
use lightnode::adapters::stack::{LocalStack, SharedStack};
use lightnode::adapters::time::Esp32TimeAdapter;
use lightnode::app::ports::ConfigPort;
use lightnode::app::task::AppTask;
use lightnode::config::NodeConfig;
use lightnode::drivers::button::{RESET_BUTTON, ResetButton};
use lightnode::drivers::hw_init;
use lightnode::drivers::hw_timer::BlinkTimer;
use lightnode::drivers::light::RgbLight;
use lightnode::drivers::status_led::StatusLed;
use lightnode::drivers::task_pin::{Core, spawn_on_core};
use lightnode::error::{Error, SetupError};
use lightnode::events::{APP_EVENTS, Event};
use lightnode::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Lightnode v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage + config ───────────────────────────────────
    let nvs = NvsAdapter::new().map_err(|e| {
        error!("NVS init failed: {}", e);
        Error::from(SetupError::StorageInitFailed)
    })?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            NodeConfig::default()
        }
    };
    if let Ok(json) = serde_json::to_string(&config) {
        info!("Config: {}", json);
    }
    let policy = config.policy();

    // ── 3. Board peripherals ──────────────────────────────────
    hw_init::init_light_pwm().map_err(fatal)?;

    // SAFETY: the pin numbers come from the board map and are not claimed
    // by any other driver.
    let led_pin = unsafe { AnyOutputPin::new(pins::STATUS_LED_GPIO) };
    let btn_pin = unsafe { AnyInputPin::new(pins::BUTTON_GPIO) };
    let status = StatusLed::new(PinDriver::output(led_pin)?);
    let mut btn = PinDriver::input(btn_pin)?;
    btn.set_pull(Pull::Up)?;

    let timer = BlinkTimer::new().map_err(fatal)?;
    let hw = HardwareAdapter::new(
        RgbLight::new(),
        status,
        ResetButton::new(btn),
        timer,
        Esp32TimeAdapter::new(),
        Delay::new_default(),
    );

    // ── 4. Protocol stack handle ──────────────────────────────
    let shared: &'static SharedStack =
        Box::leak(Box::new(SharedStack::new(config.light_endpoint, &APP_EVENTS)));

    // ── 5. Application task ───────────────────────────────────
    let priority = config.app_task_priority;
    let stack_kb = config.app_task_stack_kb;
    let mut task = AppTask::new(
        config,
        hw,
        nvs,
        LocalStack::new(shared),
        LogEventSink::new(),
        &APP_EVENTS,
        &RESET_BUTTON,
    );

    if policy.button {
        hw_init::init_button_isr().map_err(fatal)?;
    }

    let handle = spawn_on_core(Core::App, priority, stack_kb, "app\0", move || {
        futures_lite::future::block_on(task.run());
    })
    .map_err(fatal)?;

    // The stack is up once the task can receive events.
    APP_EVENTS.post(Event::Started);
    info!("System ready");

    if handle.join().is_err() {
        error!("Application task panicked");
    }
    Ok(())
}

fn fatal(e: SetupError) -> Error {
    error!("Setup failed: {}", e);
    Error::from(e)
}
