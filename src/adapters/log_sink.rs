//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`AppEvent`] as one tagged line
//! to the `log` facade (UART / USB-CDC via the ESP-IDF logger in
//! production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { unprovisioned } => {
                info!(
                    "BOOT  | started, {}",
                    if *unprovisioned { "not provisioned" } else { "provisioned" }
                );
            }
            AppEvent::RebootCounted {
                remaining,
                window_ms,
            } => {
                info!(
                    "BOOT  | reboot counter={} (reboot within {} ms to count)",
                    remaining, window_ms
                );
            }
            AppEvent::RebootWindowClosed => {
                info!("BOOT  | reboot window closed, counter restored");
            }
            AppEvent::IndicatorChanged {
                mode,
                on_ms,
                off_ms,
            } => {
                info!("LED   | {:?} on={}ms off={}ms", mode, on_ms, off_ms);
            }
            AppEvent::ButtonArmed => {
                info!("RESET | button held, keep holding to factory reset");
            }
            AppEvent::ButtonCancelled => {
                info!("RESET | button released, factory reset cancelled");
            }
            AppEvent::FactoryResetRequested => {
                warn!("RESET | factory reset");
            }
            AppEvent::LightingApplied {
                on,
                level,
                hue,
                saturation,
            } => {
                info!(
                    "LIGHT | onoff={} level={} hue={} sat={}",
                    u8::from(*on),
                    level,
                    hue,
                    saturation
                );
            }
            AppEvent::LightingSkipped => {
                warn!("LIGHT | attribute read failed, update skipped");
            }
            AppEvent::Heartbeat { uptime_ms, mode } => {
                info!(
                    "HEART | up {}s | led={:?} | heap free={} min={}",
                    uptime_ms / 1_000,
                    mode,
                    free_heap(),
                    min_free_heap()
                );
            }
        }
    }
}

#[cfg(target_os = "espidf")]
fn free_heap() -> u32 {
    // SAFETY: allocator statistics query, no preconditions.
    unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
}

#[cfg(target_os = "espidf")]
fn min_free_heap() -> u32 {
    // SAFETY: allocator statistics query, no preconditions.
    unsafe { esp_idf_svc::sys::esp_get_minimum_free_heap_size() }
}

#[cfg(not(target_os = "espidf"))]
fn free_heap() -> u32 {
    0
}

#[cfg(not(target_os = "espidf"))]
fn min_free_heap() -> u32 {
    0
}
