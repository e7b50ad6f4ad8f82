//! Indicator blink timer on ESP-IDF's `esp_timer`.
//!
//! A single re-armable one-shot timer.  Each expiry posts
//! [`Event::Timer`]; the application task decides the next period and
//! re-arms it.  Callbacks run in the ESP timer task (not an ISR), so
//! they use the task-context [`post_event`].
//!
//! On simulation targets a helper thread sleeps for the period and posts
//! the event unless the timer was restarted or cancelled in between.

use crate::app::ports::BlinkTimerPort;
use crate::error::SetupError;
use crate::events::{Event, post_event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn blink_timer_cb(_arg: *mut core::ffi::c_void) {
    post_event(Event::Timer);
}

#[cfg(target_os = "espidf")]
pub struct BlinkTimer {
    handle: esp_timer_handle_t,
}

// SAFETY: esp_timer handles may be started / stopped from any task; the
// esp_timer API serialises access internally.
#[cfg(target_os = "espidf")]
unsafe impl Send for BlinkTimer {}

#[cfg(target_os = "espidf")]
impl BlinkTimer {
    pub fn new() -> Result<Self, SetupError> {
        let args = esp_timer_create_args_t {
            callback: Some(blink_timer_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"blink".as_ptr(),
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args outlives the call; handle is written on success only.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(SetupError::TimerCreateFailed(ret));
        }
        log::info!("hw_timer: blink timer created");
        Ok(Self { handle })
    }
}

#[cfg(target_os = "espidf")]
impl BlinkTimerPort for BlinkTimer {
    fn start(&mut self, period_ms: u32) {
        // SAFETY: handle is valid for the lifetime of self.
        unsafe {
            // ESP_ERR_INVALID_STATE when not running; harmless.
            esp_timer_stop(self.handle);
            let ret = esp_timer_start_once(self.handle, u64::from(period_ms) * 1_000);
            if ret != ESP_OK as i32 {
                log::warn!("hw_timer: start failed (rc={})", ret);
            }
        }
    }

    fn cancel(&mut self) {
        // SAFETY: handle is valid for the lifetime of self.
        unsafe {
            esp_timer_stop(self.handle);
        }
    }

    fn is_active(&self) -> bool {
        // SAFETY: read-only query on a valid handle.
        unsafe { esp_timer_is_active(self.handle) }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for BlinkTimer {
    fn drop(&mut self) {
        // SAFETY: handle was created in new() and is not used after drop.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct BlinkTimer {
    generation: std::sync::Arc<std::sync::atomic::AtomicU32>,
    armed: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(not(target_os = "espidf"))]
impl BlinkTimer {
    pub fn new() -> Result<Self, SetupError> {
        log::info!("hw_timer(sim): blink timer backed by sleeper threads");
        Ok(Self {
            generation: std::sync::Arc::default(),
            armed: std::sync::Arc::default(),
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl BlinkTimerPort for BlinkTimer {
    fn start(&mut self, period_ms: u32) {
        use std::sync::atomic::Ordering;

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.armed.store(true, Ordering::Release);
        let current = self.generation.clone();
        let armed = self.armed.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(period_ms)));
            if current.load(Ordering::Acquire) == generation {
                armed.store(false, Ordering::Release);
                post_event(Event::Timer);
            }
        });
    }

    fn cancel(&mut self) {
        use std::sync::atomic::Ordering;
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.armed.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.armed.load(std::sync::atomic::Ordering::Acquire)
    }
}
