//! In-process protocol stack adapter.
//!
//! Holds the connectivity flags and the light cluster attributes the
//! application reads, behind the stack lock.  The commissioning stack (or
//! a test) updates state through [`SharedStack::update`] and reports
//! changes through [`SharedStack::notify`]; the application task reaches
//! it through a [`LocalStack`] handle implementing [`StackPort`].
//!
//! ```text
//!  stack task ──update/notify──▶ SharedStack ◀──StackLock── AppTask
//!                                     │
//!                        attribute write ──▶ EventChannel (OnOff/Level/Color)
//! ```
//!
//! Two levels of locking:
//! - `held` is the coarse stack lock ([`StackPort::lock`]).  The
//!   application task takes it through [`StackLock`](crate::app::ports::StackLock);
//!   [`SharedStack::update`] and [`SharedStack::notify`] take it on the
//!   stack side.  Waiters block on a condition variable.  It is not
//!   reentrant: never call `update` or `notify` under a `StackLock`.
//! - `state` is a critical-section mutex so each individual access is
//!   consistent on its own.

use core::cell::RefCell;
use std::sync::{Condvar, Mutex as StdMutex, MutexGuard, PoisonError};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, warn};

use crate::app::ports::{AttributePath, LightAttribute, StackAccess, StackError, StackPort};
use crate::app::stack_events::{self, StackEvent};
use crate::events::EventChannel;

/// Connectivity flags and light attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackState {
    pub thread_provisioned: bool,
    pub thread_enabled: bool,
    pub thread_attached: bool,
    pub wifi_provisioned: bool,
    pub ble_connections: u16,
    pub on_off: u8,
    pub level: u8,
    pub hue: u8,
    pub saturation: u8,
    pub factory_reset_requested: bool,
}

impl StackState {
    pub const INITIAL: Self = Self {
        thread_provisioned: false,
        thread_enabled: false,
        thread_attached: false,
        wifi_provisioned: false,
        ble_connections: 0,
        on_off: 0,
        level: 254,
        hue: 0,
        saturation: 0,
        factory_reset_requested: false,
    };
}

impl Default for StackState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Binary lock whose waiters sleep instead of spinning.
struct CoarseLock {
    held: StdMutex<bool>,
    released: Condvar,
}

impl CoarseLock {
    const fn new() -> Self {
        Self {
            held: StdMutex::new(false),
            released: Condvar::new(),
        }
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        // Poisoned by a panic while held: take it over.
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) {
        let mut held = self.flag();
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    fn release(&self) {
        *self.flag() = false;
        self.released.notify_one();
    }

    fn is_held(&self) -> bool {
        *self.flag()
    }
}

/// Stack-side hold on the coarse lock, released on drop.
struct Held<'a>(&'a CoarseLock);

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

pub struct SharedStack {
    endpoint: u16,
    held: CoarseLock,
    state: Mutex<CriticalSectionRawMutex, RefCell<StackState>>,
    events: &'static EventChannel,
}

impl SharedStack {
    pub const fn new(endpoint: u16, events: &'static EventChannel) -> Self {
        Self {
            endpoint,
            held: CoarseLock::new(),
            state: Mutex::new(RefCell::new(StackState::INITIAL)),
            events,
        }
    }

    fn hold(&self) -> Held<'_> {
        self.held.acquire();
        Held(&self.held)
    }

    pub fn endpoint(&self) -> u16 {
        self.endpoint
    }

    pub fn snapshot(&self) -> StackState {
        self.state.lock(|s| *s.borrow())
    }

    /// Mutate stack-side state (stack task context).  Blocks while the
    /// application holds the stack lock.
    pub fn update(&self, f: impl FnOnce(&mut StackState)) {
        let _held = self.hold();
        self.modify(f);
    }

    /// Deliver a stack notification under the stack lock; posts the
    /// matching application event.
    pub fn notify(&self, event: StackEvent) {
        let _held = self.hold();
        let handle = LocalStack::new(self);
        stack_events::on_stack_event(event, &handle, self.events);
    }

    /// Whether the coarse stack lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.held.is_held()
    }

    fn modify(&self, f: impl FnOnce(&mut StackState)) {
        self.state.lock(|s| f(&mut s.borrow_mut()));
    }

    fn read(&self, path: AttributePath) -> Result<u8, StackError> {
        if path.endpoint != self.endpoint {
            return Err(StackError::UnknownAttribute);
        }
        Ok(self.state.lock(|s| {
            let s = s.borrow();
            match path.attribute {
                LightAttribute::OnOff => s.on_off,
                LightAttribute::CurrentLevel => s.level,
                LightAttribute::CurrentHue => s.hue,
                LightAttribute::CurrentSaturation => s.saturation,
            }
        }))
    }

    fn write(&self, path: AttributePath, value: u8) -> Result<(), StackError> {
        if path.endpoint != self.endpoint {
            return Err(StackError::UnknownAttribute);
        }
        let value = match path.attribute {
            LightAttribute::OnOff => u8::from(value != 0),
            _ => value.min(254),
        };
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            match path.attribute {
                LightAttribute::OnOff => s.on_off = value,
                LightAttribute::CurrentLevel => s.level = value,
                LightAttribute::CurrentHue => s.hue = value,
                LightAttribute::CurrentSaturation => s.saturation = value,
            }
        });
        // Attribute-change callback.
        self.events.post(stack_events::lighting_event(path.attribute));
        debug!("stack: {:?} <- {}", path.attribute, value);
        Ok(())
    }
}

/// Application-side handle to a [`SharedStack`].
pub struct LocalStack<'a> {
    shared: &'a SharedStack,
}

impl<'a> LocalStack<'a> {
    pub fn new(shared: &'a SharedStack) -> Self {
        Self { shared }
    }

    pub fn shared(&self) -> &'a SharedStack {
        self.shared
    }
}

impl StackAccess for LocalStack<'_> {
    fn is_thread_provisioned(&self) -> bool {
        self.shared.snapshot().thread_provisioned
    }

    fn is_thread_enabled(&self) -> bool {
        self.shared.snapshot().thread_enabled
    }

    fn is_thread_attached(&self) -> bool {
        self.shared.snapshot().thread_attached
    }

    fn is_wifi_provisioned(&self) -> bool {
        self.shared.snapshot().wifi_provisioned
    }

    fn num_ble_connections(&self) -> u16 {
        self.shared.snapshot().ble_connections
    }

    fn read_attribute(&self, path: AttributePath) -> Result<u8, StackError> {
        self.shared.read(path)
    }

    fn write_attribute(&mut self, path: AttributePath, value: u8) -> Result<(), StackError> {
        self.shared.write(path, value)
    }

    fn initiate_factory_reset(&mut self) {
        // Called under the application's StackLock.
        self.shared.modify(|s| s.factory_reset_requested = true);
        factory_reset_and_restart();
    }
}

impl StackPort for LocalStack<'_> {
    fn lock(&self) {
        self.shared.held.acquire();
    }

    fn unlock(&self) {
        self.shared.held.release();
    }
}

#[cfg(target_os = "espidf")]
fn factory_reset_and_restart() {
    warn!("stack: erasing NVS partition and restarting");
    // SAFETY: erase then restart; nothing runs after esp_restart.
    unsafe {
        let ret = esp_idf_svc::sys::nvs_flash_erase();
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            warn!("stack: NVS erase failed (rc={})", ret);
        }
        esp_idf_svc::sys::esp_restart();
    }
}

#[cfg(not(target_os = "espidf"))]
fn factory_reset_and_restart() {
    warn!("stack(sim): factory reset requested");
}
