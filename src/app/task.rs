//! The application task.
//!
//! A single task owns every piece of mutable application state.  Interrupt
//! handlers, the blink timer and the protocol stack only post event bits;
//! the task waits for them, dispatches the whole mask in a fixed order and
//! goes back to sleep.
//!
//! ```text
//!            ┌──────────────────────── loop ───────────────────────┐
//!            ▼                                                     │
//!   wait_next(timeout) ──▶ Started ──▶ lighting ──▶ Timer ──▶ system
//!                                                                  │
//!            timeout ◀── reboot guard poll ◀── indicator update ◀──┘
//! ```
//!
//! [`AppTask::step`] is the synchronous body of one iteration; tests drive
//! it directly.  [`AppTask::run`] wraps it in the async forever-loop.

use embassy_time::Duration;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::lighting::{apply_light_state, read_light_state, write_on_off};
use crate::app::ports::{EventSink, Hardware, StackAccess, StackLock, StackPort, StoragePort};
use crate::config::{BoardPolicy, FLASH_HOLD_MS, Hsv, NodeConfig, StartupVisual};
use crate::drivers::button::ButtonWindow;
use crate::events::{Event, EventChannel, EventMask};
use crate::indicator::{Drive, Indicator};
use crate::reboot_guard::{GuardOutcome, RebootGuard};

pub struct AppTask<H, S, K, E> {
    config: NodeConfig,
    policy: BoardPolicy,
    hw: H,
    store: S,
    stack: K,
    sink: E,
    events: &'static EventChannel,
    button: &'static ButtonWindow,
    guard: RebootGuard,
    indicator: Indicator,
    /// Unprovisioned at power-up; decided on the first `Started`.
    powerup_default: Option<bool>,
    powerup_indicated: bool,
    heartbeat_due_ms: u64,
    timeout_ms: Option<u32>,
}

impl<H, S, K, E> AppTask<H, S, K, E>
where
    H: Hardware,
    S: StoragePort,
    K: StackPort,
    E: EventSink,
{
    pub fn new(
        config: NodeConfig,
        hw: H,
        store: S,
        stack: K,
        sink: E,
        events: &'static EventChannel,
        button: &'static ButtonWindow,
    ) -> Self {
        button.configure(&config.button);
        Self {
            policy: config.policy(),
            guard: RebootGuard::new(config.reboot_guard),
            indicator: Indicator::new(config.indicator),
            config,
            hw,
            store,
            stack,
            sink,
            events,
            button,
            powerup_default: None,
            powerup_indicated: false,
            heartbeat_due_ms: 0,
            timeout_ms: None,
        }
    }

    /// Wait/dispatch forever.
    pub async fn run(&mut self) {
        info!("AppTask: event loop running ({:?})", self.config.variant);
        loop {
            let timeout = self.timeout_ms.map(|ms| Duration::from_millis(u64::from(ms)));
            let mask = self.events.wait_next(timeout).await;
            self.step(mask);
        }
    }

    /// Dispatch one event mask (possibly empty after a timeout) and return
    /// the next wait timeout in ms (`None` = wait forever).
    pub fn step(&mut self, mask: EventMask) -> Option<u32> {
        if !mask.is_empty() {
            debug!("AppTask: dispatch {:?}", mask);
        }

        if mask.contains(Event::Started) {
            self.on_started();
        }
        if mask.intersects(EventMask::LIGHTING) {
            self.update_lighting();
        }
        if mask.contains(Event::Timer) {
            self.on_timer();
        }
        if mask.intersects(EventMask::SYSTEM) {
            self.on_system(mask);
        }

        if self.policy.reboot_guard {
            let now = self.hw.now_ms();
            let outcome = self.guard.poll(&mut self.store, now);
            if outcome == GuardOutcome::Expired {
                self.sink.emit(&AppEvent::RebootWindowClosed);
            }
            self.timeout_ms = outcome.timeout_ms();
        } else {
            self.timeout_ms = None;
        }

        if self.indicator_enabled() {
            self.update_indicator(mask);
        }

        self.timeout_ms
    }

    // ── Started ───────────────────────────────────────────────

    fn on_started(&mut self) {
        if self.policy.reboot_guard {
            let was_armed = self.guard.is_armed();
            let now = self.hw.now_ms();
            match self.guard.on_startup(&mut self.store, now) {
                GuardOutcome::FactoryReset => {
                    self.events.post(Event::FactoryReset);
                    return;
                }
                GuardOutcome::Wait(window_ms) if !was_armed => {
                    let remaining = self.guard.read_counter(&self.store);
                    self.sink.emit(&AppEvent::RebootCounted {
                        remaining,
                        window_ms,
                    });
                }
                _ => {}
            }
        }

        if self.powerup_default.is_none() {
            let stack = StackLock::new(&mut self.stack);
            let thread = stack.is_thread_provisioned() && stack.is_thread_enabled();
            let unprovisioned = !thread && !stack.is_wifi_provisioned();
            drop(stack);
            self.powerup_default = Some(unprovisioned);
        }
        let unprovisioned = self.powerup_default == Some(true);

        let first = !self.powerup_indicated;
        self.powerup_indicated = true;
        if first {
            self.sink.emit(&AppEvent::Started { unprovisioned });
        }

        match self.policy.startup_visual {
            StartupVisual::LightOn => self.sync_on_off(true),
            StartupVisual::ProvisioningAware if first => {
                if unprovisioned {
                    info!("AppTask: not provisioned");
                    if let Some(colour) = self.policy.unprovisioned_flash {
                        self.flash(colour);
                    }
                    self.sync_on_off(false);
                } else {
                    info!("AppTask: provisioned");
                    self.sync_on_off(true);
                }
            }
            StartupVisual::ProvisioningAware => {}
        }
    }

    // ── Lighting ──────────────────────────────────────────────

    fn update_lighting(&mut self) {
        let endpoint = self.config.light_endpoint;
        let read = {
            let stack = StackLock::new(&mut self.stack);
            read_light_state(&*stack, endpoint)
        };
        match read {
            Ok(state) => {
                apply_light_state(&mut self.hw, &state, self.policy.color_light);
                self.sink.emit(&AppEvent::LightingApplied {
                    on: state.on,
                    level: state.level,
                    hue: state.hue,
                    saturation: state.saturation,
                });
            }
            Err(e) => {
                warn!("AppTask: lighting update skipped: {}", e);
                self.sink.emit(&AppEvent::LightingSkipped);
            }
        }
    }

    /// Write on/off + full level to the cluster.  The resulting attribute
    /// change comes back as a lighting event.
    fn sync_on_off(&mut self, on: bool) {
        let endpoint = self.config.light_endpoint;
        let mut stack = StackLock::new(&mut self.stack);
        if let Err(e) = write_on_off(&mut *stack, endpoint, on) {
            warn!("AppTask: on/off write failed: {}", e);
        }
    }

    /// Show `colour` for [`FLASH_HOLD_MS`].
    fn flash(&mut self, (level, hue, saturation): Hsv) {
        if self.policy.color_light {
            self.hw.set_color(level, hue, saturation);
        } else {
            self.hw.set_level(level);
        }
        self.hw.delay_ms(FLASH_HOLD_MS);
    }

    // ── Timer ─────────────────────────────────────────────────

    fn on_timer(&mut self) {
        let now = self.hw.now_ms();

        if self.policy.button {
            let pressed = self.hw.is_pressed();
            if let Some(event) = self.button.on_tick(pressed, now) {
                self.events.post(event);
            }
        }

        if self.indicator_enabled() {
            // A tick that lands after a switch to a static level is stale.
            if let Drive::Blink(_) = self.indicator.active().drive(self.hw.is_on()) {
                if self.policy.status_blink {
                    self.hw.toggle();
                }
                self.rearm();
            }
        }

        if now >= self.heartbeat_due_ms {
            self.heartbeat_due_ms = now + u64::from(self.config.heartbeat_interval_ms);
            self.sink.emit(&AppEvent::Heartbeat {
                uptime_ms: now,
                mode: self.indicator.mode(),
            });
        }
    }

    // ── System ────────────────────────────────────────────────

    fn on_system(&mut self, mask: EventMask) {
        if mask.contains(Event::FactoryReset) {
            self.sink.emit(&AppEvent::FactoryResetRequested);
            if let Some(colour) = self.policy.reset_flash {
                self.flash(colour);
            }
            StackLock::new(&mut self.stack).initiate_factory_reset();
            return;
        }

        if self.policy.button {
            if mask.contains(Event::ButtonPress) {
                self.sink.emit(&AppEvent::ButtonArmed);
            }
            if mask.contains(Event::ButtonCancel) {
                self.sink.emit(&AppEvent::ButtonCancelled);
            }
        }

        if mask.contains(Event::Provisioned)
            && self.policy.startup_visual == StartupVisual::ProvisioningAware
            && self.powerup_default == Some(true)
        {
            info!("AppTask: commissioned");
            self.powerup_default = Some(false);
            if let Some(colour) = self.policy.commissioned_flash {
                self.flash(colour);
            }
            self.sync_on_off(false);
        }

        if self.policy.on_for_system_events {
            self.sync_on_off(true);
        }
    }

    // ── Indicator ─────────────────────────────────────────────

    fn indicator_enabled(&self) -> bool {
        self.policy.status_blink || self.policy.button
    }

    fn update_indicator(&mut self, mask: EventMask) {
        if !self.indicator.apply(mask) {
            return;
        }
        let duty = self.indicator.active();
        self.sink.emit(&AppEvent::IndicatorChanged {
            mode: duty.mode,
            on_ms: duty.on_ms,
            off_ms: duty.off_ms,
        });
        self.rearm();
    }

    /// Restart the blink timer from the active pair, using the half that
    /// matches the LED's current level.
    fn rearm(&mut self) {
        match self.indicator.active().drive(self.hw.is_on()) {
            Drive::Blink(ms) => self.hw.start(ms),
            Drive::Static(on) => {
                self.hw.cancel();
                if self.policy.status_blink {
                    self.hw.set_on(on);
                }
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stack(&self) -> &K {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut K {
        &mut self.stack
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn indicator(&self) -> &Indicator {
        &self.indicator
    }

    pub fn reboot_guard(&self) -> &RebootGuard {
        &self.guard
    }

    /// Timeout returned by the last [`step`](Self::step).
    pub fn timeout_ms(&self) -> Option<u32> {
        self.timeout_ms
    }
}
