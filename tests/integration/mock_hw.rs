//! Mock adapters for integration tests.
//!
//! Records every light, LED, timer and delay call so tests can assert on
//! the full history without touching GPIO or LEDC registers.  Time is a
//! manual clock advanced by the test.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use lightnode::app::events::AppEvent;
use lightnode::app::ports::{
    AttributePath, BlinkTimerPort, ButtonInput, EventSink, LightAttribute, LightPort, StackAccess,
    StackError, StackPort, StatusIndicator, StorageError, StoragePort, TimePort,
};
use lightnode::app::stack_events::lighting_event;
use lightnode::app::task::AppTask;
use lightnode::config::{BoardVariant, NodeConfig};
use lightnode::drivers::button::ButtonWindow;
use lightnode::events::{EventChannel, EventMask};

// ── Light call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCall {
    Level(u8),
    Color(u8, u8, u8),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub now: u64,
    pub light: Vec<LightCall>,
    pub led_on: bool,
    pub led_writes: u32,
    /// Period of the armed blink timer.
    pub timer: Option<u32>,
    pub timer_starts: Vec<u32>,
    pub pressed: bool,
    pub delays_ms: Vec<u32>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl LightPort for MockHardware {
    fn set_level(&mut self, level: u8) {
        self.light.push(LightCall::Level(level));
    }

    fn set_color(&mut self, level: u8, hue: u8, saturation: u8) {
        self.light.push(LightCall::Color(level, hue, saturation));
    }
}

impl StatusIndicator for MockHardware {
    fn set_on(&mut self, on: bool) {
        self.led_on = on;
        self.led_writes += 1;
    }

    fn is_on(&self) -> bool {
        self.led_on
    }
}

impl BlinkTimerPort for MockHardware {
    fn start(&mut self, period_ms: u32) {
        self.timer = Some(period_ms);
        self.timer_starts.push(period_ms);
    }

    fn cancel(&mut self) {
        self.timer = None;
    }

    fn is_active(&self) -> bool {
        self.timer.is_some()
    }
}

impl ButtonInput for MockHardware {
    fn is_pressed(&mut self) -> bool {
        self.pressed
    }
}

impl TimePort for MockHardware {
    fn now_ms(&self) -> u64 {
        self.now
    }
}

impl DelayNs for MockHardware {
    /// Delays are recorded, not slept; the manual clock does not move.
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

/// Key-value store that survives a simulated reboot: clones share data.
#[derive(Clone, Default)]
pub struct MockNvs {
    store: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        self.store.borrow().get(&format!("{}::{}", namespace, key)).cloned()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = format!("{}::{}", namespace, key);
        match self.store.borrow().get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let k = format!("{}::{}", namespace, key);
        self.store.borrow_mut().insert(k, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.borrow_mut().remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.borrow().contains_key(&format!("{}::{}", namespace, key))
    }
}

// ── MockStack ─────────────────────────────────────────────────

pub struct MockStack {
    pub thread_provisioned: bool,
    pub thread_enabled: bool,
    pub wifi_provisioned: bool,
    pub ble_connections: u16,
    pub attributes: HashMap<LightAttribute, u8>,
    pub fail_read: Option<LightAttribute>,
    pub factory_resets: u32,
    pub lock_depth: std::cell::Cell<i32>,
    pub accessed_unlocked: std::cell::Cell<bool>,
    /// Attribute writes post lighting events here when set.
    pub events: Option<&'static EventChannel>,
}

#[allow(dead_code)]
impl MockStack {
    pub fn new(events: Option<&'static EventChannel>) -> Self {
        Self {
            thread_provisioned: false,
            thread_enabled: false,
            wifi_provisioned: false,
            ble_connections: 0,
            attributes: HashMap::new(),
            fail_read: None,
            factory_resets: 0,
            lock_depth: std::cell::Cell::new(0),
            accessed_unlocked: std::cell::Cell::new(false),
            events,
        }
    }

    pub fn attr(&self, attribute: LightAttribute) -> u8 {
        self.attributes.get(&attribute).copied().unwrap_or(0)
    }

    fn check_locked(&self) {
        if self.lock_depth.get() <= 0 {
            self.accessed_unlocked.set(true);
        }
    }
}

impl StackAccess for MockStack {
    fn is_thread_provisioned(&self) -> bool {
        self.check_locked();
        self.thread_provisioned
    }

    fn is_thread_enabled(&self) -> bool {
        self.check_locked();
        self.thread_enabled
    }

    fn is_thread_attached(&self) -> bool {
        self.check_locked();
        self.thread_provisioned && self.thread_enabled
    }

    fn is_wifi_provisioned(&self) -> bool {
        self.check_locked();
        self.wifi_provisioned
    }

    fn num_ble_connections(&self) -> u16 {
        self.check_locked();
        self.ble_connections
    }

    fn read_attribute(&self, path: AttributePath) -> Result<u8, StackError> {
        self.check_locked();
        if self.fail_read == Some(path.attribute) {
            return Err(StackError::AttributeRead);
        }
        Ok(self.attr(path.attribute))
    }

    fn write_attribute(&mut self, path: AttributePath, value: u8) -> Result<(), StackError> {
        self.check_locked();
        self.attributes.insert(path.attribute, value);
        if let Some(events) = self.events {
            events.post(lighting_event(path.attribute));
        }
        Ok(())
    }

    fn initiate_factory_reset(&mut self) {
        self.check_locked();
        self.factory_resets += 1;
    }
}

impl StackPort for MockStack {
    fn lock(&self) {
        self.lock_depth.set(self.lock_depth.get() + 1);
    }

    fn unlock(&self) {
        self.lock_depth.set(self.lock_depth.get() - 1);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, pred: impl Fn(&AppEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Task harness ──────────────────────────────────────────────

pub type TestTask = AppTask<MockHardware, MockNvs, MockStack, RecordingSink>;

pub struct Harness {
    pub task: TestTask,
    pub events: &'static EventChannel,
    pub button: &'static ButtonWindow,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(variant: BoardVariant) -> Self {
        Self::with_config(NodeConfig::for_variant(variant), MockNvs::new())
    }

    /// Boot with an existing store, as after a reboot.
    pub fn with_config(config: NodeConfig, store: MockNvs) -> Self {
        let events: &'static EventChannel = Box::leak(Box::new(EventChannel::new()));
        let button: &'static ButtonWindow = Box::leak(Box::new(ButtonWindow::new()));
        let task = AppTask::new(
            config,
            MockHardware::new(),
            store,
            MockStack::new(Some(events)),
            RecordingSink::default(),
            events,
            button,
        );
        Self {
            task,
            events,
            button,
        }
    }

    pub fn step(&mut self, mask: impl Into<EventMask>) -> Option<u32> {
        self.task.step(mask.into())
    }

    /// Dispatch everything pending (including follow-ups posted during
    /// dispatch) until the channel is empty.
    pub fn drain(&mut self) -> Option<u32> {
        let mut timeout = self.task.timeout_ms();
        for _ in 0..32 {
            let mask = self.events.take();
            if mask.is_empty() {
                break;
            }
            timeout = self.task.step(mask);
        }
        timeout
    }

    /// Let the armed blink period elapse and deliver the tick.
    pub fn fire_timer(&mut self) {
        let hw = self.task.hardware_mut();
        let period = hw.timer.take().expect("blink timer not armed");
        hw.advance(u64::from(period));
        self.step(lightnode::events::Event::Timer);
        self.drain();
    }

    pub fn hw(&self) -> &MockHardware {
        self.task.hardware()
    }

    pub fn hw_mut(&mut self) -> &mut MockHardware {
        self.task.hardware_mut()
    }

    pub fn stack(&self) -> &MockStack {
        self.task.stack()
    }

    pub fn stack_mut(&mut self) -> &mut MockStack {
        self.task.stack_mut()
    }

    pub fn sink(&self) -> &[AppEvent] {
        &self.task.sink().events
    }

    pub fn recorded(&self) -> &RecordingSink {
        self.task.sink()
    }
}
