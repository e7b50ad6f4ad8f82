//! End-to-end through the in-process stack adapter and the async loop.

use std::time::Duration as StdDuration;

use embassy_time::{Duration, with_timeout};
use lightnode::adapters::stack::{LocalStack, SharedStack};
use lightnode::app::events::AppEvent;
use lightnode::app::stack_events::StackEvent;
use lightnode::app::task::AppTask;
use lightnode::config::{BoardVariant, NodeConfig};
use lightnode::drivers::button::ButtonWindow;
use lightnode::events::{Event, EventChannel};
use lightnode::indicator::IndicatorMode;

use crate::mock_hw::{LightCall, MockHardware, MockNvs, RecordingSink};

type StackTask = AppTask<MockHardware, MockNvs, LocalStack<'static>, RecordingSink>;

fn make(variant: BoardVariant) -> (StackTask, &'static SharedStack, &'static EventChannel) {
    let events: &'static EventChannel = Box::leak(Box::new(EventChannel::new()));
    let button: &'static ButtonWindow = Box::leak(Box::new(ButtonWindow::new()));
    let config = NodeConfig::for_variant(variant);
    let shared: &'static SharedStack =
        Box::leak(Box::new(SharedStack::new(config.light_endpoint, events)));
    let task = AppTask::new(
        config,
        MockHardware::new(),
        MockNvs::new(),
        LocalStack::new(shared),
        RecordingSink::default(),
        events,
        button,
    );
    (task, shared, events)
}

fn drain(task: &mut StackTask, events: &EventChannel) {
    loop {
        let mask = events.take();
        if mask.is_empty() {
            break;
        }
        task.step(mask);
    }
}

#[test]
fn started_write_round_trips_through_attribute_callback() {
    let (mut task, shared, events) = make(BoardVariant::DevKit);
    task.step(Event::Started.into());

    assert_eq!(shared.snapshot().on_off, 1);
    assert!(events.pending().contains(Event::OnOff));
    drain(&mut task, events);

    assert_eq!(task.hardware().light.last(), Some(&LightCall::Level(254)));
    assert!(!shared.is_locked());
}

#[test]
fn stack_notifications_drive_indicator() {
    let (mut task, shared, events) = make(BoardVariant::Hub);

    shared.update(|s| s.ble_connections = 1);
    shared.notify(StackEvent::BleAdvertisingChange);
    drain(&mut task, events);
    assert_eq!(task.indicator().mode(), IndicatorMode::BleConnected);

    shared.update(|s| {
        s.thread_provisioned = true;
        s.thread_enabled = true;
    });
    shared.notify(StackEvent::ThreadStateChange);
    drain(&mut task, events);
    assert_eq!(task.indicator().mode(), IndicatorMode::Provisioned);
}

#[test]
fn factory_reset_reaches_the_stack() {
    let (mut task, shared, events) = make(BoardVariant::Hub);
    events.post(Event::FactoryReset);
    drain(&mut task, events);
    assert!(shared.snapshot().factory_reset_requested);
    assert!(task.sink().events.contains(&AppEvent::FactoryResetRequested));
}

#[test]
fn run_loop_consumes_posted_events() {
    let (mut task, shared, events) = make(BoardVariant::DevKit);
    events.post(Event::Started);

    let poster = std::thread::spawn(move || {
        std::thread::sleep(StdDuration::from_millis(20));
        events.post(Event::BleConnected);
    });

    let result = futures_lite::future::block_on(with_timeout(
        Duration::from_millis(200),
        task.run(),
    ));
    poster.join().unwrap();

    assert!(result.is_err(), "run() never returns");
    assert_eq!(shared.snapshot().on_off, 1);
    assert!(task
        .sink()
        .events
        .contains(&AppEvent::Started { unprovisioned: true }));
    assert_eq!(task.indicator().mode(), IndicatorMode::BleConnected);
}
