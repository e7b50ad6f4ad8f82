//! Attribute-change events → light output, and dispatch order.

use crate::mock_hw::{Harness, LightCall};
use lightnode::app::events::AppEvent;
use lightnode::app::ports::LightAttribute;
use lightnode::config::BoardVariant;
use lightnode::events::{Event, EventMask};

#[test]
fn colour_change_drives_hsv_on_colour_boards() {
    let mut h = Harness::new(BoardVariant::Hub);
    let attrs = &mut h.stack_mut().attributes;
    attrs.insert(LightAttribute::OnOff, 1);
    attrs.insert(LightAttribute::CurrentLevel, 128);
    attrs.insert(LightAttribute::CurrentHue, 42);
    attrs.insert(LightAttribute::CurrentSaturation, 200);

    h.step(Event::Color);

    assert_eq!(h.hw().light, vec![LightCall::Color(128, 42, 200)]);
    assert_eq!(
        h.sink().last(),
        Some(&AppEvent::LightingApplied {
            on: true,
            level: 128,
            hue: 42,
            saturation: 200
        })
    );
}

#[test]
fn off_forces_zero_level() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.stack_mut().attributes.insert(LightAttribute::CurrentLevel, 200);
    h.step(Event::Level);
    assert_eq!(h.hw().light, vec![LightCall::Level(0)]);
}

#[test]
fn failed_read_skips_the_update() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.stack_mut().attributes.insert(LightAttribute::OnOff, 1);
    h.stack_mut().fail_read = Some(LightAttribute::CurrentHue);

    h.step(EventMask::from(Event::OnOff) | Event::Color);

    assert!(h.hw().light.is_empty(), "no partial update");
    assert_eq!(h.sink().last(), Some(&AppEvent::LightingSkipped));
    assert_eq!(h.stack().lock_depth.get(), 0, "lock released on failure");
}

#[test]
fn several_lighting_bits_apply_once() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.stack_mut().attributes.insert(LightAttribute::OnOff, 1);
    h.stack_mut().attributes.insert(LightAttribute::CurrentLevel, 90);

    h.step(EventMask::LIGHTING);

    assert_eq!(h.hw().light, vec![LightCall::Level(90)]);
}

#[test]
fn one_mask_dispatches_started_lighting_timer_then_system() {
    let mut h = Harness::new(BoardVariant::DevKit);
    let mask = EventMask::from(Event::ButtonPress) | Event::Timer | Event::OnOff | Event::Started;

    h.step(mask);

    let rec = h.recorded();
    let started = rec.position(|e| matches!(e, AppEvent::Started { .. }));
    let lighting = rec.position(|e| matches!(e, AppEvent::LightingApplied { .. }));
    let heartbeat = rec.position(|e| matches!(e, AppEvent::Heartbeat { .. }));
    let armed = rec.position(|e| matches!(e, AppEvent::ButtonArmed));
    let indicator = rec.position(|e| matches!(e, AppEvent::IndicatorChanged { .. }));

    assert!(started < lighting, "{:?}", rec.events);
    assert!(lighting < heartbeat, "{:?}", rec.events);
    assert!(heartbeat < armed, "{:?}", rec.events);
    assert!(armed < indicator, "{:?}", rec.events);
    assert!(started.is_some() && indicator.is_some());
}

#[test]
fn heartbeat_is_rate_limited() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.step(Event::Timer);
    h.hw_mut().advance(5_000);
    h.step(Event::Timer);
    h.hw_mut().advance(5_000);
    h.step(Event::Timer);

    let beats: Vec<u64> = h
        .sink()
        .iter()
        .filter_map(|e| match e {
            AppEvent::Heartbeat { uptime_ms, .. } => Some(*uptime_ms),
            _ => None,
        })
        .collect();
    assert_eq!(beats, vec![0, 10_000]);
}
