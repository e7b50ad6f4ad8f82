//! Power-up and commissioning visuals per board.

use crate::mock_hw::{Harness, LightCall};
use lightnode::app::events::AppEvent;
use lightnode::app::ports::LightAttribute;
use lightnode::config::{BoardVariant, COLOUR_COMMISSIONED, COLOUR_UNPROVISIONED};
use lightnode::events::Event;

fn colour((l, h, s): (u8, u8, u8)) -> LightCall {
    LightCall::Color(l, h, s)
}

#[test]
fn devkit_turns_light_on_at_start() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.step(Event::Started);

    assert_eq!(h.stack().attr(LightAttribute::OnOff), 1);
    assert_eq!(h.stack().attr(LightAttribute::CurrentLevel), 254);
    assert_eq!(h.sink()[0], AppEvent::Started { unprovisioned: true });

    // The writes come back as attribute-change events.
    h.drain();
    assert_eq!(h.hw().light.last(), Some(&LightCall::Level(254)));
    assert!(h.sink().iter().any(|e| matches!(
        e,
        AppEvent::LightingApplied {
            on: true,
            level: 254,
            ..
        }
    )));
}

#[test]
fn devkit_reapplies_on_every_started_but_reports_once() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.step(Event::Started);
    h.drain();
    h.stack_mut().attributes.insert(LightAttribute::OnOff, 0);

    h.step(Event::Started);
    assert_eq!(h.stack().attr(LightAttribute::OnOff), 1);
    assert_eq!(
        h.recorded().count(|e| matches!(e, AppEvent::Started { .. })),
        1
    );
}

#[test]
fn unprovisioned_bulb_flashes_then_stays_off() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.step(Event::Started);

    assert_eq!(h.hw().light.first(), Some(&colour(COLOUR_UNPROVISIONED)));
    assert_eq!(h.hw().delays_ms, vec![500]);
    assert_eq!(h.stack().attr(LightAttribute::OnOff), 0);
    assert!(h.sink().contains(&AppEvent::Started { unprovisioned: true }));

    h.drain();
    assert_eq!(h.hw().light.last(), Some(&LightCall::Level(0)));
}

#[test]
fn provisioned_bulb_comes_on_without_flash() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.stack_mut().thread_provisioned = true;
    h.stack_mut().thread_enabled = true;
    h.step(Event::Started);

    assert!(h.hw().delays_ms.is_empty());
    assert_eq!(h.stack().attr(LightAttribute::OnOff), 1);
    assert!(h.sink().contains(&AppEvent::Started {
        unprovisioned: false
    }));
}

#[test]
fn wifi_credentials_count_as_provisioned() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.stack_mut().wifi_provisioned = true;
    h.stack_mut().thread_provisioned = true; // not enabled
    h.step(Event::Started);
    assert!(h.sink().contains(&AppEvent::Started {
        unprovisioned: false
    }));
}

#[test]
fn power_up_visual_runs_once() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.step(Event::Started);
    h.drain();
    let flashes = h.hw().delays_ms.len();

    h.step(Event::Started);
    h.drain();
    assert_eq!(h.hw().delays_ms.len(), flashes);
}

#[test]
fn commissioning_flashes_once_and_leaves_light_off() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.step(Event::Started);
    h.drain();
    let before = h.hw().light.len();

    h.step(Event::Provisioned);
    assert_eq!(h.hw().light[before], colour(COLOUR_COMMISSIONED));
    assert_eq!(h.hw().delays_ms, vec![500, 500]);
    assert_eq!(h.stack().attr(LightAttribute::OnOff), 0);
    h.drain();

    let after = h.hw().light.len();
    h.step(Event::Provisioned);
    h.drain();
    assert_eq!(h.hw().delays_ms.len(), 2);
    assert!(
        !h.hw().light[after..].contains(&colour(COLOUR_COMMISSIONED)),
        "second Provisioned must not flash"
    );
}

#[test]
fn provisioned_at_boot_never_shows_commissioning_flash() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.stack_mut().thread_provisioned = true;
    h.stack_mut().thread_enabled = true;
    h.step(Event::Started);
    h.step(Event::Provisioned);
    assert!(h.hw().delays_ms.is_empty());
    assert!(!h.hw().light.contains(&colour(COLOUR_COMMISSIONED)));
}

#[test]
fn devkit_system_events_turn_light_on() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.step(Event::BleAdvertising);
    assert_eq!(h.stack().attr(LightAttribute::OnOff), 1);
}

#[test]
fn stack_is_only_touched_under_lock() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.step(Event::Started);
    h.drain();
    h.step(Event::Provisioned);
    h.step(Event::FactoryReset);
    h.drain();

    assert!(!h.stack().accessed_unlocked.get());
    assert_eq!(h.stack().lock_depth.get(), 0);
}
