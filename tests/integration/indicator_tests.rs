//! Status LED blink selection and timer re-arming.

use crate::mock_hw::Harness;
use lightnode::app::events::AppEvent;
use lightnode::config::{BoardVariant, NodeConfig};
use lightnode::events::Event;
use lightnode::indicator::IndicatorMode;

#[test]
fn provisioned_blinks_800_on_200_off() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.step(Event::Provisioned);

    assert_eq!(h.task.indicator().mode(), IndicatorMode::Provisioned);
    // LED starts off, so the first period is the off half.
    assert_eq!(h.hw().timer, Some(200));

    h.fire_timer();
    assert!(h.hw().led_on);
    assert_eq!(h.hw().timer, Some(800));

    h.fire_timer();
    assert!(!h.hw().led_on);
    assert_eq!(h.hw().timer, Some(200));
}

#[test]
fn mode_change_rearms_with_half_matching_led_level() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.step(Event::Provisioned);
    h.fire_timer();
    assert!(h.hw().led_on);

    // Advertising is 200 on / 800 off; the LED is on, so 200.
    h.step(Event::BleAdvertising);
    assert_eq!(h.hw().timer, Some(200));
    assert!(h.sink().contains(&AppEvent::IndicatorChanged {
        mode: IndicatorMode::BleAdvertising,
        on_ms: 200,
        off_ms: 800
    }));
}

#[test]
fn unchanged_mode_does_not_rearm() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.step(Event::BleConnected);
    let starts = h.hw().timer_starts.len();
    h.step(Event::BleConnected);
    assert_eq!(h.hw().timer_starts.len(), starts);
}

#[test]
fn zero_half_holds_led_static() {
    let mut config = NodeConfig::for_variant(BoardVariant::Hub);
    config.indicator.provisioned = (500, 0);
    let mut h = Harness::with_config(config, Default::default());

    h.step(Event::Provisioned);

    assert!(h.hw().led_on);
    assert_eq!(h.hw().timer, None);
}

#[test]
fn stale_tick_with_static_pair_is_ignored() {
    let mut h = Harness::new(BoardVariant::Hub);
    h.step(Event::Timer);
    assert!(!h.hw().led_on);
    assert_eq!(h.hw().timer, None);
    assert_eq!(h.hw().led_writes, 0);
}

#[test]
fn bulb_has_no_indicator() {
    let mut h = Harness::new(BoardVariant::Bulb);
    h.step(Event::Provisioned);
    assert_eq!(h.task.indicator().mode(), IndicatorMode::Off);
    assert!(h.hw().timer_starts.is_empty());
}

#[test]
fn devkit_blinks_the_status_led() {
    let mut h = Harness::new(BoardVariant::DevKit);
    h.step(Event::BleConnected);
    assert_eq!(h.hw().timer, Some(200));
    assert!(!h.hw().led_on);

    h.fire_timer();
    assert!(h.hw().led_on);
    assert_eq!(h.hw().led_writes, 1);
    assert_eq!(h.hw().timer, Some(200));

    h.fire_timer();
    assert!(!h.hw().led_on);
    assert_eq!(h.hw().led_writes, 2);
}
