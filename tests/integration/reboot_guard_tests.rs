//! Repeated-reboot factory reset through the application task.

use crate::mock_hw::{Harness, LightCall, MockNvs};
use lightnode::app::events::AppEvent;
use lightnode::config::{BoardVariant, COLOUR_FACTORY_RESET, NodeConfig};
use lightnode::events::Event;
use lightnode::reboot_guard::{COUNTER_KEY, COUNTER_NAMESPACE};

fn boot(store: &MockNvs) -> Harness {
    let mut h = Harness::with_config(NodeConfig::for_variant(BoardVariant::Bulb), store.clone());
    h.step(Event::Started);
    h
}

fn stored_counter(store: &MockNvs) -> u32 {
    let raw = store
        .raw(COUNTER_NAMESPACE, COUNTER_KEY)
        .expect("counter written");
    u32::from_le_bytes(raw[..4].try_into().unwrap())
}

#[test]
fn first_boot_opens_window_and_decrements() {
    let store = MockNvs::new();
    let mut h = Harness::with_config(NodeConfig::for_variant(BoardVariant::Bulb), store.clone());

    let timeout = h.step(Event::Started);

    assert_eq!(timeout, Some(3000));
    assert_eq!(stored_counter(&store), 2);
    assert_eq!(
        h.sink()[0],
        AppEvent::RebootCounted {
            remaining: 2,
            window_ms: 3000
        }
    );
}

#[test]
fn third_quick_reboot_requests_factory_reset() {
    let store = MockNvs::new();

    let _first = boot(&store);
    assert_eq!(stored_counter(&store), 2);
    let _second = boot(&store);
    assert_eq!(stored_counter(&store), 1);

    let mut third = boot(&store);
    // Counter restored before the reset is even dispatched.
    assert_eq!(stored_counter(&store), 3);
    assert!(third.events.pending().contains(Event::FactoryReset));
    assert!(!third.sink().iter().any(|e| matches!(e, AppEvent::Started { .. })));

    third.drain();

    assert_eq!(third.stack().factory_resets, 1);
    assert!(third.sink().contains(&AppEvent::FactoryResetRequested));
    let (l, hue, s) = COLOUR_FACTORY_RESET;
    assert_eq!(third.hw().light.first(), Some(&LightCall::Color(l, hue, s)));
    assert_eq!(third.hw().delays_ms, vec![500]);
}

#[test]
fn window_expiry_restores_budget() {
    let store = MockNvs::new();
    let mut h = boot(&store);
    h.drain();

    h.hw_mut().advance(1000);
    assert_eq!(h.step(lightnode::events::EventMask::EMPTY), Some(2000));
    assert_eq!(stored_counter(&store), 2);

    h.hw_mut().advance(2000);
    assert_eq!(h.step(lightnode::events::EventMask::EMPTY), None);
    assert_eq!(stored_counter(&store), 3);
    assert!(h.sink().contains(&AppEvent::RebootWindowClosed));
    assert!(!h.task.reboot_guard().is_armed());

    // Next boot starts over from the full budget.
    let _next = boot(&store);
    assert_eq!(stored_counter(&store), 2);
}

#[test]
fn stored_zero_counter_resets_on_boot() {
    let store = MockNvs::new();
    {
        use lightnode::app::ports::StoragePort;
        let mut s = store.clone();
        s.write(COUNTER_NAMESPACE, COUNTER_KEY, &0u32.to_le_bytes()).unwrap();
    }
    let mut h = boot(&store);
    assert!(h.events.pending().contains(Event::FactoryReset));
    assert_eq!(stored_counter(&store), 3);
    h.drain();
    assert_eq!(h.stack().factory_resets, 1);
}

#[test]
fn garbage_counter_reads_as_full_budget() {
    let store = MockNvs::new();
    {
        use lightnode::app::ports::StoragePort;
        let mut s = store.clone();
        s.write(COUNTER_NAMESPACE, COUNTER_KEY, &[0xFF, 0xFF]).unwrap();
    }
    let h = boot(&store);
    assert_eq!(stored_counter(&store), 2);
    assert!(h.task.reboot_guard().is_armed());
}

#[test]
fn boards_without_guard_never_touch_counter() {
    let store = MockNvs::new();
    let mut h = Harness::with_config(NodeConfig::for_variant(BoardVariant::DevKit), store.clone());
    assert_eq!(h.step(Event::Started), None);
    assert!(store.raw(COUNTER_NAMESPACE, COUNTER_KEY).is_none());
}
