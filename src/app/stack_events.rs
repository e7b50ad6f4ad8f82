//! Protocol-stack notifications → application events.
//!
//! Runs in the stack's own context with the stack lock already taken by
//! the caller (`SharedStack::notify`), so the accessors are called
//! directly.

use log::info;

use crate::app::ports::{LightAttribute, StackAccess};
use crate::events::{Event, EventChannel};

/// Notifications the stack delivers to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    /// BLE advertising started/stopped or a central (dis)connected.
    BleAdvertisingChange,
    /// Thread role / provisioning changed.
    ThreadStateChange,
    /// Wi-Fi station connectivity changed.
    WifiConnectivityChange,
    /// Anything else; ignored.
    Other,
}

/// Map a notification onto the application event it implies, if any.
pub fn translate<K: StackAccess + ?Sized>(event: StackEvent, stack: &K) -> Option<Event> {
    match event {
        StackEvent::BleAdvertisingChange => {
            let conns = stack.num_ble_connections();
            info!("stack: BLE advertising change, connections={}", conns);
            Some(if conns > 0 {
                Event::BleConnected
            } else {
                Event::BleAdvertising
            })
        }
        StackEvent::ThreadStateChange => {
            let provisioned = stack.is_thread_provisioned();
            let enabled = stack.is_thread_enabled();
            info!(
                "stack: Thread state, provisioned={} enabled={} attached={}",
                provisioned,
                enabled,
                stack.is_thread_attached()
            );
            (provisioned && enabled).then_some(Event::Provisioned)
        }
        StackEvent::WifiConnectivityChange => Some(Event::Provisioned),
        StackEvent::Other => None,
    }
}

/// Translate and post.
pub fn on_stack_event<K: StackAccess + ?Sized>(event: StackEvent, stack: &K, events: &EventChannel) {
    if let Some(e) = translate(event, stack) {
        events.post(e);
    }
}

/// Lighting event posted when a light attribute changes.
pub const fn lighting_event(attribute: LightAttribute) -> Event {
    match attribute {
        LightAttribute::OnOff => Event::OnOff,
        LightAttribute::CurrentLevel => Event::Level,
        LightAttribute::CurrentHue | LightAttribute::CurrentSaturation => Event::Color,
    }
}
