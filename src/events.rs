//! Interrupt-safe event bit channel.
//!
//! Events are produced by:
//! - GPIO ISRs (reset button falling edge)
//! - Timer callbacks (indicator blink timer expiry)
//! - Protocol-stack callbacks (BLE / Thread / Wi-Fi state changes)
//! - Software (attribute writes, reboot guard, button window resolution)
//!
//! Events are consumed by the application task, which takes the whole
//! pending mask at once and dispatches it in a fixed priority order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button ISR  │────▶│              │     │              │
//! │ Timer cb    │────▶│ EventChannel │────▶│   AppTask    │
//! │ Stack cb    │────▶│ (AtomicU32)  │     │  (consumer)  │
//! │ Software    │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The channel is a bit-set, not a queue: posting the same event twice
//! before the consumer wakes delivers it once.  Posting never blocks and
//! never loses a bit set by another producer (`fetch_or`).
//!
//! ## Interrupt producers
//!
//! Waking the consumer goes through a critical section and the waker of
//! the executor, neither of which may run in an ISR.  Interrupt handlers
//! call [`EventChannel::post_from_isr`], which only sets the bit, and
//! hand the wake to a task (see `drivers::hw_init`) that calls
//! [`EventChannel::wake`].
//!
//! ## Memory ordering
//!
//! `post` publishes with `Release`; `take` swaps the mask out with
//! `AcqRel`.  Anything a producer wrote before posting is visible to the
//! consumer once it observes the bit.  A bit posted while the consumer is
//! dispatching stays in the mask and is returned by the next wait.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};

/// Application events.  Each variant owns one bit of the pending mask.
///
/// Discriminant order is the dispatch priority used by the app task:
/// lifecycle first, then lighting, then the timer tick, then system events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    // ── Lifecycle ─────────────────────────────────────────
    /// Stack initialised, application may apply start-up defaults.
    Started = 0,

    // ── Lighting (attribute changes) ──────────────────────
    /// Generic lighting change (re-read every attribute).
    LightingChanged = 1,
    /// On/off attribute written.
    OnOff = 2,
    /// Current level attribute written.
    Level = 3,
    /// Hue or saturation attribute written.
    Color = 4,

    // ── Timer ─────────────────────────────────────────────
    /// Indicator blink timer expired.
    Timer = 8,

    // ── System ────────────────────────────────────────────
    /// Factory reset requested (reboot guard or long press).
    FactoryReset = 16,
    /// A BLE central is connected for commissioning.
    BleConnected = 17,
    /// BLE advertising, no central connected.
    BleAdvertising = 18,
    /// Network credentials present and the node has joined.
    Provisioned = 19,
    /// Reset button pressed; confirm window armed.
    ButtonPress = 20,
    /// Reset button released before the confirm window elapsed.
    ButtonCancel = 21,
}

impl Event {
    /// Every event in dispatch priority order.
    pub const ALL: [Event; 12] = [
        Event::Started,
        Event::LightingChanged,
        Event::OnOff,
        Event::Level,
        Event::Color,
        Event::Timer,
        Event::FactoryReset,
        Event::BleConnected,
        Event::BleAdvertising,
        Event::Provisioned,
        Event::ButtonPress,
        Event::ButtonCancel,
    ];

    /// The single bit this event occupies in an [`EventMask`].
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// Set of pending events.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventMask(u32);

impl EventMask {
    /// No events.
    pub const EMPTY: Self = Self(0);

    /// Lighting attribute events.
    pub const LIGHTING: Self = Self(
        Event::LightingChanged.bit() | Event::OnOff.bit() | Event::Level.bit() | Event::Color.bit(),
    );

    /// System events (reset, connectivity, button).
    pub const SYSTEM: Self = Self(
        Event::FactoryReset.bit()
            | Event::BleConnected.bit()
            | Event::BleAdvertising.bit()
            | Event::Provisioned.bit()
            | Event::ButtonPress.bit()
            | Event::ButtonCancel.bit(),
    );

    /// Every defined event bit.
    pub const ALL: Self = Self(
        Event::Started.bit() | Self::LIGHTING.0 | Event::Timer.bit() | Self::SYSTEM.0,
    );

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, event: Event) -> bool {
        self.0 & event.bit() != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn insert(&mut self, event: Event) {
        self.0 |= event.bit();
    }

    pub fn remove(&mut self, event: Event) {
        self.0 &= !event.bit();
    }

    /// Iterate the set events in dispatch priority order.
    pub fn iter(self) -> impl Iterator<Item = Event> {
        Event::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl From<Event> for EventMask {
    fn from(event: Event) -> Self {
        Self(event.bit())
    }
}

impl core::ops::BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOr<Event> for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Event) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl FromIterator<Event> for EventMask {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for event in iter {
            mask.insert(event);
        }
        mask
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ── Channel ───────────────────────────────────────────────────

/// Multi-producer / single-consumer event bit channel.
///
/// `post` is for task context: it is one atomic RMW plus a
/// critical-section guarded signal.  ISRs use
/// [`post_from_isr`](Self::post_from_isr).  Only the application task may
/// call [`wait_next`](Self::wait_next) or [`take`](Self::take).
pub struct EventChannel {
    pending: AtomicU32,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            wake: Signal::new(),
        }
    }

    /// Set `event` in the pending mask and wake the consumer.
    /// Never waits on the consumer.  Task context only.
    pub fn post(&self, event: Event) {
        self.post_mask(event.into());
    }

    /// Set `event` in the pending mask without waking anyone.
    ///
    /// Lock-free, so safe in an ISR.  Returns `true` on the empty to
    /// non-empty edge; the caller must then get [`wake`](Self::wake) run
    /// from task context, otherwise the bit waits for the next post.
    pub fn post_from_isr(&self, event: Event) -> bool {
        self.pending.fetch_or(event.bit(), Ordering::Release) == 0
    }

    /// Wake the consumer for bits set by [`post_from_isr`](Self::post_from_isr).
    /// Task context only.
    pub fn wake(&self) {
        self.wake.signal(());
    }

    /// Set every bit of `mask` in one atomic step.
    pub fn post_mask(&self, mask: EventMask) {
        if mask.is_empty() {
            return;
        }
        let prev = self.pending.fetch_or(mask.bits(), Ordering::Release);
        // Only the empty -> non-empty edge changes consumer readiness.
        if prev == 0 {
            self.wake.signal(());
        }
    }

    /// Take and clear the pending mask without waiting.
    pub fn take(&self) -> EventMask {
        EventMask::from_bits(self.pending.swap(0, Ordering::AcqRel))
    }

    /// Peek at the pending mask (diagnostics only).
    pub fn pending(&self) -> EventMask {
        EventMask::from_bits(self.pending.load(Ordering::Acquire))
    }

    /// Wait until at least one event is pending, then return and clear
    /// the whole mask.  `None` waits forever.  On timeout the returned
    /// mask is empty.
    pub async fn wait_next(&self, timeout: Option<Duration>) -> EventMask {
        match timeout {
            None => self.wait_any().await,
            Some(limit) => with_timeout(limit, self.wait_any()).await.unwrap_or(EventMask::EMPTY),
        }
    }

    async fn wait_any(&self) -> EventMask {
        loop {
            let mask = self.take();
            if !mask.is_empty() {
                // A wake latched by bits we just consumed is stale.
                self.wake.reset();
                // Bits posted between the swap and the reset re-check below.
                let late = self.take();
                return mask | late;
            }
            self.wake.wait().await;
        }
    }
}

/// Process-wide channel feeding the application task.
pub static APP_EVENTS: EventChannel = EventChannel::new();

/// Post into [`APP_EVENTS`] from task context (timer and stack callbacks).
pub fn post_event(event: Event) {
    APP_EVENTS.post(event);
}
