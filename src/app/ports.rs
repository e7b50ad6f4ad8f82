//! Port traits: the boundary between the application task and the outside world.
//!
//! ```text
//!   Adapter / driver ──▶ Port trait ──▶ AppTask (domain)
//! ```
//!
//! The protocol stack, persisted store, light output, status LED, blink
//! timer, reset button and clock all live behind these traits.  The
//! [`AppTask`](super::task::AppTask) consumes them via generics, so the
//! event loop, reboot guard and indicator run unchanged on the host.

use crate::config::NodeConfig;

// ───────────────────────────────────────────────────────────────
// Storage port (persisted key-value blobs)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage (NVS on device).
///
/// Keys are namespaced.  Writes are atomic: a power loss leaves either the
/// old or the new value.  A missing or short value is never an error for
/// callers that have a default.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`NodeConfig`].
///
/// Implementations validate before persisting and reject out-of-range
/// values with [`ConfigError::ValidationFailed`] instead of clamping them.
pub trait ConfigPort {
    /// Load configuration.  Returns [`NodeConfig::default()`] when nothing
    /// is stored.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Protocol stack port
// ───────────────────────────────────────────────────────────────

/// Light cluster attributes the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightAttribute {
    /// On/off cluster, `OnOff` (0 or 1).
    OnOff,
    /// Level control cluster, `CurrentLevel` (0–254).
    CurrentLevel,
    /// Color control cluster, `CurrentHue` (0–254).
    CurrentHue,
    /// Color control cluster, `CurrentSaturation` (0–254).
    CurrentSaturation,
}

/// Endpoint + attribute address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub endpoint: u16,
    pub attribute: LightAttribute,
}

impl AttributePath {
    pub const fn new(endpoint: u16, attribute: LightAttribute) -> Self {
        Self {
            endpoint,
            attribute,
        }
    }
}

/// Accessors into the commissioning / protocol stack.
///
/// Every call must be made while the stack lock is held; use
/// [`StackLock`] rather than calling these on a bare [`StackPort`].
pub trait StackAccess {
    /// Thread network credentials are present.
    fn is_thread_provisioned(&self) -> bool;
    /// The Thread interface is enabled.
    fn is_thread_enabled(&self) -> bool;
    /// The Thread interface is attached to a partition.
    fn is_thread_attached(&self) -> bool;
    /// Wi-Fi station credentials are present.
    fn is_wifi_provisioned(&self) -> bool;
    /// Number of BLE centrals currently connected.
    fn num_ble_connections(&self) -> u16;

    fn read_attribute(&self, path: AttributePath) -> Result<u8, StackError>;
    fn write_attribute(&mut self, path: AttributePath, value: u8) -> Result<(), StackError>;

    /// Erase fabrics / credentials and reboot.  Repeated calls are harmless.
    fn initiate_factory_reset(&mut self);
}

/// The stack plus its global lock.
pub trait StackPort: StackAccess {
    /// Block until the stack lock is held by the caller.
    fn lock(&self);
    /// Release the lock taken by [`lock`](Self::lock).
    fn unlock(&self);
}

/// RAII guard: stack lock held for the guard's lifetime.
///
/// Dereferences to the underlying stack so accessor calls read naturally:
///
/// ```ignore
/// let on = StackLock::new(&mut stack).read_attribute(path)?;
/// ```
pub struct StackLock<'a, S: StackPort + ?Sized> {
    stack: &'a mut S,
}

impl<'a, S: StackPort + ?Sized> StackLock<'a, S> {
    pub fn new(stack: &'a mut S) -> Self {
        stack.lock();
        Self { stack }
    }
}

impl<S: StackPort + ?Sized> core::ops::Deref for StackLock<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.stack
    }
}

impl<S: StackPort + ?Sized> core::ops::DerefMut for StackLock<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.stack
    }
}

impl<S: StackPort + ?Sized> Drop for StackLock<'_, S> {
    fn drop(&mut self) {
        self.stack.unlock();
    }
}

// ───────────────────────────────────────────────────────────────
// Output ports
// ───────────────────────────────────────────────────────────────

/// The node's main light.
pub trait LightPort {
    /// Drive brightness only (0 = off).
    fn set_level(&mut self, level: u8);
    /// Drive brightness, hue and saturation (each 0–254).
    fn set_color(&mut self, level: u8, hue: u8, saturation: u8);
}

/// Single-colour status LED.
pub trait StatusIndicator {
    fn set_on(&mut self, on: bool);
    fn is_on(&self) -> bool;

    fn toggle(&mut self) {
        let on = self.is_on();
        self.set_on(!on);
    }
}

/// Re-armable one-shot blink timer.  Expiry posts [`Event::Timer`].
///
/// [`Event::Timer`]: crate::events::Event::Timer
pub trait BlinkTimerPort {
    /// (Re)start the timer; an already running period is discarded.
    fn start(&mut self, period_ms: u32);
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Input ports
// ───────────────────────────────────────────────────────────────

/// Reset button level.
pub trait ButtonInput {
    /// `true` while the button is held down.
    fn is_pressed(&mut self) -> bool;
}

/// Monotonic millisecond clock.
pub trait TimePort {
    fn now_ms(&self) -> u64;
}

/// Everything the application task drives on the board, plus the bounded
/// delay used to hold flash colours.  Implemented automatically for any
/// type providing all the individual ports.
pub trait Hardware:
    LightPort + StatusIndicator + BlinkTimerPort + ButtonInput + TimePort + embedded_hal::delay::DelayNs
{
}

impl<T> Hardware for T where
    T: LightPort + StatusIndicator + BlinkTimerPort + ButtonInput + TimePort + embedded_hal::delay::DelayNs
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`StackAccess`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Attribute read returned a failure status.
    AttributeRead,
    /// Attribute write returned a failure status.
    AttributeWrite,
    /// No such endpoint / attribute.
    UnknownAttribute,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AttributeRead => write!(f, "attribute read failed"),
            Self::AttributeWrite => write!(f, "attribute write failed"),
            Self::UnknownAttribute => write!(f, "unknown attribute"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::IoError => Self::IoError,
        }
    }
}
