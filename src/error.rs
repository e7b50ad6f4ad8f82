//! Unified error types for the lightnode firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! application task's error handling uniform.  All variants are `Copy`.
//!
//! Most failures in the core are *not* propagated: a failed attribute read
//! skips one lighting update, a missing reboot counter means "full budget".
//! Only [`SetupError`] is fatal.

use core::fmt;

use crate::app::ports::{ConfigError, StackError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Start-up resource creation failed.  The node cannot run.
    Setup(SetupError),
    /// The persisted key-value store failed.
    Storage(StorageError),
    /// A protocol-stack accessor returned a failure status.
    Stack(StackError),
    /// Node configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "setup: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Stack(e) => write!(f, "stack: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<SetupError> for Error {
    fn from(e: SetupError) -> Self {
        Self::Setup(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<StackError> for Error {
    fn from(e: StackError) -> Self {
        Self::Stack(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Setup errors
// ---------------------------------------------------------------------------

/// Fatal start-up failures.  The device logs and halts on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// Application task could not be created.
    TaskCreateFailed,
    /// Blink timer could not be created (carries the platform rc).
    TimerCreateFailed(i32),
    /// GPIO / ISR configuration failed (carries the platform rc).
    GpioConfigFailed(i32),
    /// LEDC (PWM) configuration failed.
    PwmConfigFailed(i32),
    /// Non-volatile storage could not be initialised.
    StorageInitFailed,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskCreateFailed => write!(f, "app task creation failed"),
            Self::TimerCreateFailed(rc) => write!(f, "timer creation failed (rc={rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::PwmConfigFailed(rc) => write!(f, "PWM config failed (rc={rc})"),
            Self::StorageInitFailed => write!(f, "NVS init failed"),
        }
    }
}

impl core::error::Error for SetupError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
