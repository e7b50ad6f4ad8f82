//! Application core: the event loop and the logic it dispatches to.
//!
//! Everything here talks to the board and the protocol stack through the
//! **port traits** in [`ports`], so the whole loop runs on the host with
//! mock peripherals.

pub mod events;
pub mod lighting;
pub mod ports;
pub mod stack_events;
pub mod task;
