#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # irqflow core
//!
//! Types shared by every layer of the interrupt-to-task event pipeline:
//! the tagged [`TaskMessage`] carried by the event channel, task
//! priorities and their two startup tiers, tick-based time, and the
//! [`Waitable`] seam the scheduler uses to decide when a blocked task may
//! run again.

use core::fmt;

pub mod events;
pub mod priorities;
pub mod time;
pub mod wait;

pub use events::*;
pub use priorities::*;
pub use time::*;
pub use wait::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used by the core types
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building core values from raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Priority 0 is reserved for the idle task
    InvalidPriority,
    /// Raw event discriminant does not name a known [`EventKind`]
    UnknownEvent(u32),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidPriority => write!(f, "Invalid task priority"),
            CoreError::UnknownEvent(raw) => write!(f, "Unknown event kind {raw}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

#[cfg(feature = "defmt")]
impl defmt::Format for CoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            CoreError::InvalidPriority => defmt::write!(fmt, "InvalidPriority"),
            CoreError::UnknownEvent(raw) => defmt::write!(fmt, "UnknownEvent({})", raw),
        }
    }
}
