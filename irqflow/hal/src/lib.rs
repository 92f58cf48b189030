//! Board abstraction for the irqflow firmware core
//!
//! Every call here is synchronous, non-blocking and infallible: register
//! writes are assumed to succeed. Methods take `&self` because the same
//! board is shared between interrupt handlers, idle hooks and tasks; an
//! implementation owns whatever interior mutability its registers need.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

pub mod delay;
pub mod gpio;
pub mod interrupt;
pub mod iom;
pub mod led;
pub mod power;
pub mod system;

pub use delay::{DelayNs, DelaySource};
pub use gpio::{ButtonArray, Gpio, Level, PinMode};
pub use interrupt::{pin_mask, InterruptController, InterruptStatus, IrqLine, IrqMask};
pub use iom::{IoMaster, IomStats};
pub use led::LedArray;
pub use power::Power;
pub use system::SystemInit;

/// Everything the firmware core needs from a board.
pub trait Board:
    SystemInit
    + Power
    + Gpio
    + ButtonArray
    + LedArray
    + InterruptStatus
    + InterruptController
    + IoMaster
    + DelaySource
    + Send
    + Sync
    + 'static
{
}

impl<T> Board for T where
    T: SystemInit
        + Power
        + Gpio
        + ButtonArray
        + LedArray
        + InterruptStatus
        + InterruptController
        + IoMaster
        + DelaySource
        + Send
        + Sync
        + 'static
{
}
