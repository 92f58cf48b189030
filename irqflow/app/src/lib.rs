#![cfg_attr(not(feature = "std"), no_std)]

//! # irqflow firmware core
//!
//! Hardware interrupts become typed messages for a single application
//! task:
//!
//! 1. [`Interrupts::gpio_isr`] snapshots and clears the GPIO status bits
//!    and runs the registered handler of each.
//! 2. The button handler runs the [`debounce`] filter with a busy-wait
//!    delay and, on a confirmed press, sends `BUTTON` into the channel
//!    without blocking.
//! 3. [`ApplicationTask`] blocks on the channel and reacts.
//!
//! The idle path of the kernel runs [`PowerHooks`]: deep sleep with the
//! indicator LED off, then indicator on and a `WAKE` message.
//!
//! [`system_setup`] initializes the board in a fixed order;
//! [`System::system_start`] creates the service, console and application
//! tasks and starts the scheduler.

extern crate alloc;

pub mod application;
pub mod bootstrap;
pub mod button;
pub mod config;
pub mod console;
pub mod debounce;
pub mod handlers;
pub mod isr;
pub mod power;
pub mod services;

use irqflow_queue::{EventChannel, APPLICATION_QUEUE_CAPACITY};

pub use application::{AppStats, ApplicationTask};
pub use bootstrap::{system_setup, System, TaskHandles};
pub use button::ButtonHandler;
pub use config::{AppConfig, AppConfigBuilder, DebounceConfig};
pub use console::{CommandRegistry, ConsoleError, ConsoleResult, ConsoleTask, Transport};
pub use debounce::{debounce, DebounceOutcome, LevelSource};
pub use handlers::HandlerTable;
pub use isr::Interrupts;
pub use power::PowerHooks;
pub use services::{GpioService, IomService};

/// The application task's event channel
pub type AppChannel = EventChannel<APPLICATION_QUEUE_CAPACITY>;
