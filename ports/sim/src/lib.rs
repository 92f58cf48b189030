//! Host simulation of the irqflow firmware.
//!
//! [`SimBoard`] stands in for the microcontroller: it records every
//! initialization and output call, answers input reads from per-pin
//! scripts and keeps interrupt pending/enable registers. [`Simulator`]
//! wires it to the firmware, then replays a [`Scenario`] of button
//! presses, timer interrupts and console lines through the real ISRs
//! and scheduler.

pub mod board;
pub mod error;
pub mod scenario;
pub mod simulator;
pub mod trace;
pub mod transport;

pub use board::{BoardOp, SimBoard, SimDelay};
pub use error::SimError;
pub use scenario::{Scenario, ScheduledEvent, SimEvent};
pub use simulator::{SimHardware, SimPort, SimReport, Simulator};
pub use trace::{log_trace_hook, record_name, ExitHalt};
pub use transport::SimTransport;

/// Scenario replayed when none is given
pub const DEMO_SCENARIO: &str =
    "cmd@5:help, press@50, bounce@80, cmd@100:gpio read 16, timer@120, press@200, cmd@250:iom status";
