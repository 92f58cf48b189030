#![no_std]
#![forbid(unsafe_code)]

//! # irqflow queue
//!
//! The event channel connecting interrupt producers to the single
//! application task: a fixed-capacity FIFO of [`TaskMessage`] values.
//!
//! Interrupt handlers use [`EventChannel::send_from_interrupt`], which
//! never blocks and drops the message when the channel is full. The
//! consuming task drains it with [`EventChannel::try_receive`]; blocking
//! with a timeout is layered on top by the scheduler through the
//! [`Waitable`](irqflow_core::Waitable) implementation.

pub mod channel;

pub use channel::*;
pub use irqflow_core::{EventKind, TaskMessage};

/// Capacity of the application task's channel
pub const APPLICATION_QUEUE_CAPACITY: usize = 8;
