#![cfg_attr(not(feature = "std"), no_std)]

//! # irqflow kernel
//!
//! A small priority scheduler for a fixed set of statically created
//! tasks. Tasks are step functions: each dispatch runs one step, which
//! either continues, blocks on a [`Waitable`](irqflow_core::Waitable)
//! with an optional deadline, or terminates. When nothing is ready the
//! kernel runs its idle path, which drives the [`IdleHooks`] sleep/wake
//! pair.
//!
//! Memory for tasks and queues is accounted against a fixed heap budget;
//! running out, or a task reporting more stack than it declared, diverts
//! to the fault hooks in [`fault`], which never return.

extern crate alloc;

pub mod config;
pub mod fault;
pub mod idle;
pub mod kernel;
pub mod primitives;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod trace;

pub use config::{KernelConfig, KernelConfigBuilder};
pub use fault::{on_allocation_failure, on_stack_overflow, Fault, HaltStrategy, SpinHalt};
pub use idle::{IdleHooks, IdlePort, NoIdleHooks, WfiPort};
pub use kernel::{Kernel, KernelBuilder, KernelError, KernelResult};
pub use primitives::StartupBarrier;
pub use task::{
    RecvError, Task, TaskAction, TaskConfig, TaskContext, TaskHandle, TaskState,
};
pub use trace::{records, TraceError, TraceHook, TraceResult};
