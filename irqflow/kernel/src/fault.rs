//! Terminal fault hooks.
//!
//! Allocation failure, stack overflow and a failed bootstrap are
//! unrecoverable. The hooks log, emit a trace record, mark the kernel
//! halted, and hand control to the kernel's [`HaltStrategy`], which never
//! returns.

use core::fmt;

use crate::kernel::{Kernel, KernelError};
use crate::task::TaskHandle;

/// An unrecoverable kernel condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Task or queue creation exceeded the heap budget
    AllocationFailed { requested: usize, available: usize },
    /// A task reported more stack use than it declared
    StackOverflow {
        task: TaskHandle,
        name: &'static str,
        used: usize,
        size: usize,
    },
    /// The task set could not be created before the scheduler started
    Bootstrap(KernelError),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::AllocationFailed {
                requested,
                available,
            } => write!(
                f,
                "allocation failed: requested {requested} bytes, {available} available"
            ),
            Fault::StackOverflow {
                task,
                name,
                used,
                size,
            } => write!(
                f,
                "stack overflow in task {name} ({task}): {used} of {size} bytes"
            ),
            Fault::Bootstrap(err) => write!(f, "bootstrap failed: {err}"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Fault {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Fault::AllocationFailed {
                requested,
                available,
            } => defmt::write!(fmt, "AllocationFailed({}/{})", requested, available),
            Fault::StackOverflow { task, name, .. } => {
                defmt::write!(fmt, "StackOverflow({}, {})", task, name)
            }
            Fault::Bootstrap(err) => defmt::write!(fmt, "Bootstrap({})", err),
        }
    }
}

/// Final action once a fault has been recorded.
pub trait HaltStrategy: Send + Sync {
    fn halt(&self, fault: &Fault) -> !;
}

/// Spin forever, breaking into an attached debugger first on stack
/// overflow (ARM only).
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinHalt;

impl HaltStrategy for SpinHalt {
    fn halt(&self, fault: &Fault) -> ! {
        #[cfg(target_arch = "arm")]
        if matches!(fault, Fault::StackOverflow { .. }) {
            cortex_m::asm::bkpt();
        }
        #[cfg(not(target_arch = "arm"))]
        let _ = fault;
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Allocation-failure hook.
pub fn on_allocation_failure(kernel: &Kernel, requested: usize) -> ! {
    let available = kernel.heap_available();
    kernel.fault(Fault::AllocationFailed {
        requested,
        available,
    })
}

/// Stack-overflow hook.
pub fn on_stack_overflow(kernel: &Kernel, task: TaskHandle, used: usize) -> ! {
    let (name, size) = kernel
        .descriptor(task)
        .map(|config| (config.name, config.stack_bytes()))
        .unwrap_or(("?", 0));
    kernel.fault(Fault::StackOverflow {
        task,
        name,
        used,
        size,
    })
}
