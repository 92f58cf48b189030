//! Structured trace records emitted by the kernel.
//!
//! A trace hook receives `(record_id, payload, with_timestamp)` for every
//! scheduler, idle and fault transition. Record ids are listed in
//! [`records`].

use core::fmt;

use crate::sync::Arc;

/// Errors a trace backend may report. The kernel ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceError {
    /// Payload exceeds what the backend can frame
    PayloadTooLarge(usize),
    /// Backend could not accept the record
    Backend,
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge(len) => write!(f, "payload too large: {len} bytes"),
            Self::Backend => write!(f, "trace backend error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TraceError {}

pub type TraceResult = Result<(), TraceError>;

pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> TraceResult + Send + Sync>;

/// Canonical record identifiers.
pub mod records {
    /// Scheduler records
    pub mod sched {
        /// Next task selected, payload `[next_prio, prev_prio]`
        pub const NEXT: u8 = 52;
        /// No task ready, payload `[prev_prio]`
        pub const IDLE: u8 = 53;
        /// Idle sleep hook entered, payload expected idle ticks (LE u32)
        pub const SLEEP: u8 = 54;
        /// Idle wake hook finished, payload expected idle ticks (LE u32)
        pub const WAKE: u8 = 55;
        /// Scheduler started, payload `[task_count]`
        pub const START: u8 = 56;
        /// Reschedule requested from an interrupt was taken, empty payload
        pub const YIELD: u8 = 57;
    }

    /// Task lifecycle records
    pub mod task {
        /// Task created, payload `[handle, prio]`
        pub const CREATE: u8 = 60;
        /// Task returned `Terminated`, payload `[handle]`
        pub const TERMINATE: u8 = 61;
    }

    /// Fatal hook records
    pub mod fault {
        /// Allocation failure, payload requested bytes (LE u32)
        pub const ALLOC: u8 = 70;
        /// Stack overflow, payload `[handle]`
        pub const STACK: u8 = 71;
        /// Task set creation failed, empty payload
        pub const BOOT: u8 = 72;
    }
}
