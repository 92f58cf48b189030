//! Host-side sinks for kernel trace records and fault halts.

use std::sync::Arc;

use irqflow_kernel::{records, Fault, HaltStrategy, TraceHook, TraceResult};

/// Human-readable name of a kernel trace record
pub fn record_name(record: u8) -> &'static str {
    match record {
        records::sched::NEXT => "SCHED_NEXT",
        records::sched::IDLE => "SCHED_IDLE",
        records::sched::SLEEP => "SCHED_SLEEP",
        records::sched::WAKE => "SCHED_WAKE",
        records::sched::START => "SCHED_START",
        records::sched::YIELD => "SCHED_YIELD",
        records::task::CREATE => "TASK_CREATE",
        records::task::TERMINATE => "TASK_TERMINATE",
        records::fault::ALLOC => "FAULT_ALLOC",
        records::fault::STACK => "FAULT_STACK",
        records::fault::BOOT => "FAULT_BOOT",
        _ => "UNKNOWN",
    }
}

/// Trace hook that forwards every record to the `log` facade
pub fn log_trace_hook() -> TraceHook {
    Arc::new(|record: u8, payload: &[u8], _timestamp: bool| -> TraceResult {
        log::trace!("trace {} {:02x?}", record_name(record), payload);
        Ok(())
    })
}

/// Ends the host process with a non-zero status instead of spinning.
#[derive(Debug, Clone, Copy)]
pub struct ExitHalt {
    pub code: i32,
}

impl Default for ExitHalt {
    fn default() -> Self {
        Self { code: 101 }
    }
}

impl HaltStrategy for ExitHalt {
    fn halt(&self, fault: &Fault) -> ! {
        eprintln!("halted: {fault}");
        std::process::exit(self.code)
    }
}
