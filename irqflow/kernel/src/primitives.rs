//! Synchronization primitives for tasks.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use irqflow_core::Waitable;

/// One-shot completion signal shared by a fixed number of parties.
///
/// Each registering task calls [`arrive`](Self::arrive) exactly once when
/// its work is done; a task waiting on the barrier through the kernel is
/// released once every party has arrived. Arrivals beyond the expected
/// count are ignored.
pub struct StartupBarrier {
    parties: usize,
    arrived: AtomicUsize,
}

impl StartupBarrier {
    pub const fn new(parties: usize) -> Self {
        Self {
            parties,
            arrived: AtomicUsize::new(0),
        }
    }

    /// Record one party as done. Returns true for the arrival that
    /// completes the barrier.
    pub fn arrive(&self) -> bool {
        let mut current = self.arrived.load(Ordering::Acquire);
        loop {
            if current >= self.parties {
                log::warn!("startup barrier: extra arrival ignored");
                return false;
            }
            match self.arrived.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return current + 1 == self.parties,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.arrived.load(Ordering::Acquire) >= self.parties
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }
}

impl Waitable for StartupBarrier {
    fn is_ready(&self) -> bool {
        self.is_complete()
    }
}

impl fmt::Debug for StartupBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupBarrier")
            .field("parties", &self.parties)
            .field("arrived", &self.arrived())
            .finish()
    }
}
