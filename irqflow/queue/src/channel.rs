//! Bounded event channel shared between interrupt and task context

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use heapless::Deque;
use irqflow_core::{TaskMessage, Waitable};

/// Result of a non-blocking send.
///
/// Callers in interrupt context are not expected to act on `Dropped`;
/// losing a notification under saturation is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message stored at the tail of the channel
    Accepted {
        /// A task was suspended on the empty channel and can now run
        woke_receiver: bool,
    },
    /// Channel full, message discarded
    Dropped,
}

impl SendOutcome {
    pub const fn is_accepted(self) -> bool {
        matches!(self, SendOutcome::Accepted { .. })
    }

    /// True when the sender may want to request an immediate reschedule
    pub const fn woke_receiver(self) -> bool {
        matches!(self, SendOutcome::Accepted { woke_receiver: true })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SendOutcome {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SendOutcome::Accepted { woke_receiver } => {
                defmt::write!(fmt, "Accepted(woke={})", woke_receiver)
            }
            SendOutcome::Dropped => defmt::write!(fmt, "Dropped"),
        }
    }
}

/// Send counters kept for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStats {
    pub accepted: u32,
    pub dropped: u32,
}

impl fmt::Display for ChannelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accepted={} dropped={}", self.accepted, self.dropped)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "accepted={} dropped={}", self.accepted, self.dropped);
    }
}

struct State<const N: usize> {
    queue: Deque<TaskMessage, N>,
    stats: ChannelStats,
    receiver_waiting: bool,
}

/// Fixed-capacity FIFO of task messages.
///
/// Any number of interrupt handlers may send; exactly one task
/// receives. Messages come out in the order they were accepted, across
/// all producers combined. Every access runs inside a critical section,
/// which is the only synchronization between interrupt and task context.
pub struct EventChannel<const N: usize> {
    state: Mutex<RefCell<State<N>>>,
}

impl<const N: usize> EventChannel<N> {
    const CAPACITY_IS_NONZERO: () = assert!(N > 0, "event channel capacity must be > 0");

    /// Create an empty channel
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_IS_NONZERO;
        Self {
            state: Mutex::new(RefCell::new(State {
                queue: Deque::new(),
                stats: ChannelStats {
                    accepted: 0,
                    dropped: 0,
                },
                receiver_waiting: false,
            })),
        }
    }

    /// Place `message` at the tail without blocking.
    ///
    /// Safe to call from interrupt context. A full channel drops the
    /// message and reports [`SendOutcome::Dropped`].
    pub fn send_from_interrupt(&self, message: TaskMessage) -> SendOutcome {
        let outcome = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let was_empty = state.queue.is_empty();
            match state.queue.push_back(message) {
                Ok(()) => {
                    state.stats.accepted = state.stats.accepted.wrapping_add(1);
                    let woke_receiver = was_empty && state.receiver_waiting;
                    if woke_receiver {
                        state.receiver_waiting = false;
                    }
                    SendOutcome::Accepted { woke_receiver }
                }
                Err(_) => {
                    state.stats.dropped = state.stats.dropped.wrapping_add(1);
                    SendOutcome::Dropped
                }
            }
        });

        if outcome == SendOutcome::Dropped {
            log::warn!("event channel full, dropped {}", message.kind);
        }
        outcome
    }

    /// Take the oldest message, if any. Task context only.
    pub fn try_receive(&self) -> Option<TaskMessage> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let message = state.queue.pop_front();
            if message.is_some() {
                state.receiver_waiting = false;
            }
            message
        })
    }

    /// Number of messages waiting
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.len())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.is_empty())
    }

    pub fn is_full(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).queue.is_full())
    }

    /// Fixed capacity of the channel
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Accepted and dropped send counts since creation
    pub fn stats(&self) -> ChannelStats {
        critical_section::with(|cs| self.state.borrow_ref(cs).stats)
    }
}

impl<const N: usize> Default for EventChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Waitable for EventChannel<N> {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }

    fn register_waiter(&self) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).receiver_waiting = true;
        });
    }

    fn unregister_waiter(&self) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).receiver_waiting = false;
        });
    }
}

impl<const N: usize> fmt::Debug for EventChannel<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("len", &self.len())
            .field("capacity", &N)
            .field("stats", &self.stats())
            .finish()
    }
}
