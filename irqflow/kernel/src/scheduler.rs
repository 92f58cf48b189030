//! Ready-set bookkeeping and next-task selection.

use irqflow_core::TaskPriority;

/// Bitmask of priority levels with at least one ready task.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadySet {
    bits: u64,
}

impl ReadySet {
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn insert(&mut self, prio: TaskPriority) {
        self.bits |= 1u64 << prio.raw();
    }

    pub fn remove(&mut self, prio: TaskPriority) {
        self.bits &= !(1u64 << prio.raw());
    }

    pub fn contains(&self, prio: TaskPriority) -> bool {
        (self.bits & (1u64 << prio.raw())) != 0
    }

    /// Highest ready priority
    pub fn max(&self) -> Option<TaskPriority> {
        if self.bits == 0 {
            None
        } else {
            Some(TaskPriority::new_unchecked(63 - self.bits.leading_zeros() as u8))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }
}

/// A ready candidate as seen by [`select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub priority: TaskPriority,
    /// Dispatch sequence number of the task's last step
    pub last_run: u64,
}

/// Pick the task to run next.
///
/// The highest ready priority wins. Within one priority the task that
/// ran least recently goes first, and creation order breaks remaining
/// ties, so equal-priority tasks share the CPU round-robin.
pub fn select<I>(candidates: I) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate> + Clone,
{
    let mut ready = ReadySet::new();
    for candidate in candidates.clone() {
        ready.insert(candidate.priority);
    }
    let top = ready.max()?;

    candidates
        .into_iter()
        .filter(|candidate| candidate.priority == top)
        .min_by_key(|candidate| (candidate.last_run, candidate.index))
}
