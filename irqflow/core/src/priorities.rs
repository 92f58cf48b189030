//! Task priorities and the startup tiers built on top of them

use core::fmt;

use crate::{CoreError, CoreResult};

/// Scheduling priority of a task. Larger values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskPriority(u8);

impl TaskPriority {
    /// Reserved for the idle path of the scheduler
    pub const IDLE: TaskPriority = TaskPriority(0);

    /// Lowest priority an application task may use
    pub const MIN: TaskPriority = TaskPriority(1);

    /// Highest supported priority
    pub const MAX: TaskPriority = TaskPriority(63);

    /// Create a task priority, rejecting the idle level and anything above [`Self::MAX`]
    pub fn new(priority: u8) -> CoreResult<Self> {
        if priority == 0 || priority > Self::MAX.0 {
            Err(CoreError::InvalidPriority)
        } else {
            Ok(TaskPriority(priority))
        }
    }

    /// Create priority without validation (const fn)
    pub const fn new_unchecked(priority: u8) -> Self {
        TaskPriority(priority)
    }

    /// Get the raw priority value
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// True for every level a task may be created at
    pub const fn is_valid(self) -> bool {
        self.0 > 0 && self.0 <= Self::MAX.0
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskPriority {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Priority({})", self.0);
    }
}

/// The two priority tiers used at startup.
///
/// Registration tasks must out-rank every interactive task so that
/// their one-shot command registration completes before the console
/// becomes runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    /// Peripheral command registrars
    Registration,
    /// Console and application tasks
    Interactive,
}

impl PriorityTier {
    pub const REGISTRATION_PRIORITY: TaskPriority = TaskPriority::new_unchecked(3);
    pub const INTERACTIVE_PRIORITY: TaskPriority = TaskPriority::new_unchecked(2);

    /// Priority every task of this tier is created at
    pub const fn priority(self) -> TaskPriority {
        match self {
            PriorityTier::Registration => Self::REGISTRATION_PRIORITY,
            PriorityTier::Interactive => Self::INTERACTIVE_PRIORITY,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PriorityTier {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PriorityTier::Registration => defmt::write!(fmt, "Registration"),
            PriorityTier::Interactive => defmt::write!(fmt, "Interactive"),
        }
    }
}

/// Macro to create compile-time priority constants
#[macro_export]
macro_rules! priority {
    ($value:literal) => {
        $crate::TaskPriority::new_unchecked($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_creation() {
        assert!(TaskPriority::new(0).is_err());
        assert!(TaskPriority::new(1).is_ok());
        assert!(TaskPriority::new(63).is_ok());
        assert!(TaskPriority::new(64).is_err());
    }

    #[test]
    fn registration_tier_outranks_interactive_tier() {
        assert!(PriorityTier::Registration.priority() > PriorityTier::Interactive.priority());
        assert!(PriorityTier::Interactive.priority() > TaskPriority::IDLE);
    }
}
