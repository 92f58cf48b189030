//! Wait conditions a blocked task can suspend on

/// Something a task can block on until it becomes ready.
///
/// Implementors must make both methods safe to call from the scheduler at
/// any time, including between interrupt handlers.
pub trait Waitable: Send + Sync {
    /// True once a blocked waiter may resume
    fn is_ready(&self) -> bool;

    /// Called by the scheduler when a task suspends on this condition
    fn register_waiter(&self) {}

    /// Called when a suspended waiter gives up on its deadline
    fn unregister_waiter(&self) {}
}
