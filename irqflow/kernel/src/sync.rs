//! Platform abstraction for synchronization primitives.
//!
//! With the `std` feature the kernel locks with `std::sync::Mutex`;
//! without it, `spin::Mutex` is used.

#[cfg(not(feature = "std"))]
pub use alloc::sync::Arc;
#[cfg(feature = "std")]
pub use std::sync::Arc;

#[cfg(feature = "std")]
pub type MutexGuard<'a, T> = std::sync::MutexGuard<'a, T>;
#[cfg(not(feature = "std"))]
pub type MutexGuard<'a, T> = spin::MutexGuard<'a, T>;

/// Platform-agnostic mutex wrapper.
///
/// In `std` mode, panics if the mutex is poisoned: a task that panicked
/// while the kernel lock was held leaves the task table in an unknown
/// state.
pub struct Mutex<T> {
    #[cfg(feature = "std")]
    inner: std::sync::Mutex<T>,
    #[cfg(not(feature = "std"))]
    inner: spin::Mutex<T>,
}

impl<T> Mutex<T> {
    /// Creates a new mutex protecting the given value.
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "std")]
            inner: std::sync::Mutex::new(value),
            #[cfg(not(feature = "std"))]
            inner: spin::Mutex::new(value),
        }
    }

    /// Acquires the mutex, blocking until it becomes available.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        #[cfg(feature = "std")]
        {
            self.inner.lock().expect("kernel mutex poisoned")
        }
        #[cfg(not(feature = "std"))]
        {
            self.inner.lock()
        }
    }
}
