//! Idle path: the sleep/wake hook pair and the CPU wait primitive.

use irqflow_core::Ticks;

/// Hooks the kernel calls when no task is ready.
///
/// `on_idle_sleep` receives the expected idle time and returns how long
/// the kernel should still wait itself; returning zero means the hook
/// already waited. `on_idle_wake` runs after the wait, with interrupts
/// enabled, and must only use interrupt-safe operations.
pub trait IdleHooks: Send + Sync {
    fn on_idle_sleep(&self, expected_idle: Ticks) -> Ticks;

    fn on_idle_wake(&self, expected_idle: Ticks);
}

/// Hooks that never sleep; the kernel does the full wait itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIdleHooks;

impl IdleHooks for NoIdleHooks {
    fn on_idle_sleep(&self, expected_idle: Ticks) -> Ticks {
        expected_idle
    }

    fn on_idle_wake(&self, _expected_idle: Ticks) {}
}

/// How the kernel waits for the next interrupt.
pub trait IdlePort: Send + Sync {
    fn wait_for_interrupt(&self, ticks: Ticks);
}

/// Waits with `wfi` on ARM, spins elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct WfiPort;

impl IdlePort for WfiPort {
    fn wait_for_interrupt(&self, _ticks: Ticks) {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
        #[cfg(not(target_arch = "arm"))]
        core::hint::spin_loop();
    }
}
