//! Busy-wait delays usable from interrupt context

pub use embedded_hal::delay::DelayNs;

/// Hands out busy-wait delay providers.
///
/// The returned delay spins; it never yields to the scheduler, so it is
/// safe inside an interrupt handler.
pub trait DelaySource: Send + Sync {
    type Delay: DelayNs + Send + 'static;

    fn busy_delay(&self) -> Self::Delay;
}
