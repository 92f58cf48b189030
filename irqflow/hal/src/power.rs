//! Power control

pub trait Power: Send + Sync {
    /// One-time low-power configuration
    fn low_power_init(&self);

    /// Stop the RTC oscillator
    fn rtc_oscillator_disable(&self);

    /// Enter deep sleep; returns after the next wake-up interrupt
    fn deep_sleep(&self);
}
