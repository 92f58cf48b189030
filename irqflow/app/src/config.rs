//! Firmware constants and runtime options.

use irqflow_hal::Level;

/// Time a press must stay asserted before it counts
pub const BUTTON_DEBOUNCE_MS: u32 = 20;

/// Delay between two debounce samples
pub const BUTTON_DEBOUNCE_READ_DELAY_MS: u32 = 2;

/// Stack depth, in words, of every task
pub const TASK_STACK_DEPTH: u16 = 512;

/// GPIO pin of push-button 0
pub const BUTTON0_PIN: u32 = 16;

/// GPIO pin of LED 0, the status indicator driven by the power hooks
pub const LED0_PIN: u32 = 10;

/// LED array index the application task toggles on every press
pub const APPLICATION_LED: usize = 1;

/// Counter/timer interrupt bit serviced as the periodic tick
pub const PERIODIC_TIMER_BIT: u32 = 0;

/// Debounce window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub window_ms: u32,
    pub interval_ms: u32,
    /// Level a pressed button reads
    pub asserted: Level,
}

impl DebounceConfig {
    /// Samples taken across the window, never fewer than one.
    ///
    /// A zero interval or a window shorter than one interval still reads
    /// the pin once.
    pub const fn samples(&self) -> u32 {
        let samples = match self.window_ms.checked_div(self.interval_ms) {
            Some(samples) => samples,
            None => 1,
        };
        if samples == 0 {
            1
        } else {
            samples
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: BUTTON_DEBOUNCE_MS,
            interval_ms: BUTTON_DEBOUNCE_READ_DELAY_MS,
            asserted: Level::High,
        }
    }
}

/// Runtime options of the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub button_pin: u32,
    pub indicator_pin: u32,
    pub application_led: usize,
    pub debounce: DebounceConfig,
    /// Request a reschedule when a button send wakes the application task
    pub yield_from_isr: bool,
    /// Whether the power hooks clear and restore the indicator pin
    pub indicator_in_power_hooks: bool,
    /// Enable the counter/timer interrupt that produces `TIMER` messages
    pub periodic_timer: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            button_pin: BUTTON0_PIN,
            indicator_pin: LED0_PIN,
            application_led: APPLICATION_LED,
            debounce: DebounceConfig::default(),
            yield_from_isr: false,
            indicator_in_power_hooks: true,
            periodic_timer: false,
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn button_pin(mut self, pin: u32) -> Self {
        self.config.button_pin = pin;
        self
    }

    pub fn indicator_pin(mut self, pin: u32) -> Self {
        self.config.indicator_pin = pin;
        self
    }

    pub fn application_led(mut self, index: usize) -> Self {
        self.config.application_led = index;
        self
    }

    pub fn debounce(mut self, debounce: DebounceConfig) -> Self {
        self.config.debounce = debounce;
        self
    }

    pub fn yield_from_isr(mut self, enabled: bool) -> Self {
        self.config.yield_from_isr = enabled;
        self
    }

    pub fn indicator_in_power_hooks(mut self, enabled: bool) -> Self {
        self.config.indicator_in_power_hooks = enabled;
        self
    }

    pub fn periodic_timer(mut self, enabled: bool) -> Self {
        self.config.periodic_timer = enabled;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
