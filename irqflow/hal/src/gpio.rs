//! GPIO (General Purpose Input/Output) abstraction

use core::ops::Not;

/// GPIO pin modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input (floating)
    Input,
    /// Input with pull-up resistor
    InputPullUp,
    /// Output (push-pull)
    Output,
}

#[cfg(feature = "defmt")]
impl defmt::Format for PinMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PinMode::Input => defmt::write!(fmt, "Input"),
            PinMode::InputPullUp => defmt::write!(fmt, "InputPullUp"),
            PinMode::Output => defmt::write!(fmt, "Output"),
        }
    }
}

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    /// Low level (0V)
    #[default]
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Level {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Level::Low => defmt::write!(fmt, "Low"),
            Level::High => defmt::write!(fmt, "High"),
        }
    }
}

/// Pin-level access by pin number
pub trait Gpio: Send + Sync {
    /// Configure pin mode
    fn configure(&self, pin: u32, mode: PinMode);

    /// Read current level
    fn read(&self, pin: u32) -> Level;

    /// Write level (for output pins)
    fn write(&self, pin: u32, level: Level);

    /// Toggle output
    fn toggle(&self, pin: u32) {
        let level = self.read(pin);
        self.write(pin, !level);
    }
}

/// Board push-button array
pub trait ButtonArray: Send + Sync {
    fn init_buttons(&self);
}
