//! Interrupt status registers and the interrupt controller

/// One bit per interrupt source within a peripheral
pub type IrqMask = u64;

/// Mask selecting a single GPIO pin. Empty for pins past the last
/// status bit.
pub const fn pin_mask(pin: u32) -> IrqMask {
    match 1u64.checked_shl(pin) {
        Some(mask) => mask,
        None => 0,
    }
}

/// Peripheral interrupt lines routed to the interrupt controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqLine {
    /// Edge-triggered GPIO bank
    Gpio,
    /// Periodic counter/timer
    Ctimer,
}

impl IrqLine {
    pub const ALL: [IrqLine; 2] = [IrqLine::Gpio, IrqLine::Ctimer];

    pub const fn name(self) -> &'static str {
        match self {
            IrqLine::Gpio => "GPIO",
            IrqLine::Ctimer => "CTIMER",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IrqLine {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name());
    }
}

/// Per-peripheral pending/enable registers.
///
/// `clear` is write-one-to-clear: only the bits set in `mask` change.
pub trait InterruptStatus: Send + Sync {
    /// Pending bits, optionally masked by the enable register
    fn status(&self, line: IrqLine, enabled_only: bool) -> IrqMask;

    fn clear(&self, line: IrqLine, mask: IrqMask);

    fn enable(&self, line: IrqLine, mask: IrqMask);
}

/// Interrupt controller abstraction
pub trait InterruptController: Send + Sync {
    /// Enable a peripheral line at the controller
    fn enable_line(&self, line: IrqLine);

    /// Enable interrupts globally
    fn enable_global(&self);

    /// Disable interrupts globally
    fn disable_global(&self);
}
