//! IO master (SPI/I2C controller) counters

use core::fmt;

/// Transfer counters of one IO master module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IomStats {
    pub transfers: u32,
    pub errors: u32,
}

impl fmt::Display for IomStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfers={} errors={}", self.transfers, self.errors)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IomStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "transfers={} errors={}", self.transfers, self.errors);
    }
}

pub trait IoMaster: Send + Sync {
    fn iom_count(&self) -> usize;

    /// `None` for a module index the board does not have
    fn iom_stats(&self, module: usize) -> Option<IomStats>;
}
