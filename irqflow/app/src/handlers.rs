//! Per-bit interrupt handler tables.

use alloc::boxed::Box;
use core::fmt;

use irqflow_hal::IrqMask;

/// Number of status bits a table can dispatch
pub const HANDLER_SLOTS: usize = 64;

pub type InterruptHandler = Box<dyn FnMut() + Send>;

/// Handlers indexed by interrupt status bit.
///
/// Filled during setup; [`service`](Self::service) runs from the ISR.
pub struct HandlerTable {
    slots: [Option<InterruptHandler>; HANDLER_SLOTS],
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Install `handler` for `bit`, replacing any previous one.
    pub fn register<F>(&mut self, bit: u32, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        let Some(slot) = self.slots.get_mut(bit as usize) else {
            log::warn!("interrupt bit {} out of range, handler not registered", bit);
            return;
        };
        if slot.replace(Box::new(handler)).is_some() {
            log::debug!("interrupt bit {} handler replaced", bit);
        }
    }

    pub fn is_registered(&self, bit: u32) -> bool {
        matches!(self.slots.get(bit as usize), Some(Some(_)))
    }

    /// Run the handler of every set bit in `mask`, lowest bit first.
    ///
    /// Set bits with no handler are ignored. Returns the number of
    /// handlers run.
    pub fn service(&mut self, mask: IrqMask) -> usize {
        let mut remaining = mask;
        let mut serviced = 0;
        while remaining != 0 {
            let bit = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            if let Some(handler) = self.slots[bit].as_mut() {
                handler();
                serviced += 1;
            }
        }
        serviced
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: IrqMask = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .fold(0, |mask, (bit, _)| mask | (1 << bit));
        f.debug_struct("HandlerTable")
            .field("registered", &format_args!("{registered:#018x}"))
            .finish()
    }
}
