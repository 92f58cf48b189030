//! Interrupt service routines.
//!
//! Each routine snapshots the enabled pending bits of its peripheral,
//! clears exactly those bits, then dispatches them through the
//! peripheral's handler table. Read and clear are adjacent so an edge
//! arriving afterwards stays pending for the next entry.

use irqflow_hal::{Board, IrqLine, IrqMask};
use irqflow_kernel::sync::Arc;

use crate::handlers::HandlerTable;

/// Handler tables of both interrupt sources and the board they read.
pub struct Interrupts<B: Board> {
    board: Arc<B>,
    gpio: HandlerTable,
    ctimer: HandlerTable,
}

impl<B: Board> Interrupts<B> {
    pub fn new(board: Arc<B>) -> Self {
        Self {
            board,
            gpio: HandlerTable::new(),
            ctimer: HandlerTable::new(),
        }
    }

    pub fn register_gpio<F>(&mut self, pin: u32, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.gpio.register(pin, handler);
    }

    pub fn register_ctimer<F>(&mut self, bit: u32, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.ctimer.register(bit, handler);
    }

    pub fn is_gpio_registered(&self, pin: u32) -> bool {
        self.gpio.is_registered(pin)
    }

    /// GPIO bank interrupt entry. Returns the bits that were serviced.
    pub fn gpio_isr(&mut self) -> IrqMask {
        service(&*self.board, IrqLine::Gpio, &mut self.gpio)
    }

    /// Counter/timer interrupt entry. Returns the bits that were serviced.
    pub fn ctimer_isr(&mut self) -> IrqMask {
        service(&*self.board, IrqLine::Ctimer, &mut self.ctimer)
    }

    /// Entry point for `line`
    pub fn on_interrupt(&mut self, line: IrqLine) -> IrqMask {
        match line {
            IrqLine::Gpio => self.gpio_isr(),
            IrqLine::Ctimer => self.ctimer_isr(),
        }
    }
}

fn service<B: Board>(board: &B, line: IrqLine, table: &mut HandlerTable) -> IrqMask {
    let status = board.status(line, true);
    board.clear(line, status);
    if status != 0 {
        table.service(status);
    }
    status
}
