//! Sleep/wake hooks run by the kernel's idle path.

use irqflow_core::Ticks;
use irqflow_hal::{Board, Level};
use irqflow_kernel::sync::Arc;
use irqflow_kernel::IdleHooks;
use irqflow_queue::TaskMessage;

use crate::AppChannel;

/// Deep-sleeps the CPU while idle and reports every wake-up to the
/// application task.
pub struct PowerHooks<B: Board> {
    board: Arc<B>,
    channel: Arc<AppChannel>,
    indicator_pin: Option<u32>,
}

impl<B: Board> PowerHooks<B> {
    /// `indicator_pin` is cleared before sleeping and set after waking
    pub fn new(board: Arc<B>, channel: Arc<AppChannel>, indicator_pin: Option<u32>) -> Self {
        Self {
            board,
            channel,
            indicator_pin,
        }
    }
}

impl<B: Board> IdleHooks for PowerHooks<B> {
    fn on_idle_sleep(&self, _expected_idle: Ticks) -> Ticks {
        if let Some(pin) = self.indicator_pin {
            self.board.write(pin, Level::Low);
        }
        self.board.deep_sleep();
        // Deep sleep already waited for the wake-up interrupt.
        Ticks::ZERO
    }

    fn on_idle_wake(&self, _expected_idle: Ticks) {
        if let Some(pin) = self.indicator_pin {
            self.board.write(pin, Level::High);
        }
        self.channel.send_from_interrupt(TaskMessage::WAKE);
    }
}
