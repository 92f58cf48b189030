//! GPIO edge handler for push-button 0.

use irqflow_hal::{Board, DelaySource};
use irqflow_kernel::sync::Arc;
use irqflow_kernel::Kernel;
use irqflow_queue::{SendOutcome, TaskMessage};

use crate::config::AppConfig;
use crate::debounce::{debounce, DebounceOutcome};
use crate::AppChannel;

/// Debounces the button pin and forwards confirmed presses as `BUTTON`.
pub struct ButtonHandler<B: Board> {
    board: Arc<B>,
    channel: Arc<AppChannel>,
    kernel: Arc<Kernel>,
    delay: <B as DelaySource>::Delay,
    config: AppConfig,
}

impl<B: Board> ButtonHandler<B> {
    pub fn new(board: Arc<B>, channel: Arc<AppChannel>, kernel: Arc<Kernel>, config: AppConfig) -> Self {
        let delay = board.busy_delay();
        Self {
            board,
            channel,
            kernel,
            delay,
            config,
        }
    }

    /// Handle one edge. `None` when the edge was bounce.
    pub fn on_edge(&mut self) -> Option<SendOutcome> {
        let board = &self.board;
        let pin = self.config.button_pin;
        let mut sample = || board.read(pin);
        match debounce(&self.config.debounce, &mut sample, &mut self.delay) {
            DebounceOutcome::Confirmed => {}
            DebounceOutcome::Bounced { at_sample } => {
                log::debug!("button pin {}: bounce at sample {}", pin, at_sample);
                return None;
            }
        }

        let outcome = self.channel.send_from_interrupt(TaskMessage::BUTTON);
        log::debug!("button pin {}: press confirmed, {:?}", pin, outcome);
        if self.config.yield_from_isr && outcome.woke_receiver() {
            self.kernel.request_yield();
        }
        Some(outcome)
    }
}
