//! The application task: the single consumer of the event channel.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use irqflow_core::{EventKind, Timeout};
use irqflow_hal::Board;
use irqflow_kernel::sync::Arc;
use irqflow_kernel::{RecvError, Task, TaskAction, TaskContext};

use crate::AppChannel;

/// Events handled by the application task, per kind.
#[derive(Debug, Default)]
pub struct AppStats {
    button_presses: AtomicU32,
    wakes: AtomicU32,
    timer_ticks: AtomicU32,
}

impl AppStats {
    pub fn button_presses(&self) -> u32 {
        self.button_presses.load(Ordering::Relaxed)
    }

    pub fn wakes(&self) -> u32 {
        self.wakes.load(Ordering::Relaxed)
    }

    pub fn timer_ticks(&self) -> u32 {
        self.timer_ticks.load(Ordering::Relaxed)
    }

    fn record(&self, kind: EventKind) {
        let counter = match kind {
            EventKind::Button => &self.button_presses,
            EventKind::Wake => &self.wakes,
            EventKind::Timer => &self.timer_ticks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Display for AppStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buttons={} wakes={} timer={}",
            self.button_presses(),
            self.wakes(),
            self.timer_ticks()
        )
    }
}

/// Blocks forever on the channel and reacts to each message.
pub struct ApplicationTask<B: Board> {
    board: Arc<B>,
    channel: Arc<AppChannel>,
    stats: Arc<AppStats>,
    led: usize,
}

impl<B: Board> ApplicationTask<B> {
    pub fn new(board: Arc<B>, channel: Arc<AppChannel>, stats: Arc<AppStats>, led: usize) -> Self {
        Self {
            board,
            channel,
            stats,
            led,
        }
    }
}

impl<B: Board> Task for ApplicationTask<B> {
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> TaskAction {
        let message = match ctx.receive(&self.channel, Timeout::Forever) {
            Ok(message) => message,
            Err(RecvError::WouldBlock) => return TaskAction::Blocked,
            Err(RecvError::Timeout) => return TaskAction::Continue,
        };

        log::debug!("application: received {}", message);
        match message.kind() {
            EventKind::Button => self.board.led_toggle(self.led),
            EventKind::Wake | EventKind::Timer => {}
        }
        self.stats.record(message.kind());
        TaskAction::Continue
    }
}
