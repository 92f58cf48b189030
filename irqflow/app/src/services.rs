//! Registration-tier service tasks.
//!
//! Each service registers its console command, arrives at the startup
//! barrier and terminates. They run at the registration priority, above
//! the console, and never block.

use irqflow_hal::{Board, Level};
use irqflow_kernel::sync::Arc;
use irqflow_kernel::{StartupBarrier, Task, TaskAction, TaskContext};

use crate::console::{CommandRegistry, ConsoleError};

fn parse_pin(word: Option<&&str>, usage: &'static str) -> Result<u32, ConsoleError> {
    word.and_then(|word| word.parse().ok())
        .ok_or(ConsoleError::Usage(usage))
}

fn register_and_arrive(
    name: &'static str,
    barrier: &StartupBarrier,
    result: Result<(), ConsoleError>,
) -> TaskAction {
    if let Err(err) = result {
        log::warn!("{} service: registration failed: {}", name, err);
    }
    barrier.arrive();
    TaskAction::Terminated
}

/// Registers `gpio read <pin>` / `gpio write <pin> <0|1>`.
pub struct GpioService<B: Board> {
    board: Arc<B>,
    registry: Arc<CommandRegistry>,
    barrier: Arc<StartupBarrier>,
}

impl<B: Board> GpioService<B> {
    pub const USAGE: &'static str = "gpio read <pin> | gpio write <pin> <0|1>";

    pub fn new(board: Arc<B>, registry: Arc<CommandRegistry>, barrier: Arc<StartupBarrier>) -> Self {
        Self {
            board,
            registry,
            barrier,
        }
    }
}

impl<B: Board> Task for GpioService<B> {
    fn run(&mut self, _ctx: &mut TaskContext<'_>) -> TaskAction {
        let board = Arc::clone(&self.board);
        let result = self.registry.register("gpio", Self::USAGE, move |args, out| {
            match args {
                ["read", rest @ ..] => {
                    let pin = parse_pin(rest.first(), Self::USAGE)?;
                    let level = board.read(pin);
                    writeln!(out, "pin {} = {}", pin, u8::from(level.is_high()))?;
                    Ok(())
                }
                ["write", rest @ ..] => {
                    let pin = parse_pin(rest.first(), Self::USAGE)?;
                    let level = match rest.get(1).copied() {
                        Some("0") => Level::Low,
                        Some("1") => Level::High,
                        _ => return Err(ConsoleError::Usage(Self::USAGE)),
                    };
                    board.write(pin, level);
                    writeln!(out, "pin {} <- {}", pin, u8::from(level.is_high()))?;
                    Ok(())
                }
                _ => Err(ConsoleError::Usage(Self::USAGE)),
            }
        });
        register_and_arrive("GPIO", &self.barrier, result)
    }
}

/// Registers `iom status`.
pub struct IomService<B: Board> {
    board: Arc<B>,
    registry: Arc<CommandRegistry>,
    barrier: Arc<StartupBarrier>,
}

impl<B: Board> IomService<B> {
    pub const USAGE: &'static str = "iom status";

    pub fn new(board: Arc<B>, registry: Arc<CommandRegistry>, barrier: Arc<StartupBarrier>) -> Self {
        Self {
            board,
            registry,
            barrier,
        }
    }
}

impl<B: Board> Task for IomService<B> {
    fn run(&mut self, _ctx: &mut TaskContext<'_>) -> TaskAction {
        let board = Arc::clone(&self.board);
        let result = self.registry.register("iom", Self::USAGE, move |args, out| {
            if args != ["status"] {
                return Err(ConsoleError::Usage(Self::USAGE));
            }
            for module in 0..board.iom_count() {
                if let Some(stats) = board.iom_stats(module) {
                    writeln!(out, "iom{}: {}", module, stats)?;
                }
            }
            Ok(())
        });
        register_and_arrive("IOM", &self.barrier, result)
    }
}
