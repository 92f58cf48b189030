//! Command console: registry of named commands and the console task.
//!
//! Service tasks register commands while the registry is open. The
//! console task waits on the startup barrier, seals the registry, then
//! serves lines from its [`Transport`]. A line's first word selects the
//! command; the remaining words are its arguments.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};

use irqflow_core::{Timeout, Waitable};
use irqflow_kernel::sync::{Arc, Mutex};
use irqflow_kernel::{StartupBarrier, Task, TaskAction, TaskContext};

/// Most words a command line may carry, command name included
pub const MAX_ARGS: usize = 8;

/// Line-oriented console I/O.
///
/// Ready (as a [`Waitable`]) while at least one complete line is
/// buffered.
pub trait Transport: Waitable {
    fn read_line(&self) -> Option<String>;

    fn write_line(&self, line: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Registration attempted after the console started serving
    Sealed,
    /// A command with this name already exists
    Duplicate(&'static str),
    /// First word of the line names no command
    UnknownCommand(String),
    /// More words than [`MAX_ARGS`]
    TooManyArguments,
    /// Command rejected its arguments
    Usage(&'static str),
    Format,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sealed => write!(f, "command set is sealed"),
            Self::Duplicate(name) => write!(f, "command '{name}' already registered"),
            Self::UnknownCommand(name) => write!(f, "unknown command '{name}'"),
            Self::TooManyArguments => write!(f, "too many arguments"),
            Self::Usage(usage) => write!(f, "usage: {usage}"),
            Self::Format => write!(f, "output formatting failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConsoleError {}

impl From<fmt::Error> for ConsoleError {
    fn from(_: fmt::Error) -> Self {
        ConsoleError::Format
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Command body: arguments after the name, output sink.
pub type CommandFn = Box<dyn Fn(&[&str], &mut dyn Write) -> ConsoleResult<()> + Send + Sync>;

struct Command {
    name: &'static str,
    help: &'static str,
    run: CommandFn,
}

struct RegistryState {
    commands: Vec<Command>,
    sealed: bool,
}

/// Named commands available on the console.
pub struct CommandRegistry {
    state: Mutex<RegistryState>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                commands: Vec::new(),
                sealed: false,
            }),
        }
    }

    pub fn register<F>(&self, name: &'static str, help: &'static str, run: F) -> ConsoleResult<()>
    where
        F: Fn(&[&str], &mut dyn Write) -> ConsoleResult<()> + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        if state.sealed {
            return Err(ConsoleError::Sealed);
        }
        if state.commands.iter().any(|command| command.name == name) {
            return Err(ConsoleError::Duplicate(name));
        }
        state.commands.push(Command {
            name,
            help,
            run: Box::new(run),
        });
        drop(state);
        log::info!("console: registered command '{}'", name);
        Ok(())
    }

    /// Close registration. Later `register` calls fail.
    pub fn seal(&self) {
        self.state.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    /// Registered command names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .commands
            .iter()
            .map(|command| command.name)
            .collect()
    }

    /// Run the command named by the first word of `line`.
    ///
    /// `help` is built in and lists every registered command. Blank lines
    /// do nothing.
    pub fn dispatch(&self, line: &str, out: &mut dyn Write) -> ConsoleResult<()> {
        let mut words: heapless::Vec<&str, MAX_ARGS> = heapless::Vec::new();
        for word in line.split_whitespace() {
            words
                .push(word)
                .map_err(|_| ConsoleError::TooManyArguments)?;
        }
        let Some((&name, args)) = words.split_first() else {
            return Ok(());
        };

        let state = self.state.lock();
        if name == "help" {
            for command in &state.commands {
                writeln!(out, "{:<8} {}", command.name, command.help)?;
            }
            return Ok(());
        }
        match state.commands.iter().find(|command| command.name == name) {
            Some(command) => (command.run)(args, out),
            None => Err(ConsoleError::UnknownCommand(String::from(name))),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CommandRegistry")
            .field("commands", &state.commands.len())
            .field("sealed", &state.sealed)
            .finish()
    }
}

/// The interactive console task.
pub struct ConsoleTask<T: Transport> {
    registry: Arc<CommandRegistry>,
    barrier: Arc<StartupBarrier>,
    transport: Arc<T>,
    serving: bool,
}

impl<T: Transport + 'static> ConsoleTask<T> {
    pub fn new(registry: Arc<CommandRegistry>, barrier: Arc<StartupBarrier>, transport: Arc<T>) -> Self {
        Self {
            registry,
            barrier,
            transport,
            serving: false,
        }
    }

    fn serve_line(&self, line: &str) {
        let mut output = String::new();
        match self.registry.dispatch(line, &mut output) {
            Ok(()) => {
                for reply in output.lines() {
                    self.transport.write_line(reply);
                }
            }
            Err(err) => {
                log::debug!("console: '{}' failed: {}", line.trim(), err);
                self.transport.write_line(&format!("error: {err}"));
            }
        }
    }
}

impl<T: Transport + 'static> Task for ConsoleTask<T> {
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> TaskAction {
        if !self.serving {
            if ctx.wait(&self.barrier, Timeout::Forever).is_err() {
                return TaskAction::Blocked;
            }
            self.registry.seal();
            self.serving = true;
            log::info!(
                "console: serving {} commands",
                self.registry.names().len()
            );
        }

        match self.transport.read_line() {
            Some(line) => {
                self.serve_line(&line);
                TaskAction::Continue
            }
            None => match ctx.wait(&self.transport, Timeout::Forever) {
                Ok(()) => TaskAction::Continue,
                Err(_) => TaskAction::Blocked,
            },
        }
    }
}
