//! In-memory console transport.

use std::collections::VecDeque;
use std::sync::Mutex;

use irqflow_app::Transport;
use irqflow_core::Waitable;

#[derive(Debug, Default)]
pub struct SimTransport {
    input: Mutex<VecDeque<String>>,
    output: Mutex<Vec<String>>,
    echo: bool,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print every written line to stdout as well
    pub fn with_echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Queue a line as if typed on the console
    pub fn push_line(&self, line: impl Into<String>) {
        self.input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(line.into());
    }

    /// Lines written by the console so far
    pub fn output(&self) -> Vec<String> {
        self.output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Waitable for SimTransport {
    fn is_ready(&self) -> bool {
        !self
            .input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

impl Transport for SimTransport {
    fn read_line(&self) -> Option<String> {
        self.input
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    fn write_line(&self, line: &str) {
        if self.echo {
            println!("> {line}");
        }
        self.output
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_owned());
    }
}
