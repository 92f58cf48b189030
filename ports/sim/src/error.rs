use irqflow_kernel::KernelError;
use thiserror::Error;

/// Errors produced while configuring or running a simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("invalid scenario event '{0}'")]
    InvalidEvent(String),
    #[error("invalid tick in scenario event '{0}'")]
    InvalidTick(String),
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}
