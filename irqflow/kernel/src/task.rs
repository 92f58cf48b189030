//! Task descriptors and the step-function task model.
//!
//! A task is polled by the kernel: every dispatch calls [`Task::run`]
//! once and the returned [`TaskAction`] tells the scheduler what to do
//! next. Blocking operations on [`TaskContext`] never suspend the caller
//! themselves; they record a wait request and return
//! [`RecvError::WouldBlock`], and the task returns
//! [`TaskAction::Blocked`] to hand control back.

use alloc::boxed::Box;
use core::fmt;

use irqflow_core::{Instant, TaskMessage, TaskPriority, Ticks, Timeout, Waitable};
use irqflow_queue::EventChannel;

use crate::config::{STACK_WORD_BYTES, TASK_CONTROL_BLOCK_BYTES};
use crate::sync::Arc;

/// Diagnostic identifier handed out at task creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(pub(crate) u8);

impl TaskHandle {
    pub const fn raw(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskHandle {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "#{}", self.0);
    }
}

/// Fixed description of a task: name, stack depth in words, priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: &'static str,
    pub stack_depth: u16,
    pub priority: TaskPriority,
}

impl TaskConfig {
    pub const fn new(name: &'static str, stack_depth: u16, priority: TaskPriority) -> Self {
        Self {
            name,
            stack_depth,
            priority,
        }
    }

    /// Stack size in bytes
    pub const fn stack_bytes(&self) -> usize {
        self.stack_depth as usize * STACK_WORD_BYTES
    }

    /// Heap charged when the task is created
    pub const fn heap_cost(&self) -> usize {
        self.stack_bytes() + TASK_CONTROL_BLOCK_BYTES
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{}(stack={}, prio={})",
            self.name,
            self.stack_depth,
            self.priority
        );
    }
}

/// Scheduling state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

#[cfg(feature = "defmt")]
impl defmt::Format for TaskState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TaskState::Ready => defmt::write!(fmt, "Ready"),
            TaskState::Running => defmt::write!(fmt, "Running"),
            TaskState::Blocked => defmt::write!(fmt, "Blocked"),
            TaskState::Terminated => defmt::write!(fmt, "Terminated"),
        }
    }
}

/// What a task step asks the scheduler to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Stay ready
    Continue,
    /// Suspend on the wait recorded in the context
    Blocked,
    /// Never run again
    Terminated,
}

/// Outcome of a blocking call that could not complete immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// Return [`TaskAction::Blocked`] and retry on the next step
    WouldBlock,
    /// The timeout elapsed before the condition became ready
    Timeout,
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WouldBlock => write!(f, "operation would block"),
            Self::Timeout => write!(f, "operation timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RecvError {}

#[cfg(feature = "defmt")]
impl defmt::Format for RecvError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            RecvError::WouldBlock => defmt::write!(fmt, "WouldBlock"),
            RecvError::Timeout => defmt::write!(fmt, "Timeout"),
        }
    }
}

/// A schedulable unit of work.
pub trait Task: Send {
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> TaskAction;
}

impl<F> Task for F
where
    F: FnMut(&mut TaskContext<'_>) -> TaskAction + Send,
{
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> TaskAction {
        self(ctx)
    }
}

pub(crate) type BoxedTask = Box<dyn Task>;

/// Suspension requested by a task step.
pub(crate) struct WaitRequest {
    pub(crate) condition: Option<Arc<dyn Waitable>>,
    pub(crate) deadline: Option<Instant>,
}

impl WaitRequest {
    pub(crate) fn is_satisfied(&self, now: Instant) -> WakeReason {
        if let Some(condition) = &self.condition {
            if condition.is_ready() {
                return WakeReason::Ready;
            }
        }
        match self.deadline {
            Some(deadline) if now >= deadline => WakeReason::Deadline,
            _ => WakeReason::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeReason {
    Pending,
    Ready,
    Deadline,
}

/// Per-dispatch view a task step gets of the kernel.
pub struct TaskContext<'a> {
    handle: TaskHandle,
    config: &'a TaskConfig,
    now: Instant,
    timed_out: bool,
    wait: Option<WaitRequest>,
    stack_used: usize,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(handle: TaskHandle, config: &'a TaskConfig, now: Instant, timed_out: bool) -> Self {
        Self {
            handle,
            config,
            now,
            timed_out,
            wait: None,
            stack_used: 0,
        }
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn priority(&self) -> TaskPriority {
        self.config.priority
    }

    /// Kernel time at the start of this step
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Take the oldest message from `channel`, blocking up to `timeout`.
    ///
    /// `Timeout::Forever` only ever yields a message or `WouldBlock`.
    pub fn receive<const N: usize>(
        &mut self,
        channel: &Arc<EventChannel<N>>,
        timeout: Timeout,
    ) -> Result<TaskMessage, RecvError> {
        if let Some(message) = channel.try_receive() {
            self.timed_out = false;
            return Ok(message);
        }
        let condition: Arc<dyn Waitable> = channel.clone();
        self.block_on(condition, timeout)?;
        Err(RecvError::WouldBlock)
    }

    /// Wait until `condition` is ready, up to `timeout`.
    pub fn wait<W>(&mut self, condition: &Arc<W>, timeout: Timeout) -> Result<(), RecvError>
    where
        W: Waitable + 'static,
    {
        if condition.is_ready() {
            self.timed_out = false;
            return Ok(());
        }
        let condition: Arc<dyn Waitable> = condition.clone();
        self.block_on(condition, timeout)?;
        Err(RecvError::WouldBlock)
    }

    /// Sleep for `ticks`. Return the result from the step.
    pub fn delay(&mut self, ticks: Ticks) -> TaskAction {
        if ticks.is_zero() {
            return TaskAction::Continue;
        }
        self.wait = Some(WaitRequest {
            condition: None,
            deadline: Some(self.now.after(ticks)),
        });
        TaskAction::Blocked
    }

    /// Record the deepest stack use seen during this step, in bytes.
    pub fn note_stack_usage(&mut self, bytes: usize) {
        self.stack_used = self.stack_used.max(bytes);
    }

    fn block_on(&mut self, condition: Arc<dyn Waitable>, timeout: Timeout) -> Result<(), RecvError> {
        if timeout.is_no_wait() || core::mem::take(&mut self.timed_out) {
            return Err(RecvError::Timeout);
        }
        self.wait = Some(WaitRequest {
            condition: Some(condition),
            deadline: timeout.deadline(self.now),
        });
        Ok(())
    }

    pub(crate) fn take_wait(&mut self) -> Option<WaitRequest> {
        self.wait.take()
    }

    pub(crate) fn stack_used(&self) -> usize {
        self.stack_used
    }
}

impl fmt::Debug for TaskContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("handle", &self.handle)
            .field("name", &self.config.name)
            .field("now", &self.now)
            .field("timed_out", &self.timed_out)
            .finish()
    }
}
