//! The scheduler proper: task table, dispatch loop, idle path.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use irqflow_core::{Instant, TaskMessage, TaskPriority, Ticks};
use irqflow_queue::EventChannel;

use crate::config::{KernelConfig, QUEUE_CONTROL_BLOCK_BYTES};
use crate::fault::{self, Fault, HaltStrategy, SpinHalt};
use crate::idle::{IdleHooks, IdlePort};
use crate::scheduler::{self, Candidate};
use crate::sync::{Arc, Mutex};
use crate::task::{
    BoxedTask, Task, TaskAction, TaskConfig, TaskContext, TaskHandle, TaskState, WaitRequest,
    WakeReason,
};
use crate::trace::{records, TraceHook};

/// Handles are a `u8`
const MAX_TASKS: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Tasks can only be created before the scheduler starts
    AlreadyStarted,
    /// Priority 0 and anything above the maximum are not schedulable
    InvalidPriority(TaskPriority),
    /// Task table is full
    TooManyTasks,
    /// A fault hook already ran
    Halted,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "scheduler already started"),
            Self::InvalidPriority(prio) => write!(f, "invalid task priority {}", prio.raw()),
            Self::TooManyTasks => write!(f, "task table full"),
            Self::Halted => write!(f, "kernel halted"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}

#[cfg(feature = "defmt")]
impl defmt::Format for KernelError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            KernelError::AlreadyStarted => defmt::write!(fmt, "AlreadyStarted"),
            KernelError::InvalidPriority(prio) => defmt::write!(fmt, "InvalidPriority({})", prio),
            KernelError::TooManyTasks => defmt::write!(fmt, "TooManyTasks"),
            KernelError::Halted => defmt::write!(fmt, "Halted"),
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;

struct TaskSlot {
    config: TaskConfig,
    state: TaskState,
    task: Option<BoxedTask>,
    wait: Option<WaitRequest>,
    timed_out: bool,
    last_run: u64,
}

struct Inner {
    now: Instant,
    heap_used: usize,
    started: bool,
    slots: Vec<TaskSlot>,
    dispatch_seq: u64,
    current: Option<TaskHandle>,
    prev_prio: u8,
}

impl Inner {
    fn wake_blocked(&mut self) {
        let now = self.now;
        for slot in self.slots.iter_mut() {
            if slot.state != TaskState::Blocked {
                continue;
            }
            let reason = match &slot.wait {
                Some(wait) => wait.is_satisfied(now),
                None => WakeReason::Ready,
            };
            match reason {
                WakeReason::Pending => {}
                WakeReason::Ready => {
                    slot.wait = None;
                    slot.state = TaskState::Ready;
                }
                WakeReason::Deadline => {
                    let condition = slot.wait.take().and_then(|wait| wait.condition);
                    if let Some(condition) = &condition {
                        condition.unregister_waiter();
                    }
                    slot.timed_out = condition.is_some();
                    slot.state = TaskState::Ready;
                }
            }
        }
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state == TaskState::Ready)
            .map(|(index, slot)| Candidate {
                index,
                priority: slot.config.priority,
                last_run: slot.last_run,
            })
            .collect()
    }

    fn expected_idle(&self) -> Ticks {
        let mut expected = Ticks::MAX;
        for slot in &self.slots {
            match slot.state {
                TaskState::Ready | TaskState::Running => return Ticks::ZERO,
                TaskState::Blocked => {
                    if let Some(deadline) = slot.wait.as_ref().and_then(|wait| wait.deadline) {
                        expected = expected.min(self.now.until(deadline));
                    }
                }
                TaskState::Terminated => {}
            }
        }
        expected
    }
}

pub struct KernelBuilder {
    config: KernelConfig,
    halt: Option<Box<dyn HaltStrategy>>,
    trace: Option<TraceHook>,
}

impl KernelBuilder {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            halt: None,
            trace: None,
        }
    }

    pub fn with_halt_strategy<H>(mut self, halt: H) -> Self
    where
        H: HaltStrategy + 'static,
    {
        self.halt = Some(Box::new(halt));
        self
    }

    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn build(self) -> Kernel {
        Kernel {
            config: self.config,
            inner: Mutex::new(Inner {
                now: Instant::ZERO,
                heap_used: 0,
                started: false,
                slots: Vec::new(),
                dispatch_seq: 0,
                current: None,
                prev_prio: 0,
            }),
            halt: self.halt.unwrap_or_else(|| Box::new(SpinHalt)),
            trace: self.trace,
            halted: AtomicBool::new(false),
            yield_requested: AtomicBool::new(false),
        }
    }
}

/// Priority scheduler for a fixed set of tasks.
///
/// The kernel is shared by reference between the bootstrap code, the
/// idle hooks and interrupt handlers. Its lock is never held while a
/// task step, an idle hook, a trace hook or the halt strategy runs.
pub struct Kernel {
    config: KernelConfig,
    inner: Mutex<Inner>,
    halt: Box<dyn HaltStrategy>,
    trace: Option<TraceHook>,
    halted: AtomicBool,
    yield_requested: AtomicBool,
}

impl Kernel {
    /// Kernel with the default [`SpinHalt`] strategy and no trace hook
    pub fn new(config: KernelConfig) -> Self {
        KernelBuilder::new(config).build()
    }

    pub fn builder(config: KernelConfig) -> KernelBuilder {
        KernelBuilder::new(config)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Create a task. Only valid before the scheduler starts.
    ///
    /// Diverts to the allocation-failure hook when the task's stack and
    /// control block do not fit in the remaining heap.
    pub fn create_task<T>(&self, config: TaskConfig, task: T) -> KernelResult<TaskHandle>
    where
        T: Task + 'static,
    {
        if !config.priority.is_valid() {
            return Err(KernelError::InvalidPriority(config.priority));
        }
        if self.is_halted() {
            return Err(KernelError::Halted);
        }

        let mut inner = self.inner.lock();
        if inner.started {
            return Err(KernelError::AlreadyStarted);
        }
        if inner.slots.len() >= MAX_TASKS {
            return Err(KernelError::TooManyTasks);
        }
        let cost = config.heap_cost();
        if inner.heap_used.saturating_add(cost) > self.config.heap_bytes {
            drop(inner);
            fault::on_allocation_failure(self, cost);
        }
        inner.heap_used += cost;

        let handle = TaskHandle(inner.slots.len() as u8);
        inner.slots.push(TaskSlot {
            config,
            state: TaskState::Ready,
            task: Some(Box::new(task)),
            wait: None,
            timed_out: false,
            last_run: 0,
        });
        drop(inner);

        log::info!(
            "{}: created task {} {} (stack {} words, priority {})",
            self.config.name,
            handle,
            config.name,
            config.stack_depth,
            config.priority.raw()
        );
        self.emit(records::task::CREATE, &[handle.raw(), config.priority.raw()]);
        Ok(handle)
    }

    /// Create an event channel, charging its storage to the heap.
    pub fn create_channel<const N: usize>(&self) -> Arc<EventChannel<N>> {
        let cost = QUEUE_CONTROL_BLOCK_BYTES + N * core::mem::size_of::<TaskMessage>();
        let mut inner = self.inner.lock();
        if inner.heap_used.saturating_add(cost) > self.config.heap_bytes {
            drop(inner);
            fault::on_allocation_failure(self, cost);
        }
        inner.heap_used += cost;
        drop(inner);

        log::debug!("{}: created channel of {} messages", self.config.name, N);
        Arc::new(EventChannel::new())
    }

    /// Run one step of the highest-priority ready task.
    ///
    /// Returns false when nothing was ready (or the kernel is halted).
    pub fn dispatch_once(&self) -> bool {
        if self.is_halted() {
            return false;
        }
        if self.take_yield_request() {
            self.emit(records::sched::YIELD, &[]);
        }

        let mut inner = self.inner.lock();
        let first_dispatch = !core::mem::replace(&mut inner.started, true);
        let task_count = inner.slots.len();
        inner.wake_blocked();

        let Some(next) = scheduler::select(inner.candidates()) else {
            let prev = core::mem::replace(&mut inner.prev_prio, 0);
            drop(inner);
            if first_dispatch {
                self.emit(records::sched::START, &[task_count as u8]);
            }
            if prev != 0 {
                self.emit(records::sched::IDLE, &[prev]);
            }
            return false;
        };

        inner.dispatch_seq += 1;
        let seq = inner.dispatch_seq;
        let now = inner.now;
        let handle = TaskHandle(next.index as u8);
        let prio = next.priority.raw();
        let prev = core::mem::replace(&mut inner.prev_prio, prio);
        inner.current = Some(handle);

        let slot = &mut inner.slots[next.index];
        let Some(mut task) = slot.task.take() else {
            slot.state = TaskState::Terminated;
            inner.current = None;
            return false;
        };
        slot.state = TaskState::Running;
        slot.last_run = seq;
        let timed_out = core::mem::take(&mut slot.timed_out);
        let config = slot.config;
        drop(inner);

        if first_dispatch {
            self.emit(records::sched::START, &[task_count as u8]);
        }
        if prev != prio {
            self.emit(records::sched::NEXT, &[prio, prev]);
        }

        let mut ctx = TaskContext::new(handle, &config, now, timed_out);
        let action = task.run(&mut ctx);
        let wait = ctx.take_wait();
        let stack_used = ctx.stack_used();

        if stack_used > config.stack_bytes() {
            fault::on_stack_overflow(self, handle, stack_used);
        }

        let mut inner = self.inner.lock();
        inner.current = None;
        let slot = &mut inner.slots[next.index];
        let finished = match action {
            TaskAction::Continue => {
                slot.state = TaskState::Ready;
                slot.task = Some(task);
                None
            }
            TaskAction::Blocked => {
                match wait {
                    Some(wait) => {
                        if let Some(condition) = &wait.condition {
                            condition.register_waiter();
                        }
                        slot.wait = Some(wait);
                        slot.state = TaskState::Blocked;
                    }
                    None => slot.state = TaskState::Ready,
                }
                slot.task = Some(task);
                None
            }
            TaskAction::Terminated => {
                slot.state = TaskState::Terminated;
                Some(task)
            }
        };
        drop(inner);

        if let Some(task) = finished {
            drop(task);
            log::info!("{}: task {} {} terminated", self.config.name, handle, config.name);
            self.emit(records::task::TERMINATE, &[handle.raw()]);
        }
        true
    }

    /// Dispatch until no task is ready. Returns the number of steps run.
    pub fn run_until_idle(&self) -> usize {
        let mut steps = 0;
        while self.dispatch_once() {
            steps += 1;
        }
        steps
    }

    /// One pass of the idle path.
    ///
    /// Short expected idle periods just wait for the next interrupt.
    /// Longer ones go through the sleep hook, the port wait (unless the
    /// hook already waited) and the wake hook. Returns the expected idle
    /// time that was handled.
    pub fn idle_once(&self, hooks: &dyn IdleHooks, port: &dyn IdlePort) -> Ticks {
        if self.is_halted() {
            return Ticks::ZERO;
        }
        let expected = self.inner.lock().expected_idle();
        if expected.is_zero() {
            return Ticks::ZERO;
        }
        if expected < self.config.expected_idle_before_sleep {
            if !self.is_yield_requested() {
                port.wait_for_interrupt(expected);
            }
            return expected;
        }

        let payload = expected.raw().to_le_bytes();
        self.emit(records::sched::SLEEP, &payload);
        let remaining = hooks.on_idle_sleep(expected);
        // A yield requested during the sleep hook ends the idle wait.
        if !remaining.is_zero() && !self.is_yield_requested() {
            port.wait_for_interrupt(remaining);
        }
        if self.is_halted() {
            return expected;
        }
        hooks.on_idle_wake(expected);
        self.emit(records::sched::WAKE, &payload);
        expected
    }

    /// Start scheduling. Never returns.
    pub fn start(&self, hooks: &dyn IdleHooks, port: &dyn IdlePort) -> ! {
        log::info!(
            "{}: scheduler starting with {} tasks at {} Hz ({})",
            self.config.name,
            self.task_count(),
            self.config.tick_hz,
            self.config.build_info.unwrap_or("no build info")
        );
        loop {
            self.run_until_idle();
            if self.is_halted() {
                core::hint::spin_loop();
                continue;
            }
            self.idle_once(hooks, port);
        }
    }

    /// Advance kernel time by one tick.
    pub fn tick(&self) {
        self.advance(Ticks(1));
    }

    pub fn advance(&self, ticks: Ticks) {
        if self.is_halted() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.now = inner.now.after(ticks);
    }

    /// Ask for a reschedule at the next opportunity. Interrupt-safe.
    pub fn request_yield(&self) {
        self.yield_requested.store(true, Ordering::Release);
    }

    /// Consume a pending yield request. The next dispatch does this.
    pub fn take_yield_request(&self) -> bool {
        self.yield_requested.swap(false, Ordering::AcqRel)
    }

    pub fn is_yield_requested(&self) -> bool {
        self.yield_requested.load(Ordering::Acquire)
    }

    /// Record `fault` and halt. Never returns.
    pub fn fault(&self, fault: Fault) -> ! {
        log::error!("{}: {}", self.config.name, fault);
        match fault {
            Fault::AllocationFailed { requested, .. } => {
                let requested = u32::try_from(requested).unwrap_or(u32::MAX);
                self.emit(records::fault::ALLOC, &requested.to_le_bytes());
            }
            Fault::StackOverflow { task, .. } => {
                self.emit(records::fault::STACK, &[task.raw()]);
            }
            Fault::Bootstrap(_) => self.emit(records::fault::BOOT, &[]),
        }
        self.halted.store(true, Ordering::SeqCst);
        self.halt.halt(&fault)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.inner.lock().started
    }

    pub fn now(&self) -> Instant {
        self.inner.lock().now
    }

    pub fn heap_used(&self) -> usize {
        self.inner.lock().heap_used
    }

    pub fn heap_available(&self) -> usize {
        self.config
            .heap_bytes
            .saturating_sub(self.inner.lock().heap_used)
    }

    pub fn task_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn task_state(&self, handle: TaskHandle) -> Option<TaskState> {
        self.inner
            .lock()
            .slots
            .get(handle.index())
            .map(|slot| slot.state)
    }

    pub fn descriptor(&self, handle: TaskHandle) -> Option<TaskConfig> {
        self.inner
            .lock()
            .slots
            .get(handle.index())
            .map(|slot| slot.config)
    }

    /// Handle, descriptor and state of every task in creation order
    pub fn tasks(&self) -> Vec<(TaskHandle, TaskConfig, TaskState)> {
        self.inner
            .lock()
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (TaskHandle(index as u8), slot.config, slot.state))
            .collect()
    }

    pub fn current_task(&self) -> Option<TaskHandle> {
        self.inner.lock().current
    }

    fn emit(&self, record: u8, payload: &[u8]) {
        if let Some(hook) = &self.trace {
            if let Err(err) = hook(record, payload, true) {
                log::debug!("trace record {} dropped: {}", record, err);
            }
        }
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Kernel")
            .field("name", &self.config.name)
            .field("now", &inner.now)
            .field("tasks", &inner.slots.len())
            .field("heap_used", &inner.heap_used)
            .field("started", &inner.started)
            .field("halted", &self.is_halted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irqflow_core::{PriorityTier, Timeout};
    use std::sync::Mutex as StdMutex;

    use crate::task::RecvError;

    fn kernel() -> Kernel {
        Kernel::new(KernelConfig::default())
    }

    fn config(name: &'static str, tier: PriorityTier) -> TaskConfig {
        TaskConfig::new(name, 128, tier.priority())
    }

    #[test]
    fn test_higher_priority_runs_first() {
        let kernel = kernel();
        let log = Arc::new(StdMutex::new(Vec::new()));

        for (name, tier) in [
            ("low", PriorityTier::Interactive),
            ("high", PriorityTier::Registration),
        ] {
            let log = Arc::clone(&log);
            kernel
                .create_task(config(name, tier), move |ctx: &mut TaskContext<'_>| {
                    log.lock().unwrap().push(ctx.name());
                    TaskAction::Terminated
                })
                .unwrap();
        }

        assert_eq!(kernel.run_until_idle(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["high", "low"]);
    }

    #[test]
    fn test_equal_priorities_share_round_robin() {
        let kernel = kernel();
        let log = Arc::new(StdMutex::new(Vec::new()));

        for name in ["a", "b"] {
            let log = Arc::clone(&log);
            let mut steps = 0;
            kernel
                .create_task(
                    config(name, PriorityTier::Interactive),
                    move |ctx: &mut TaskContext<'_>| {
                        log.lock().unwrap().push(ctx.name());
                        steps += 1;
                        if steps == 2 {
                            TaskAction::Terminated
                        } else {
                            TaskAction::Continue
                        }
                    },
                )
                .unwrap();
        }

        kernel.run_until_idle();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_blocked_receiver_wakes_on_send() {
        let kernel = kernel();
        let channel = kernel.create_channel::<4>();
        let received = Arc::new(StdMutex::new(Vec::new()));

        let handle = {
            let channel = Arc::clone(&channel);
            let received = Arc::clone(&received);
            kernel
                .create_task(
                    config("app", PriorityTier::Interactive),
                    move |ctx: &mut TaskContext<'_>| match ctx.receive(&channel, Timeout::Forever) {
                        Ok(message) => {
                            received.lock().unwrap().push(message.kind());
                            TaskAction::Continue
                        }
                        Err(RecvError::WouldBlock) => TaskAction::Blocked,
                        Err(RecvError::Timeout) => TaskAction::Continue,
                    },
                )
                .unwrap()
        };

        kernel.run_until_idle();
        assert_eq!(kernel.task_state(handle), Some(TaskState::Blocked));

        let outcome = channel.send_from_interrupt(TaskMessage::BUTTON);
        assert!(outcome.woke_receiver());
        kernel.run_until_idle();

        assert_eq!(*received.lock().unwrap(), vec![TaskMessage::BUTTON.kind()]);
        assert_eq!(kernel.task_state(handle), Some(TaskState::Blocked));
    }

    #[test]
    fn test_delay_blocks_until_deadline() {
        let kernel = kernel();
        let runs = Arc::new(StdMutex::new(0));
        let handle = {
            let runs = Arc::clone(&runs);
            kernel
                .create_task(
                    config("sleeper", PriorityTier::Interactive),
                    move |ctx: &mut TaskContext<'_>| {
                        *runs.lock().unwrap() += 1;
                        ctx.delay(Ticks(3))
                    },
                )
                .unwrap()
        };

        kernel.run_until_idle();
        assert_eq!(*runs.lock().unwrap(), 1);

        kernel.advance(Ticks(2));
        kernel.run_until_idle();
        assert_eq!(*runs.lock().unwrap(), 1);
        assert_eq!(kernel.task_state(handle), Some(TaskState::Blocked));

        kernel.tick();
        kernel.run_until_idle();
        assert_eq!(*runs.lock().unwrap(), 2);
    }

    #[test]
    fn test_creation_after_start_is_rejected() {
        let kernel = kernel();
        kernel.run_until_idle();
        let err = kernel
            .create_task(config("late", PriorityTier::Interactive), |_: &mut TaskContext<'_>| {
                TaskAction::Terminated
            })
            .unwrap_err();
        assert_eq!(err, KernelError::AlreadyStarted);
    }

    #[test]
    fn test_idle_priority_is_rejected() {
        let kernel = kernel();
        let err = kernel
            .create_task(
                TaskConfig::new("idle", 128, TaskPriority::IDLE),
                |_: &mut TaskContext<'_>| TaskAction::Terminated,
            )
            .unwrap_err();
        assert_eq!(err, KernelError::InvalidPriority(TaskPriority::IDLE));
    }

    #[test]
    fn test_heap_accounting() {
        let kernel = kernel();
        let task = config("t", PriorityTier::Interactive);
        kernel
            .create_task(task, |_: &mut TaskContext<'_>| TaskAction::Terminated)
            .unwrap();
        let _channel = kernel.create_channel::<8>();

        let expected =
            task.heap_cost() + QUEUE_CONTROL_BLOCK_BYTES + 8 * core::mem::size_of::<TaskMessage>();
        assert_eq!(kernel.heap_used(), expected);
        assert_eq!(kernel.heap_available(), kernel.config().heap_bytes - expected);
    }

    #[test]
    fn test_expected_idle_is_nearest_deadline() {
        let kernel = kernel();
        for ticks in [7, 4] {
            kernel
                .create_task(
                    config("sleeper", PriorityTier::Interactive),
                    move |ctx: &mut TaskContext<'_>| ctx.delay(Ticks(ticks)),
                )
                .unwrap();
        }
        kernel.run_until_idle();
        assert_eq!(kernel.inner.lock().expected_idle(), Ticks(4));
    }

    #[test]
    fn test_yield_request_is_consumed_once() {
        let kernel = kernel();
        assert!(!kernel.take_yield_request());
        kernel.request_yield();
        assert!(kernel.take_yield_request());
        assert!(!kernel.take_yield_request());
    }
}
