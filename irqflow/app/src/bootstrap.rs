//! Board setup and task bootstrap.

use irqflow_core::PriorityTier;
use irqflow_hal::{pin_mask, Board, IrqLine, Level, PinMode};
use irqflow_kernel::sync::Arc;
use irqflow_kernel::{
    Fault, IdlePort, Kernel, KernelResult, StartupBarrier, TaskConfig, TaskHandle,
};
use irqflow_queue::{TaskMessage, APPLICATION_QUEUE_CAPACITY};

use crate::application::{AppStats, ApplicationTask};
use crate::button::ButtonHandler;
use crate::config::{AppConfig, PERIODIC_TIMER_BIT, TASK_STACK_DEPTH};
use crate::console::{CommandRegistry, ConsoleTask, Transport};
use crate::isr::Interrupts;
use crate::power::PowerHooks;
use crate::services::{GpioService, IomService};
use crate::AppChannel;

pub const GPIO_TASK: TaskConfig =
    TaskConfig::new("GPIO", TASK_STACK_DEPTH, PriorityTier::REGISTRATION_PRIORITY);
pub const IOM_TASK: TaskConfig =
    TaskConfig::new("IOM", TASK_STACK_DEPTH, PriorityTier::REGISTRATION_PRIORITY);
pub const CONSOLE_TASK: TaskConfig =
    TaskConfig::new("Console", TASK_STACK_DEPTH, PriorityTier::INTERACTIVE_PRIORITY);
pub const APPLICATION_TASK: TaskConfig =
    TaskConfig::new("Application", TASK_STACK_DEPTH, PriorityTier::INTERACTIVE_PRIORITY);

/// Tasks that must arrive at the startup barrier before the console serves
const REGISTRATION_TASKS: usize = 2;

/// Handles of the four firmware tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandles {
    pub gpio: TaskHandle,
    pub iom: TaskHandle,
    pub console: TaskHandle,
    pub application: TaskHandle,
}

/// Everything `system_setup` builds that the tasks and hooks share.
pub struct System<B: Board> {
    kernel: Arc<Kernel>,
    board: Arc<B>,
    channel: Arc<AppChannel>,
    registry: Arc<CommandRegistry>,
    barrier: Arc<StartupBarrier>,
    stats: Arc<AppStats>,
    config: AppConfig,
}

/// One-shot board initialization.
///
/// Creates the application channel before any handler that sends to it
/// is registered, and enables interrupts globally only as the last step.
/// The returned [`Interrupts`] is what the interrupt vector must call.
pub fn system_setup<B: Board>(
    kernel: Arc<Kernel>,
    board: Arc<B>,
    config: AppConfig,
) -> (System<B>, Interrupts<B>) {
    board.clock_max();
    board.cache_config_default();
    board.cache_enable();
    board.fpu_enable();
    board.fpu_lazy_stacking();

    board.low_power_init();
    board.rtc_oscillator_disable();

    board.init_leds();
    board.led_out(0);
    board.init_buttons();

    let channel: Arc<AppChannel> = kernel.create_channel::<APPLICATION_QUEUE_CAPACITY>();
    let mut interrupts = Interrupts::new(Arc::clone(&board));

    let mut button = ButtonHandler::new(
        Arc::clone(&board),
        Arc::clone(&channel),
        Arc::clone(&kernel),
        config.clone(),
    );
    interrupts.register_gpio(config.button_pin, move || {
        button.on_edge();
    });
    board.configure(config.button_pin, PinMode::Input);

    let button_mask = pin_mask(config.button_pin);
    if button_mask == 0 {
        log::warn!("button pin {} has no GPIO interrupt bit", config.button_pin);
    }
    board.clear(IrqLine::Gpio, button_mask);
    board.enable(IrqLine::Gpio, button_mask);
    board.enable_line(IrqLine::Gpio);

    if config.periodic_timer {
        let timer_channel = Arc::clone(&channel);
        interrupts.register_ctimer(PERIODIC_TIMER_BIT, move || {
            timer_channel.send_from_interrupt(TaskMessage::TIMER);
        });
        board.enable(IrqLine::Ctimer, pin_mask(PERIODIC_TIMER_BIT));
        board.enable_line(IrqLine::Ctimer);
    }

    board.configure(config.indicator_pin, PinMode::Output);
    board.write(config.indicator_pin, Level::High);

    board.enable_global();
    log::info!("system setup complete");

    let system = System {
        kernel,
        board,
        channel,
        registry: Arc::new(CommandRegistry::new()),
        barrier: Arc::new(StartupBarrier::new(REGISTRATION_TASKS)),
        stats: Arc::new(AppStats::default()),
        config,
    };
    (system, interrupts)
}

impl<B: Board> System<B> {
    /// Create the four tasks: both registrars at the registration tier,
    /// then the console and the application at the interactive tier.
    pub fn spawn_tasks<T>(&self, transport: Arc<T>) -> KernelResult<TaskHandles>
    where
        T: Transport + 'static,
    {
        let gpio = self.kernel.create_task(
            GPIO_TASK,
            GpioService::new(
                Arc::clone(&self.board),
                Arc::clone(&self.registry),
                Arc::clone(&self.barrier),
            ),
        )?;
        let iom = self.kernel.create_task(
            IOM_TASK,
            IomService::new(
                Arc::clone(&self.board),
                Arc::clone(&self.registry),
                Arc::clone(&self.barrier),
            ),
        )?;
        let console = self.kernel.create_task(
            CONSOLE_TASK,
            ConsoleTask::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.barrier),
                transport,
            ),
        )?;
        let application = self.kernel.create_task(
            APPLICATION_TASK,
            ApplicationTask::new(
                Arc::clone(&self.board),
                Arc::clone(&self.channel),
                Arc::clone(&self.stats),
                self.config.application_led,
            ),
        )?;

        Ok(TaskHandles {
            gpio,
            iom,
            console,
            application,
        })
    }

    /// Sleep/wake hooks for the kernel's idle path
    pub fn power_hooks(&self) -> PowerHooks<B> {
        let indicator = self
            .config
            .indicator_in_power_hooks
            .then_some(self.config.indicator_pin);
        PowerHooks::new(Arc::clone(&self.board), Arc::clone(&self.channel), indicator)
    }

    /// Create the tasks and start the scheduler. Never returns.
    ///
    /// A task set that cannot be created in full halts through the
    /// kernel's fault path instead of scheduling the partial set.
    pub fn system_start<T>(&self, transport: Arc<T>, port: &dyn IdlePort) -> !
    where
        T: Transport + 'static,
    {
        match self.spawn_tasks(transport) {
            Ok(handles) => log::info!("tasks created: {:?}", handles),
            Err(err) => self.kernel.fault(Fault::Bootstrap(err)),
        }
        let hooks = self.power_hooks();
        self.kernel.start(&hooks, port)
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    pub fn board(&self) -> &Arc<B> {
        &self.board
    }

    pub fn channel(&self) -> &Arc<AppChannel> {
        &self.channel
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<AppStats> {
        &self.stats
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
