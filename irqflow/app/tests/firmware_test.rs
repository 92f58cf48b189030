//! Firmware core on the simulated board: setup order, ISR path, power
//! hooks and task bootstrap.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use irqflow_app::{system_setup, AppConfig, Interrupts, System};
use irqflow_core::EventKind;
use irqflow_hal::{pin_mask, IrqLine, Level, PinMode};
use irqflow_kernel::{
    Fault, HaltStrategy, IdleHooks, Kernel, KernelConfig, KernelError, TaskState, WfiPort,
};
use irqflow_queue::TaskMessage;
use irqflow_sim::{BoardOp, SimBoard, SimTransport};

const BUTTON: u32 = 16;
const INDICATOR: u32 = 10;

struct PanicHalt {
    seen: Arc<Mutex<Vec<Fault>>>,
}

impl HaltStrategy for PanicHalt {
    fn halt(&self, fault: &Fault) -> ! {
        self.seen.lock().unwrap().push(*fault);
        panic!("halted: {fault}");
    }
}

fn boot(kernel: Kernel, config: AppConfig) -> (Arc<SimBoard>, System<SimBoard>, Interrupts<SimBoard>) {
    let board = Arc::new(SimBoard::new());
    let (system, interrupts) = system_setup(Arc::new(kernel), Arc::clone(&board), config);
    (board, system, interrupts)
}

fn boot_default() -> (Arc<SimBoard>, System<SimBoard>, Interrupts<SimBoard>) {
    boot(Kernel::new(KernelConfig::default()), AppConfig::default())
}

fn press(board: &SimBoard, interrupts: &mut Interrupts<SimBoard>) {
    board.script_pin(BUTTON, [Level::High; 10]);
    board.raise(IrqLine::Gpio, pin_mask(BUTTON));
    interrupts.gpio_isr();
}

#[test]
fn setup_runs_in_fixed_order_and_enables_interrupts_last() {
    let (board, system, interrupts) = boot_default();

    assert_eq!(
        board.ops(),
        vec![
            BoardOp::ClockMax,
            BoardOp::CacheConfigDefault,
            BoardOp::CacheEnable,
            BoardOp::FpuEnable,
            BoardOp::FpuLazyStacking,
            BoardOp::LowPowerInit,
            BoardOp::RtcOscillatorDisable,
            BoardOp::LedInit,
            BoardOp::LedOut(0),
            BoardOp::ButtonInit,
            BoardOp::Configure(BUTTON, PinMode::Input),
            BoardOp::IrqClear(IrqLine::Gpio, pin_mask(BUTTON)),
            BoardOp::IrqEnable(IrqLine::Gpio, pin_mask(BUTTON)),
            BoardOp::LineEnable(IrqLine::Gpio),
            BoardOp::Configure(INDICATOR, PinMode::Output),
            BoardOp::Write(INDICATOR, Level::High),
            BoardOp::GlobalEnable,
        ]
    );
    assert!(interrupts.is_gpio_registered(BUTTON));
    assert!(system.kernel().heap_used() > 0);
    assert!(system.channel().is_empty());
}

#[test]
fn periodic_timer_is_wired_when_enabled() {
    let config = AppConfig::builder().periodic_timer(true).build();
    let (board, system, mut interrupts) = boot(Kernel::new(KernelConfig::default()), config);

    assert!(board.is_line_enabled(IrqLine::Ctimer));
    board.raise(IrqLine::Ctimer, 1);
    assert_eq!(interrupts.ctimer_isr(), 1);
    assert_eq!(system.channel().try_receive(), Some(TaskMessage::TIMER));
}

#[test]
fn confirmed_press_sends_one_button_message() {
    let (board, system, mut interrupts) = boot_default();

    press(&board, &mut interrupts);

    assert_eq!(system.channel().try_receive(), Some(TaskMessage::BUTTON));
    assert_eq!(system.channel().try_receive(), None);
    assert_eq!(board.pending(IrqLine::Gpio), 0);
    assert_eq!(board.busy_wait_ns(), 20_000_000);
}

#[test]
fn bounce_sends_nothing() {
    let (board, system, mut interrupts) = boot_default();

    board.script_pin(BUTTON, [Level::High, Level::High, Level::Low]);
    board.raise(IrqLine::Gpio, pin_mask(BUTTON));
    assert_eq!(interrupts.gpio_isr(), pin_mask(BUTTON));

    assert!(system.channel().is_empty());
    assert_eq!(board.busy_wait_ns(), 4_000_000);
}

#[test]
fn disabled_source_stays_pending() {
    let (board, system, mut interrupts) = boot_default();

    board.raise(IrqLine::Gpio, pin_mask(3));
    assert_eq!(interrupts.gpio_isr(), 0);

    assert_eq!(board.pending(IrqLine::Gpio), pin_mask(3));
    assert!(system.channel().is_empty());
}

#[test]
fn full_channel_drops_and_counts() {
    let (board, system, mut interrupts) = boot_default();
    let hooks = system.power_hooks();

    for _ in 0..8 {
        hooks.on_idle_wake(irqflow_core::Ticks::MAX);
    }
    press(&board, &mut interrupts);

    let stats = system.channel().stats();
    assert_eq!(stats.accepted, 8);
    assert_eq!(stats.dropped, 1);
    assert!(std::iter::from_fn(|| system.channel().try_receive())
        .all(|message| message.kind() == EventKind::Wake));
}

#[test]
fn power_hooks_drive_indicator_and_always_send_wake() {
    let (board, system, _interrupts) = boot_default();
    let hooks = system.power_hooks();
    board.clear_ops();

    hooks.on_idle_sleep(irqflow_core::Ticks::MAX);
    assert_eq!(board.level(INDICATOR), Level::Low);
    hooks.on_idle_wake(irqflow_core::Ticks::MAX);
    hooks.on_idle_wake(irqflow_core::Ticks::MAX);

    assert_eq!(
        board.ops(),
        vec![
            BoardOp::Write(INDICATOR, Level::Low),
            BoardOp::DeepSleep,
            BoardOp::Write(INDICATOR, Level::High),
            BoardOp::Write(INDICATOR, Level::High),
        ]
    );
    assert_eq!(system.channel().len(), 2);
}

#[test]
fn indicator_can_be_left_out_of_power_hooks() {
    let config = AppConfig::builder().indicator_in_power_hooks(false).build();
    let (board, system, _interrupts) = boot(Kernel::new(KernelConfig::default()), config);
    let hooks = system.power_hooks();
    board.clear_ops();

    hooks.on_idle_sleep(irqflow_core::Ticks::MAX);
    hooks.on_idle_wake(irqflow_core::Ticks::MAX);

    assert_eq!(board.ops(), vec![BoardOp::DeepSleep]);
    assert_eq!(system.channel().try_receive(), Some(TaskMessage::WAKE));
}

#[test]
fn registrars_finish_before_console_serves() {
    let (_board, system, _interrupts) = boot_default();
    let transport = Arc::new(SimTransport::new());
    transport.push_line("gpio read 16");
    transport.push_line("reboot");

    let handles = system.spawn_tasks(Arc::clone(&transport)).unwrap();
    system.kernel().run_until_idle();

    let kernel = system.kernel();
    assert_eq!(kernel.task_state(handles.gpio), Some(TaskState::Terminated));
    assert_eq!(kernel.task_state(handles.iom), Some(TaskState::Terminated));
    assert_eq!(kernel.task_state(handles.console), Some(TaskState::Blocked));
    assert_eq!(kernel.task_state(handles.application), Some(TaskState::Blocked));
    assert!(system.registry().is_sealed());
    assert_eq!(system.registry().names(), vec!["gpio", "iom"]);
    assert_eq!(
        transport.output(),
        vec!["pin 16 = 0".to_string(), "error: unknown command 'reboot'".to_string()]
    );
}

#[test]
fn press_toggles_application_led() {
    let (board, system, mut interrupts) = boot_default();
    system.spawn_tasks(Arc::new(SimTransport::new())).unwrap();
    system.kernel().run_until_idle();

    press(&board, &mut interrupts);
    system.kernel().run_until_idle();
    assert_eq!(board.leds(), 1 << 1);
    assert_eq!(system.stats().button_presses(), 1);

    press(&board, &mut interrupts);
    system.kernel().run_until_idle();
    assert_eq!(board.leds(), 0);
    assert_eq!(system.stats().button_presses(), 2);
}

#[test]
fn press_requests_yield_only_when_configured() {
    let config = AppConfig::builder().yield_from_isr(true).build();
    let (board, system, mut interrupts) = boot(Kernel::new(KernelConfig::default()), config);
    system.spawn_tasks(Arc::new(SimTransport::new())).unwrap();
    system.kernel().run_until_idle();

    press(&board, &mut interrupts);
    assert!(system.kernel().is_yield_requested());
    system.kernel().run_until_idle();
    assert!(!system.kernel().is_yield_requested());

    let (board, system, mut interrupts) = boot_default();
    system.spawn_tasks(Arc::new(SimTransport::new())).unwrap();
    system.kernel().run_until_idle();

    press(&board, &mut interrupts);
    assert!(!system.kernel().is_yield_requested());
}

#[test]
fn task_creation_beyond_heap_halts() {
    let faults = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::builder(KernelConfig::builder().heap_bytes(1024).build())
        .with_halt_strategy(PanicHalt {
            seen: Arc::clone(&faults),
        })
        .build();
    let (_board, system, _interrupts) = boot(kernel, AppConfig::default());

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = system.spawn_tasks(Arc::new(SimTransport::new()));
    }));

    assert!(result.is_err());
    assert!(system.kernel().is_halted());
    assert_eq!(system.kernel().task_count(), 0);
    assert!(matches!(
        faults.lock().unwrap().as_slice(),
        [Fault::AllocationFailed { requested: 2144, .. }]
    ));
}

#[test]
fn failed_task_creation_halts_instead_of_starting() {
    let faults = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::builder(KernelConfig::default())
        .with_halt_strategy(PanicHalt {
            seen: Arc::clone(&faults),
        })
        .build();
    let (_board, system, _interrupts) = boot(kernel, AppConfig::default());
    // The scheduler has already run, so no task can be created.
    system.kernel().dispatch_once();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        system.system_start(Arc::new(SimTransport::new()), &WfiPort);
    }));

    assert!(result.is_err());
    assert!(system.kernel().is_halted());
    assert_eq!(system.kernel().task_count(), 0);
    assert_eq!(
        faults.lock().unwrap().as_slice(),
        &[Fault::Bootstrap(KernelError::AlreadyStarted)]
    );
}

#[test]
fn button_pin_past_the_bank_enables_no_gpio_bits() {
    let config = AppConfig::builder().button_pin(70).build();
    let (board, _system, _interrupts) = boot(Kernel::new(KernelConfig::default()), config);

    assert_eq!(board.enabled(IrqLine::Gpio), 0);
    assert!(board.ops().contains(&BoardOp::IrqEnable(IrqLine::Gpio, 0)));
}
