//! Runs the whole firmware on the host against a scripted scenario.

use std::sync::{Arc, Mutex, Weak};

use irqflow_app::{system_setup, AppConfig, Interrupts, System, TaskHandles};
use irqflow_core::{Instant, Ticks};
use irqflow_hal::{pin_mask, IrqLine, Level};
use irqflow_kernel::{IdlePort, Kernel};
use irqflow_queue::ChannelStats;

use crate::board::SimBoard;
use crate::error::SimError;
use crate::scenario::{Scenario, ScheduledEvent, SimEvent};
use crate::transport::SimTransport;

/// Sample on which a scripted bounce reads released
const BOUNCE_AT_SAMPLE: usize = 3;

/// The simulated hardware outside the CPU: scenario clock and interrupt lines.
pub struct SimHardware {
    kernel: Arc<Kernel>,
    board: Arc<SimBoard>,
    transport: Arc<SimTransport>,
    interrupts: Mutex<Interrupts<SimBoard>>,
    scenario: Mutex<Scenario>,
    config: AppConfig,
}

impl SimHardware {
    /// Let time pass until the next scenario event, but no further than
    /// `max`. Returns true if an event fired.
    ///
    /// An unbounded wait with no event left never returns: nothing can
    /// raise an interrupt any more, so the thread parks.
    pub fn wait(&self, max: Ticks) -> bool {
        let now = self.kernel.now();
        let limit = (max != Ticks::MAX).then(|| now.after(max));
        let next = self
            .scenario
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_due(limit);

        match next {
            Some(ScheduledEvent { at, event }) => {
                if at > now {
                    self.kernel.advance(now.until(at));
                }
                self.apply(event);
                true
            }
            None => match limit {
                Some(limit) => {
                    self.kernel.advance(now.until(limit));
                    false
                }
                None => self.park_forever(),
            },
        }
    }

    fn park_forever(&self) -> ! {
        log::info!(
            "sim: scenario exhausted at tick {}, no wake source left",
            self.kernel.now().raw()
        );
        loop {
            std::thread::park();
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.scenario
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }

    fn apply(&self, event: SimEvent) {
        log::debug!("sim: tick {} {:?}", self.kernel.now().raw(), event);
        let samples = self.config.debounce.samples() as usize;
        let pressed = self.config.debounce.asserted;
        let pin = self.config.button_pin;
        match event {
            SimEvent::Press => {
                self.board.script_pin(pin, std::iter::repeat(pressed).take(samples));
                self.fire(IrqLine::Gpio, pin_mask(pin));
            }
            SimEvent::Bounce => {
                let levels =
                    (0..=BOUNCE_AT_SAMPLE).map(|i| if i == BOUNCE_AT_SAMPLE { !pressed } else { pressed });
                self.board.script_pin(pin, levels);
                self.fire(IrqLine::Gpio, pin_mask(pin));
            }
            SimEvent::Timer => self.fire(IrqLine::Ctimer, 1),
            SimEvent::Command(line) => self.transport.push_line(line),
        }
    }

    fn fire(&self, line: IrqLine, mask: u64) {
        self.board.raise(line, mask);
        if !self.board.is_global_enabled() {
            return;
        }
        self.interrupts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .on_interrupt(line);
    }
}

/// Idle wait that advances the simulated clock.
pub struct SimPort {
    hardware: Arc<SimHardware>,
}

impl IdlePort for SimPort {
    fn wait_for_interrupt(&self, ticks: Ticks) {
        self.hardware.wait(ticks);
    }
}

/// Final state after a scenario ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimReport {
    pub now: Instant,
    pub button_presses: u32,
    pub wakes: u32,
    pub timer_ticks: u32,
    pub channel: ChannelStats,
    pub leds: u32,
    pub sleeps: u32,
    pub busy_wait_ns: u64,
    pub console: Vec<String>,
}

/// Firmware plus simulated hardware.
pub struct Simulator {
    system: System<SimBoard>,
    hardware: Arc<SimHardware>,
    handles: Option<TaskHandles>,
}

impl Simulator {
    pub fn new(kernel: Kernel, config: AppConfig, scenario: Scenario, transport: SimTransport) -> Self {
        let kernel = Arc::new(kernel);
        let board = Arc::new(SimBoard::new());
        let transport = Arc::new(transport);
        let (system, interrupts) = system_setup(Arc::clone(&kernel), Arc::clone(&board), config.clone());

        let hardware = Arc::new(SimHardware {
            kernel,
            board: Arc::clone(&board),
            transport,
            interrupts: Mutex::new(interrupts),
            scenario: Mutex::new(scenario),
            config,
        });

        // Deep sleep lasts until the next scripted event.
        let weak: Weak<SimHardware> = Arc::downgrade(&hardware);
        board.set_wake_source(move || {
            if let Some(hardware) = weak.upgrade() {
                hardware.wait(Ticks::MAX);
            }
        });

        Self {
            system,
            hardware,
            handles: None,
        }
    }

    pub fn system(&self) -> &System<SimBoard> {
        &self.system
    }

    pub fn board(&self) -> &Arc<SimBoard> {
        &self.hardware.board
    }

    pub fn transport(&self) -> &Arc<SimTransport> {
        &self.hardware.transport
    }

    pub fn hardware(&self) -> &Arc<SimHardware> {
        &self.hardware
    }

    pub fn port(&self) -> SimPort {
        SimPort {
            hardware: Arc::clone(&self.hardware),
        }
    }

    /// Create the firmware tasks (once).
    pub fn spawn(&mut self) -> Result<TaskHandles, SimError> {
        if let Some(handles) = self.handles {
            return Ok(handles);
        }
        let handles = self.system.spawn_tasks(Arc::clone(&self.hardware.transport))?;
        self.handles = Some(handles);
        Ok(handles)
    }

    /// Run the scheduler until every scenario event has fired and the
    /// tasks have drained the resulting work.
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        self.spawn()?;
        let kernel = Arc::clone(self.system.kernel());
        let hooks = self.system.power_hooks();
        let port = self.port();

        kernel.run_until_idle();
        while !self.hardware.is_exhausted() && !kernel.is_halted() {
            kernel.idle_once(&hooks, &port);
            kernel.run_until_idle();
        }
        Ok(self.report())
    }

    /// Hand control to the scheduler for good
    pub fn run_forever(mut self) -> Result<(), SimError> {
        self.spawn()?;
        let port = self.port();
        let hooks = self.system.power_hooks();
        self.system.kernel().start(&hooks, &port)
    }

    pub fn report(&self) -> SimReport {
        let stats = self.system.stats();
        let board = &self.hardware.board;
        SimReport {
            now: self.system.kernel().now(),
            button_presses: stats.button_presses(),
            wakes: stats.wakes(),
            timer_ticks: stats.timer_ticks(),
            channel: self.system.channel().stats(),
            leds: board.leds(),
            sleeps: board.sleep_count(),
            busy_wait_ns: board.busy_wait_ns(),
            console: self.hardware.transport.output(),
        }
    }

    /// Level of the indicator pin
    pub fn indicator(&self) -> Level {
        self.hardware.board.level(self.hardware.config.indicator_pin)
    }
}
