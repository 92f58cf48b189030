//! Simulated board.
//!
//! Implements every board trait on the host. Outputs and one-shot
//! initialization calls are appended to an operation log that tests
//! assert on; inputs come from per-pin scripts; busy-wait delays only
//! accumulate elapsed time.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use irqflow_hal::{
    ButtonArray, DelayNs, DelaySource, Gpio, InterruptController, InterruptStatus, IoMaster,
    IomStats, IrqLine, IrqMask, LedArray, Level, PinMode, Power, SystemInit,
};

/// Number of LEDs on the simulated board
pub const SIM_LED_COUNT: usize = 5;

/// Number of IO master modules on the simulated board
pub const SIM_IOM_COUNT: usize = 6;

/// One observable board call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOp {
    ClockMax,
    CacheConfigDefault,
    CacheEnable,
    FpuEnable,
    FpuLazyStacking,
    LowPowerInit,
    RtcOscillatorDisable,
    LedInit,
    LedOut(u32),
    LedToggle(usize),
    ButtonInit,
    Configure(u32, PinMode),
    Write(u32, Level),
    IrqClear(IrqLine, IrqMask),
    IrqEnable(IrqLine, IrqMask),
    LineEnable(IrqLine),
    GlobalEnable,
    GlobalDisable,
    DeepSleep,
}

#[derive(Debug, Default)]
struct PinState {
    mode: Option<PinMode>,
    level: Level,
    script: VecDeque<Level>,
}

#[derive(Debug, Default, Clone, Copy)]
struct IrqRegisters {
    pending: IrqMask,
    enabled: IrqMask,
}

type WakeSource = Box<dyn FnMut() + Send>;

/// Busy-wait delay that records how long it would have spun.
#[derive(Debug, Clone)]
pub struct SimDelay {
    elapsed_ns: Arc<AtomicU64>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
    }
}

pub struct SimBoard {
    ops: Mutex<Vec<BoardOp>>,
    pins: Mutex<HashMap<u32, PinState>>,
    irqs: Mutex<HashMap<IrqLine, IrqRegisters>>,
    lines: Mutex<Vec<IrqLine>>,
    global_enabled: AtomicBool,
    leds: AtomicU32,
    iom: Mutex<Vec<IomStats>>,
    delay_ns: Arc<AtomicU64>,
    sleeps: AtomicU32,
    wake_source: Mutex<Option<WakeSource>>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            pins: Mutex::new(HashMap::new()),
            irqs: Mutex::new(HashMap::new()),
            lines: Mutex::new(Vec::new()),
            global_enabled: AtomicBool::new(false),
            leds: AtomicU32::new(0),
            iom: Mutex::new(vec![IomStats::default(); SIM_IOM_COUNT]),
            delay_ns: Arc::new(AtomicU64::new(0)),
            sleeps: AtomicU32::new(0),
            wake_source: Mutex::new(None),
        }
    }

    /// Queue levels returned by the next reads of `pin`, one per read.
    /// Once the script runs out, reads return the pin's static level.
    pub fn script_pin<I>(&self, pin: u32, levels: I)
    where
        I: IntoIterator<Item = Level>,
    {
        lock(&self.pins).entry(pin).or_default().script.extend(levels);
    }

    /// Static level of an input pin
    pub fn set_level(&self, pin: u32, level: Level) {
        lock(&self.pins).entry(pin).or_default().level = level;
    }

    /// Current level of `pin` without consuming its script
    pub fn level(&self, pin: u32) -> Level {
        lock(&self.pins).get(&pin).map(|state| state.level).unwrap_or_default()
    }

    pub fn pin_mode(&self, pin: u32) -> Option<PinMode> {
        lock(&self.pins).get(&pin).and_then(|state| state.mode)
    }

    /// Latch pending interrupt bits on `line`
    pub fn raise(&self, line: IrqLine, mask: IrqMask) {
        lock(&self.irqs).entry(line).or_default().pending |= mask;
    }

    pub fn pending(&self, line: IrqLine) -> IrqMask {
        lock(&self.irqs).get(&line).map(|regs| regs.pending).unwrap_or(0)
    }

    pub fn enabled(&self, line: IrqLine) -> IrqMask {
        lock(&self.irqs).get(&line).map(|regs| regs.enabled).unwrap_or(0)
    }

    pub fn is_line_enabled(&self, line: IrqLine) -> bool {
        lock(&self.lines).contains(&line)
    }

    pub fn is_global_enabled(&self) -> bool {
        self.global_enabled.load(Ordering::SeqCst)
    }

    /// LED array output, bit `n` for LED `n`
    pub fn leds(&self) -> u32 {
        self.leds.load(Ordering::SeqCst)
    }

    pub fn ops(&self) -> Vec<BoardOp> {
        lock(&self.ops).clone()
    }

    pub fn clear_ops(&self) {
        lock(&self.ops).clear();
    }

    /// Total time busy-wait delays would have spun, in nanoseconds
    pub fn busy_wait_ns(&self) -> u64 {
        self.delay_ns.load(Ordering::Relaxed)
    }

    pub fn sleep_count(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }

    pub fn record_iom_transfer(&self, module: usize, ok: bool) {
        if let Some(stats) = lock(&self.iom).get_mut(module) {
            stats.transfers += 1;
            if !ok {
                stats.errors += 1;
            }
        }
    }

    /// Called from `deep_sleep` to stand in for the wake-up interrupt
    pub fn set_wake_source<F>(&self, source: F)
    where
        F: FnMut() + Send + 'static,
    {
        *lock(&self.wake_source) = Some(Box::new(source));
    }

    fn record(&self, op: BoardOp) {
        log::trace!("board: {:?}", op);
        lock(&self.ops).push(op);
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SystemInit for SimBoard {
    fn clock_max(&self) {
        self.record(BoardOp::ClockMax);
    }

    fn cache_config_default(&self) {
        self.record(BoardOp::CacheConfigDefault);
    }

    fn cache_enable(&self) {
        self.record(BoardOp::CacheEnable);
    }

    fn fpu_enable(&self) {
        self.record(BoardOp::FpuEnable);
    }

    fn fpu_lazy_stacking(&self) {
        self.record(BoardOp::FpuLazyStacking);
    }
}

impl Power for SimBoard {
    fn low_power_init(&self) {
        self.record(BoardOp::LowPowerInit);
    }

    fn rtc_oscillator_disable(&self) {
        self.record(BoardOp::RtcOscillatorDisable);
    }

    fn deep_sleep(&self) {
        self.record(BoardOp::DeepSleep);
        self.sleeps.fetch_add(1, Ordering::SeqCst);

        // The source runs ISRs that call back into the board.
        let source = lock(&self.wake_source).take();
        if let Some(mut source) = source {
            source();
            let mut slot = lock(&self.wake_source);
            if slot.is_none() {
                *slot = Some(source);
            }
        }
    }
}

impl Gpio for SimBoard {
    fn configure(&self, pin: u32, mode: PinMode) {
        lock(&self.pins).entry(pin).or_default().mode = Some(mode);
        self.record(BoardOp::Configure(pin, mode));
    }

    fn read(&self, pin: u32) -> Level {
        let mut pins = lock(&self.pins);
        let state = pins.entry(pin).or_default();
        state.script.pop_front().unwrap_or(state.level)
    }

    fn write(&self, pin: u32, level: Level) {
        lock(&self.pins).entry(pin).or_default().level = level;
        self.record(BoardOp::Write(pin, level));
    }
}

impl ButtonArray for SimBoard {
    fn init_buttons(&self) {
        self.record(BoardOp::ButtonInit);
    }
}

impl LedArray for SimBoard {
    fn init_leds(&self) {
        self.record(BoardOp::LedInit);
    }

    fn led_count(&self) -> usize {
        SIM_LED_COUNT
    }

    fn led_out(&self, mask: u32) {
        self.leds.store(mask, Ordering::SeqCst);
        self.record(BoardOp::LedOut(mask));
    }

    fn led_on(&self, index: usize) {
        if index < SIM_LED_COUNT {
            self.leds.fetch_or(1 << index, Ordering::SeqCst);
        }
    }

    fn led_off(&self, index: usize) {
        if index < SIM_LED_COUNT {
            self.leds.fetch_and(!(1 << index), Ordering::SeqCst);
        }
    }

    fn led_toggle(&self, index: usize) {
        if index < SIM_LED_COUNT {
            self.leds.fetch_xor(1 << index, Ordering::SeqCst);
            self.record(BoardOp::LedToggle(index));
        }
    }
}

impl InterruptStatus for SimBoard {
    fn status(&self, line: IrqLine, enabled_only: bool) -> IrqMask {
        let irqs = lock(&self.irqs);
        let regs = irqs.get(&line).copied().unwrap_or_default();
        if enabled_only {
            regs.pending & regs.enabled
        } else {
            regs.pending
        }
    }

    fn clear(&self, line: IrqLine, mask: IrqMask) {
        lock(&self.irqs).entry(line).or_default().pending &= !mask;
        self.record(BoardOp::IrqClear(line, mask));
    }

    fn enable(&self, line: IrqLine, mask: IrqMask) {
        lock(&self.irqs).entry(line).or_default().enabled |= mask;
        self.record(BoardOp::IrqEnable(line, mask));
    }
}

impl InterruptController for SimBoard {
    fn enable_line(&self, line: IrqLine) {
        let mut lines = lock(&self.lines);
        if !lines.contains(&line) {
            lines.push(line);
        }
        drop(lines);
        self.record(BoardOp::LineEnable(line));
    }

    fn enable_global(&self) {
        self.global_enabled.store(true, Ordering::SeqCst);
        self.record(BoardOp::GlobalEnable);
    }

    fn disable_global(&self) {
        self.global_enabled.store(false, Ordering::SeqCst);
        self.record(BoardOp::GlobalDisable);
    }
}

impl IoMaster for SimBoard {
    fn iom_count(&self) -> usize {
        SIM_IOM_COUNT
    }

    fn iom_stats(&self, module: usize) -> Option<IomStats> {
        lock(&self.iom).get(module).copied()
    }
}

impl DelaySource for SimBoard {
    type Delay = SimDelay;

    fn busy_delay(&self) -> SimDelay {
        SimDelay {
            elapsed_ns: Arc::clone(&self.delay_ns),
        }
    }
}
